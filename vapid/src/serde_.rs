use super::{PublicKey, VapidHeaders};
use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let b64: std::borrow::Cow<'de, str> = Deserialize::deserialize(d)?;
        PublicKey::from_base64(&b64).map_err(de::Error::custom)
    }
}

impl Serialize for VapidHeaders {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.crypto_key.is_some());
        let mut map = s.serialize_map(Some(len))?;
        map.serialize_entry("Authorization", &self.authorization)?;
        if let Some(crypto_key) = &self.crypto_key {
            map.serialize_entry("Crypto-Key", crypto_key)?;
        }
        map.end()
    }
}
