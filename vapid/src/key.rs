use crate::backend::{EcdsaBackend, P256Backend};
use crate::error::{Error, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use p256::elliptic_curve::{sec1::ToEncodedPoint, zeroize::Zeroizing};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use tracing::debug;

/// Length of an uncompressed SEC1 P-256 point (`0x04 ‖ X ‖ Y`).
pub const PUBLIC_KEY_LENGTH: usize = 65;
/// Length of a big-endian P-256 private scalar.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// VAPID public key, always a point on P-256.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(p256::PublicKey);

impl PublicKey {
    /// Reads the 65-byte uncompressed point used inline in VAPID headers.
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_LENGTH || bytes[0] != 0x04 {
            return Err(Error::MalformedKey("expected a 65-byte uncompressed point"));
        }
        p256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| Error::MalformedKey("point is not on P-256"))
    }

    /// Returns the 65-byte uncompressed point.
    pub fn to_raw(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let point = self.0.to_encoded_point(false);
        let mut raw = [0u8; PUBLIC_KEY_LENGTH];
        raw.copy_from_slice(point.as_bytes());
        raw
    }

    /// Reads a base64url encoded uncompressed point, tolerating `=` padding.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = decode_base64url(encoded)
            .ok_or(Error::MalformedKey("public key is not valid base64url"))?;
        Self::from_raw(&bytes)
    }

    pub fn to_base64(&self) -> String {
        Base64UrlUnpadded::encode_string(&self.to_raw())
    }

    /// Reads a DER SubjectPublicKeyInfo structure.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        p256::PublicKey::from_public_key_der(der)
            .map(Self)
            .map_err(|err| {
                debug!(%err, "P-256 public key DER decoding");
                Error::MalformedKey("expected a P-256 SubjectPublicKeyInfo")
            })
    }

    /// Encodes the key as a DER SubjectPublicKeyInfo structure.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|err| {
                debug!(%err, "P-256 public key DER encoding");
                Error::MalformedKey("could not encode public key")
            })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        p256::PublicKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|err| {
                debug!(%err, "P-256 public key PEM decoding");
                Error::MalformedKey("expected a P-256 public key PEM")
            })
    }

    pub fn to_pem(&self) -> Result<String> {
        self.0.to_public_key_pem(LineEnding::LF).map_err(|err| {
            debug!(%err, "P-256 public key PEM encoding");
            Error::MalformedKey("could not encode public key")
        })
    }

    pub fn as_p256(&self) -> &p256::PublicKey {
        &self.0
    }
}

impl From<p256::PublicKey> for PublicKey {
    fn from(key: p256::PublicKey) -> Self {
        Self(key)
    }
}

/// VAPID signing keypair.
///
/// The public half is always derived from the private scalar, so the two
/// cannot diverge.
#[derive(Clone)]
pub struct KeyPair {
    secret: p256::SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generates a fresh keypair using the operating system's randomness.
    pub fn generate() -> Result<Self> {
        P256Backend.generate()
    }

    /// Creates a keypair from a 32-byte big-endian private scalar.
    pub fn from_private_scalar(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(Error::MalformedKey("private key must be 32 bytes"));
        }
        p256::SecretKey::from_bytes(p256::FieldBytes::from_slice(bytes))
            .map(Self::from)
            .map_err(|_| Error::MalformedKey("private scalar out of range"))
    }

    /// Returns the 32-byte big-endian private scalar.
    pub fn private_scalar(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        let mut scalar = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        scalar.copy_from_slice(&self.secret.to_bytes());
        scalar
    }

    /// Reads a base64url encoded private scalar, tolerating `=` padding.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = decode_base64url(encoded)
            .map(Zeroizing::new)
            .ok_or(Error::MalformedKey("private key is not valid base64url"))?;
        Self::from_private_scalar(&bytes)
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(Base64UrlUnpadded::encode_string(&*self.private_scalar()))
    }

    /// Reads a DER private key, either PKCS#8 or SEC1 `ECPrivateKey`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        p256::SecretKey::from_pkcs8_der(der)
            .or_else(|_| p256::SecretKey::from_sec1_der(der))
            .map(Self::from)
            .map_err(|err| {
                debug!(%err, "P-256 private key DER decoding");
                Error::MalformedKey("expected a P-256 PKCS#8 or SEC1 private key")
            })
    }

    /// Encodes the private key as PKCS#8 DER.
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.secret
            .to_pkcs8_der()
            .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
            .map_err(|err| {
                debug!(%err, "P-256 private key DER encoding");
                Error::MalformedKey("could not encode private key")
            })
    }

    /// Reads a PEM private key, either `PRIVATE KEY` or `EC PRIVATE KEY`.
    pub fn from_pem(pem: &str) -> Result<Self> {
        p256::SecretKey::from_pkcs8_pem(pem)
            .or_else(|_| p256::SecretKey::from_sec1_pem(pem))
            .map(Self::from)
            .map_err(|err| {
                debug!(%err, "P-256 private key PEM decoding");
                Error::MalformedKey("expected a P-256 PKCS#8 or SEC1 private key PEM")
            })
    }

    /// Encodes the private key as PKCS#8 PEM.
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        self.secret.to_pkcs8_pem(LineEnding::LF).map_err(|err| {
            debug!(%err, "P-256 private key PEM encoding");
            Error::MalformedKey("could not encode private key")
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn as_p256(&self) -> &p256::SecretKey {
        &self.secret
    }
}

impl From<p256::SecretKey> for KeyPair {
    fn from(secret: p256::SecretKey) -> Self {
        let public = PublicKey(secret.public_key());
        Self { secret, public }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public.to_base64())
            .finish_non_exhaustive()
    }
}

pub(crate) fn decode_base64url(encoded: &str) -> Option<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(encoded.trim().trim_end_matches('=')).ok()
}

#[cfg(feature = "jwt-simple")]
mod jwt_simple_interop {
    use super::{KeyPair, PublicKey};
    use crate::error::{Error, Result};
    use jwt_simple::algorithms::{ES256KeyPair, ES256PublicKey};
    use p256::elliptic_curve::zeroize::Zeroizing;

    impl KeyPair {
        pub fn from_jwt_simple(key_pair: &ES256KeyPair) -> Result<Self> {
            Self::from_private_scalar(&Zeroizing::new(key_pair.to_bytes()))
        }

        pub fn to_jwt_simple(&self) -> Result<ES256KeyPair> {
            ES256KeyPair::from_bytes(&*self.private_scalar())
                .map_err(|_| Error::MalformedKey("rejected by jwt-simple"))
        }
    }

    impl PublicKey {
        pub fn from_jwt_simple(public_key: &ES256PublicKey) -> Result<Self> {
            Self::from_raw(&public_key.public_key().to_bytes_uncompressed())
        }

        pub fn to_jwt_simple(&self) -> Result<ES256PublicKey> {
            ES256PublicKey::from_bytes(&self.to_raw())
                .map_err(|_| Error::MalformedKey("rejected by jwt-simple"))
        }
    }
}
