use crate::backend::{EcdsaBackend, P256Backend};
use crate::claims::{unix_now, Claims};
use crate::error::{Error, Result};
use crate::headers;
use crate::key::{decode_base64url, PublicKey};
use crate::signature::{self, P256_FIELD_SIZE};
use base64ct::{Base64UrlUnpadded, Encoding};
use http::HeaderMap;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

#[derive(Deserialize)]
struct JoseHeader {
    alg: String,
}

/// Checks VAPID tokens and recovers their claims.
#[derive(Clone, Debug, Default)]
pub struct Verifier<B = P256Backend> {
    backend: B,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: EcdsaBackend> Verifier<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Verifies a compact token against `public_key` at the current time.
    pub fn verify(&self, token: &str, public_key: &PublicKey) -> Result<Claims> {
        self.verify_at(token, public_key, unix_now())
    }

    /// Verifies a compact token against a 65-byte uncompressed public key.
    pub fn verify_raw(&self, token: &str, public_key: &[u8]) -> Result<Claims> {
        self.verify(token, &PublicKey::from_raw(public_key)?)
    }

    /// Verifies a compact token as of `now` (Unix seconds).
    pub fn verify_at(&self, token: &str, public_key: &PublicKey, now: u64) -> Result<Claims> {
        let mut segments = token.split('.');
        let (header, payload, signature) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                (header, payload, signature)
            }
            _ => return Err(Error::MalformedToken("expected three non-empty segments")),
        };

        let jose: JoseHeader = decode_segment(header)?;
        if jose.alg != "ES256" {
            return Err(Error::UnsupportedAlgorithm(jose.alg));
        }
        let claims: Map<String, Value> = decode_segment(payload)?;

        let signature = Base64UrlUnpadded::decode_vec(signature)
            .map_err(|_| Error::MalformedSignature("signature is not valid base64url"))?;
        let signing_input = &token[..header.len() + 1 + payload.len()];
        self.check_raw(signing_input.as_bytes(), &signature, public_key)?;

        let claims = Claims::recover(claims, now)?;
        trace!(aud = claims.aud(), exp = claims.exp(), "verified VAPID token");

        Ok(claims)
    }

    /// Verifies the token carried by an `Authorization` header value, with
    /// the `Crypto-Key` value consulted for the `WebPush` scheme.
    pub fn verify_header(&self, authorization: &str, crypto_key: Option<&str>) -> Result<Claims> {
        let (token, public_key) = headers::parse_authorization(authorization, crypto_key)?;
        self.verify(&token, &public_key)
    }

    pub fn verify_header_at(
        &self,
        authorization: &str,
        crypto_key: Option<&str>,
        now: u64,
    ) -> Result<Claims> {
        let (token, public_key) = headers::parse_authorization(authorization, crypto_key)?;
        self.verify_at(&token, &public_key, now)
    }

    pub fn verify_header_map(&self, headers: &HeaderMap) -> Result<Claims> {
        let (token, public_key) = headers::parse_header_map(headers)?;
        self.verify(&token, &public_key)
    }

    /// Checks a base64url `r‖s` signature over arbitrary bytes, as produced
    /// by [`JwtSigner::sign_detached`](crate::JwtSigner::sign_detached).
    pub fn verify_detached(
        &self,
        message: &[u8],
        signature: &str,
        public_key: &PublicKey,
    ) -> Result<()> {
        let signature = decode_base64url(signature)
            .ok_or(Error::MalformedSignature("signature is not valid base64url"))?;
        self.check_raw(message, &signature, public_key)
    }

    fn check_raw(&self, message: &[u8], signature: &[u8], public_key: &PublicKey) -> Result<()> {
        if signature.len() != 2 * P256_FIELD_SIZE {
            return Err(Error::MalformedSignature("expected a 64-byte signature"));
        }
        let der = signature::raw_to_der(signature)?;

        if self.backend.verify(message, &der, public_key) {
            Ok(())
        } else {
            debug!("ES256 signature mismatch");
            Err(Error::SignatureMismatch)
        }
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = Base64UrlUnpadded::decode_vec(segment)
        .map_err(|_| Error::MalformedToken("segment is not valid base64url"))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        debug!(%err, "token segment JSON decoding");
        Error::MalformedToken("segment is not a JSON object")
    })
}
