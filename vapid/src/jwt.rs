use crate::backend::{EcdsaBackend, P256Backend};
use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::key::KeyPair;
use crate::signature::{self, P256_FIELD_SIZE};
use base64ct::{Base64UrlUnpadded, Encoding};
use tracing::{debug, trace};

/// The static JOSE header shared by all VAPID tokens.
pub const JWT_HEADER: &str = r#"{"typ":"JWT","alg":"ES256"}"#;

/// Produces compact ES256 JWS tokens over validated [`Claims`].
#[derive(Clone, Debug, Default)]
pub struct JwtSigner<B = P256Backend> {
    backend: B,
}

impl JwtSigner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: EcdsaBackend> JwtSigner<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Signs `claims`, returning `header.payload.signature`.
    pub fn sign(&self, claims: &Claims, key: &KeyPair) -> Result<String> {
        let payload = serde_json::to_vec(claims).map_err(|err| {
            debug!(%err, "claims serialization");
            Error::Signing
        })?;
        let signing_input = format!(
            "{}.{}",
            Base64UrlUnpadded::encode_string(JWT_HEADER.as_bytes()),
            Base64UrlUnpadded::encode_string(&payload),
        );

        let signature = self.sign_raw(signing_input.as_bytes(), key)?;
        trace!(aud = claims.aud(), exp = claims.exp(), "signed VAPID token");

        Ok(format!(
            "{}.{}",
            signing_input,
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Signs arbitrary bytes, returning the base64url `r‖s` signature.
    ///
    /// Push service dashboards use this to confirm ownership of a VAPID key.
    pub fn sign_detached(&self, message: &[u8], key: &KeyPair) -> Result<String> {
        let signature = self.sign_raw(message, key)?;
        Ok(Base64UrlUnpadded::encode_string(&signature))
    }

    fn sign_raw(&self, message: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
        let der = self.backend.sign(message, key)?;
        signature::der_to_raw(&der, P256_FIELD_SIZE)
    }
}
