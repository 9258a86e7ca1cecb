//! This crate implements "Voluntary Application Server Identification (VAPID)
//! for Web Push" according to [RFC8292](https://www.rfc-editor.org/rfc/rfc8292).
//!
//! A push sender signs a small set of claims with its P-256 key, producing an
//! ES256 JSON Web Token that is sent to the push service alongside the public
//! key. Push services verify the token and recover the claims.
//!
//! # Example
//!
//! This example shows how to use the [`VapidBuilder`] to sign claims for one
//! push service and how the receiving side verifies the resulting header.
//!
//! ```
//! use serde_json::json;
//! use vapid_native::{HeaderStyle, KeyPair, VapidBuilder, Verifier};
//!
//! # fn main() -> Result<(), vapid_native::Error> {
//! // Keep the private key out of your source tree in real projects, see
//! // `KeyPair::from_pem` and `KeyPair::from_base64`.
//! let key_pair = KeyPair::generate()?;
//!
//! let claims = json!({
//!     "aud": "https://push.example.com",
//!     "sub": "mailto:admin@example.com",
//! });
//! let headers = VapidBuilder::new(key_pair)
//!     .with_header_style(HeaderStyle::Combined)
//!     .sign(claims.as_object().expect("claims are an object"))?;
//!
//! let recovered = Verifier::new().verify_header(&headers.authorization, None)?;
//! assert_eq!(recovered.sub(), "mailto:admin@example.com");
//! # Ok(())
//! # }
//! ```

mod backend;
mod claims;
mod error;
mod headers;
mod jwt;
mod key;
mod serde_;
pub mod signature;
mod verify;

#[cfg(feature = "jwt-simple")]
pub use jwt_simple;
pub use p256;

pub use backend::{EcdsaBackend, P256Backend};
pub use claims::{
    audience_from_endpoint, Claims, ClaimsValidator, ExpirationPolicy, RawClaims, MAX_EXPIRATION,
};
pub use error::{Error, ErrorKind, Result, ValidationError};
pub use headers::{
    parse_authorization, parse_header_map, AddHeaders, HeaderBuilder, HeaderStyle, VapidHeaders,
    CRYPTO_KEY,
};
pub use jwt::{JwtSigner, JWT_HEADER};
pub use key::{KeyPair, PublicKey, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
pub use verify::Verifier;

use http::Uri;
use serde_json::Value;
use std::time::Duration;

/// Reusable builder for VAPID headers.
///
/// Holds the sender's key and the signing configuration; every call to
/// [`VapidBuilder::sign`] validates the given claims and produces fresh
/// headers.
#[derive(Clone, Debug)]
pub struct VapidBuilder<B = P256Backend> {
    key_pair: KeyPair,
    validator: ClaimsValidator,
    headers: HeaderBuilder,
    signer: JwtSigner<B>,
}

impl VapidBuilder {
    /// Creates a new [`VapidBuilder`] signing with `key_pair`.
    ///
    /// Headers generated using this builder use the combined `vapid` scheme,
    /// reject `exp` claims more than 24 hours ahead and give claims without
    /// `exp` the full 24 hours.
    pub fn new(key_pair: KeyPair) -> Self {
        Self {
            key_pair,
            validator: ClaimsValidator::default(),
            headers: HeaderBuilder::default(),
            signer: JwtSigner::default(),
        }
    }
}

impl<B: EcdsaBackend> VapidBuilder<B> {
    /// Replaces the cryptographic backend used for signing.
    pub fn with_backend<C: EcdsaBackend>(self, backend: C) -> VapidBuilder<C> {
        VapidBuilder {
            key_pair: self.key_pair,
            validator: self.validator,
            headers: self.headers,
            signer: JwtSigner::with_backend(backend),
        }
    }

    pub fn with_header_style(self, style: HeaderStyle) -> Self {
        let mut this = self;
        this.headers = this.headers.with_style(style);
        this
    }

    pub fn with_expiration_policy(self, policy: ExpirationPolicy) -> Self {
        let mut this = self;
        this.validator = this.validator.with_expiration_policy(policy);
        this
    }

    /// Sets the lifetime of tokens whose claims carry no `exp`.
    pub fn with_valid_duration(self, valid_duration: Duration) -> Self {
        let mut this = self;
        this.validator = this.validator.with_valid_duration(valid_duration);
        this
    }

    /// Sets prior `Crypto-Key` content the VAPID key is appended to.
    pub fn with_crypto_key<T: Into<String>>(self, crypto_key: T) -> Self {
        let mut this = self;
        this.headers = this.headers.with_crypto_key(crypto_key);
        this
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Validates `claims` and signs them into VAPID headers.
    pub fn sign(&self, claims: &RawClaims) -> Result<VapidHeaders> {
        let claims = self.validator.validate(claims)?;
        self.sign_claims(&claims)
    }

    /// Like [`VapidBuilder::sign`], validating expiry as of `now`.
    pub fn sign_at(&self, claims: &RawClaims, now: u64) -> Result<VapidHeaders> {
        let claims = self.validator.validate_at(claims, now)?;
        self.sign_claims(&claims)
    }

    /// Signs already validated claims.
    pub fn sign_claims(&self, claims: &Claims) -> Result<VapidHeaders> {
        let token = self.signer.sign(claims, &self.key_pair)?;
        self.headers.build(&token, self.key_pair.public_key())
    }

    /// Signs claims addressed to the push service behind a subscription
    /// `endpoint`, with `contact` as the `sub` claim.
    pub fn sign_for_endpoint<T: Into<String>>(
        &self,
        endpoint: &Uri,
        contact: T,
    ) -> Result<VapidHeaders> {
        let mut claims = RawClaims::new();
        claims.insert("aud".into(), Value::from(audience_from_endpoint(endpoint)?));
        claims.insert("sub".into(), Value::from(contact.into()));
        self.sign(&claims)
    }

    /// Signs a push service dashboard validation token.
    pub fn sign_validation_token(&self, token: &[u8]) -> Result<String> {
        self.signer.sign_detached(token, &self.key_pair)
    }
}
