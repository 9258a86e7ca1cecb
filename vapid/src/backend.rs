use crate::error::{Error, Result};
use crate::key::{KeyPair, PublicKey, PRIVATE_KEY_LENGTH};
use p256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use p256::elliptic_curve::{
    rand_core::{OsRng, RngCore},
    zeroize::Zeroizing,
};
use tracing::{debug, trace};

// Rejection sampling bound for out-of-range scalars.
const GENERATE_ATTEMPTS: usize = 8;

/// Elliptic-curve capabilities required to produce and check VAPID tokens.
///
/// Signatures cross this boundary DER-encoded, which is what most native
/// ECDSA implementations produce and consume. Conversion to the JOSE wire
/// format happens in [`crate::signature`].
pub trait EcdsaBackend: Send + Sync {
    /// Generates a fresh P-256 keypair.
    fn generate(&self) -> Result<KeyPair>;

    /// Signs `message` with ECDSA over SHA-256, returning a DER signature.
    fn sign(&self, message: &[u8], key: &KeyPair) -> Result<Vec<u8>>;

    /// Checks a DER signature over `message` made with ECDSA over SHA-256.
    fn verify(&self, message: &[u8], der_signature: &[u8], key: &PublicKey) -> bool;
}

/// [`EcdsaBackend`] implemented with the RustCrypto `p256` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct P256Backend;

impl EcdsaBackend for P256Backend {
    fn generate(&self) -> Result<KeyPair> {
        let mut scalar = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        for _ in 0..GENERATE_ATTEMPTS {
            OsRng.try_fill_bytes(&mut *scalar).map_err(|err| {
                debug!(%err, "operating system randomness unavailable");
                Error::KeyGeneration
            })?;
            if let Ok(keypair) = KeyPair::from_private_scalar(&*scalar) {
                return Ok(keypair);
            }
        }

        Err(Error::KeyGeneration)
    }

    fn sign(&self, message: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
        let signing_key = SigningKey::from(key.as_p256().clone());
        let signature: Signature = signing_key.try_sign(message).map_err(|err| {
            debug!(%err, "ES256 signing");
            Error::Signing
        })?;
        trace!(len = message.len(), "signed message");

        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], der_signature: &[u8], key: &PublicKey) -> bool {
        let verifying_key = match VerifyingKey::from_sec1_bytes(&key.to_raw()) {
            Ok(verifying_key) => verifying_key,
            Err(err) => {
                debug!(%err, "ES256 verifying key");
                return false;
            }
        };
        // Out-of-range scalars are rejected here rather than by the codec.
        let signature = match Signature::from_der(der_signature) {
            Ok(signature) => signature,
            Err(err) => {
                debug!(%err, "ES256 signature decoding");
                return false;
            }
        };

        verifying_key.verify(message, &signature).is_ok()
    }
}

impl<B: EcdsaBackend + ?Sized> EcdsaBackend for &B {
    fn generate(&self) -> Result<KeyPair> {
        (**self).generate()
    }

    fn sign(&self, message: &[u8], key: &KeyPair) -> Result<Vec<u8>> {
        (**self).sign(message, key)
    }

    fn verify(&self, message: &[u8], der_signature: &[u8], key: &PublicKey) -> bool {
        (**self).verify(message, der_signature, key)
    }
}
