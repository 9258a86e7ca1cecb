use thiserror::Error;

/// Result with this crate's error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not generate a P-256 keypair")]
    KeyGeneration,

    #[error("malformed key: {0}")]
    MalformedKey(&'static str),

    #[error(transparent)]
    Claims(#[from] ValidationError),

    #[error("signing failed")]
    Signing,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("unsupported algorithm {0:?}, expected ES256")]
    UnsupportedAlgorithm(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),

    #[error("signature does not match")]
    SignatureMismatch,
}

/// Claims rejected by the [`ClaimsValidator`](crate::ClaimsValidator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid \"aud\" claim {0:?}, expected an http(s) origin")]
    InvalidAudience(String),

    #[error("invalid \"sub\" claim {0:?}, expected a mailto: or https: contact")]
    InvalidSubscriber(String),

    #[error("\"exp\" {exp} already expired at {now}")]
    ExpiredClaim { exp: i128, now: u64 },

    #[error("\"exp\" {exp} set too far ahead, limit is {limit}")]
    ExcessiveExpiration { exp: i128, limit: u64 },
}

/// Flat discriminant of every failure this crate reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyGenerationFailure,
    MalformedKey,
    InvalidAudience,
    InvalidSubscriber,
    ExpiredClaim,
    ExcessiveExpiration,
    SigningFailure,
    MalformedToken,
    UnsupportedAlgorithm,
    MalformedSignature,
    SignatureMismatch,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidAudience(_) => ErrorKind::InvalidAudience,
            ValidationError::InvalidSubscriber(_) => ErrorKind::InvalidSubscriber,
            ValidationError::ExpiredClaim { .. } => ErrorKind::ExpiredClaim,
            ValidationError::ExcessiveExpiration { .. } => ErrorKind::ExcessiveExpiration,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyGeneration => ErrorKind::KeyGenerationFailure,
            Error::MalformedKey(_) => ErrorKind::MalformedKey,
            Error::Claims(claims) => claims.kind(),
            Error::Signing => ErrorKind::SigningFailure,
            Error::MalformedToken(_) => ErrorKind::MalformedToken,
            Error::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Error::MalformedSignature(_) => ErrorKind::MalformedSignature,
            Error::SignatureMismatch => ErrorKind::SignatureMismatch,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::KeyGenerationFailure => "KEY_GENERATION_FAILURE",
            ErrorKind::MalformedKey => "MALFORMED_KEY",
            ErrorKind::InvalidAudience => "INVALID_AUDIENCE",
            ErrorKind::InvalidSubscriber => "INVALID_SUBSCRIBER",
            ErrorKind::ExpiredClaim => "EXPIRED_CLAIM",
            ErrorKind::ExcessiveExpiration => "EXCESSIVE_EXPIRATION",
            ErrorKind::SigningFailure => "SIGNING_FAILURE",
            ErrorKind::MalformedToken => "MALFORMED_TOKEN",
            ErrorKind::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            ErrorKind::MalformedSignature => "MALFORMED_SIGNATURE",
            ErrorKind::SignatureMismatch => "SIGNATURE_MISMATCH",
        };
        f.write_str(name)
    }
}
