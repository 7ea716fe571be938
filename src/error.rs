use thiserror::Error;

/// Errors produced by the cryptographic core.
///
/// Every failure is returned to the caller; nothing in the core aborts the
/// process. Authentication failures never carry partial plaintext.
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("failed to initialize cipher: {0}")]
    CipherInit(String),

    #[error("Invalid key or corrupted data")]
    Authentication,

    #[error("failed to parse key: {0}")]
    KeyParse(String),

    #[error("plaintext too large: {len} bytes exceeds the {max} byte limit for this key")]
    PlaintextTooLarge { len: usize, max: usize },

    #[error("no key material provided")]
    MissingKey,

    #[error("envelope too short: {len} bytes, need at least {min}")]
    EnvelopeTooShort { len: usize, min: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CryptError> = std::result::Result<T, E>;
