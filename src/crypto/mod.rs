//! Cryptographic core.
//!
//! Provides passphrase key derivation, the symmetric envelope layout, AES-GCM
//! and AES-CTR envelope ciphers, and RSA-OAEP key wrapping.

pub mod envelope;
pub mod gcm;
pub mod kdf;
pub mod oaep;
pub mod stream;

pub use envelope::Envelope;
pub use kdf::{DerivedKey, KdfParams, derive, derive_key};

/// Length of the key derivation salt (32 bytes).
pub const SALT_LEN: usize = 32;
/// Length of the derived symmetric key (32 bytes / AES-256).
pub const KEY_LEN: usize = 32;
/// Length of the AES-GCM nonce (96 bits).
pub const GCM_NONCE_LEN: usize = 12;
/// Length of the AES-GCM authentication tag.
pub const GCM_TAG_LEN: usize = 16;
/// Length of the AES-CTR initial counter block (the AES block size).
pub const CTR_IV_LEN: usize = 16;

/// Returns `N` cryptographically secure random bytes from the OS.
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], getrandom::Error> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf)?;
    Ok(buf)
}
