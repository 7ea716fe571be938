//! Passphrase and RSA envelope encryption.
//!
//! Symmetric modes derive an AES-256 key from a passphrase with Argon2id and
//! append the randomness needed to reverse the operation to the ciphertext:
//!
//! ```text
//! GCM: ciphertext+tag | nonce (12) | salt (32)
//! CTR: ciphertext     | iv (16)    | salt (32)
//! ```
//!
//! The asymmetric mode wraps small payloads with RSA-OAEP.

mod crypto;
mod encoding;
mod error;
mod storage;

pub use crate::crypto::kdf::KDF_VERSION;
pub use crate::crypto::oaep::{self, KeyPairPem, OaepHash};
pub use crate::crypto::{
    CTR_IV_LEN, DerivedKey, Envelope, GCM_NONCE_LEN, GCM_TAG_LEN, KEY_LEN, KdfParams, SALT_LEN,
    derive, derive_key, gcm, stream,
};
pub use crate::encoding::Encoding;
pub use crate::error::{CryptError, Result};
pub use crate::storage::{Input, Output, write_atomic};

use std::fmt;
use std::str::FromStr;
use tracing::info;
use zeroize::Zeroizing;

/// Symmetric cipher mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AesMode {
    /// AES-256-GCM, authenticated.
    #[default]
    Gcm,
    /// AES-256-CTR, confidentiality only.
    Ctr,
}

impl AesMode {
    pub fn encrypt(self, plaintext: &[u8], passphrase: &[u8], kdf: KdfParams) -> Result<Vec<u8>> {
        info!(mode = %self, len = plaintext.len(), "encrypting");
        match self {
            AesMode::Gcm => gcm::encrypt(plaintext, passphrase, kdf),
            AesMode::Ctr => stream::encrypt(plaintext, passphrase, kdf),
        }
    }

    pub fn decrypt(
        self,
        envelope: &[u8],
        passphrase: &[u8],
        kdf: KdfParams,
    ) -> Result<Zeroizing<Vec<u8>>> {
        info!(mode = %self, len = envelope.len(), "decrypting");
        match self {
            AesMode::Gcm => gcm::decrypt(envelope, passphrase, kdf),
            AesMode::Ctr => stream::decrypt(envelope, passphrase, kdf),
        }
    }

    /// Whether tampering is detected on decrypt.
    pub fn is_authenticated(self) -> bool {
        matches!(self, AesMode::Gcm)
    }
}

impl fmt::Display for AesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AesMode::Gcm => f.write_str("gcm"),
            AesMode::Ctr => f.write_str("ctr"),
        }
    }
}

impl FromStr for AesMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcm" => Ok(AesMode::Gcm),
            "ctr" => Ok(AesMode::Ctr),
            other => Err(format!("invalid AES mode '{other}' (expected GCM or CTR)")),
        }
    }
}
