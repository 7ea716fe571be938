//! AES-256-GCM envelope cipher (the default mode).
//!
//! Output layout: `ciphertext (+16 byte tag) | nonce (12) | salt (32)`.
//! Any modification of the envelope makes [`decrypt`] fail.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use tracing::debug;
use zeroize::Zeroizing;

use super::{Envelope, GCM_NONCE_LEN, KdfParams, derive, random_bytes};
use crate::error::{CryptError, Result};

type GcmEnvelope<'a> = Envelope<'a, GCM_NONCE_LEN>;

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|e| CryptError::CipherInit(e.to_string()))
}

/// Encrypt plaintext under a key derived from `passphrase` and a fresh salt.
pub fn encrypt(plaintext: &[u8], passphrase: &[u8], kdf: KdfParams) -> Result<Vec<u8>> {
    let (key, salt) = derive(passphrase, None, kdf)?;
    let cipher = cipher(&key[..])?;

    let nonce = random_bytes::<GCM_NONCE_LEN>()
        .map_err(|e| CryptError::CipherInit(format!("OS random generator unavailable: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptError::CipherInit("encryption failed".to_string()))?;

    debug!(plaintext_len = plaintext.len(), "sealed gcm envelope");
    Ok(GcmEnvelope::new(&ciphertext, nonce, salt).to_bytes())
}

/// Decrypt a GCM envelope. Fails with [`CryptError::Authentication`] on a
/// wrong passphrase or any tampering.
pub fn decrypt(envelope: &[u8], passphrase: &[u8], kdf: KdfParams) -> Result<Zeroizing<Vec<u8>>> {
    let envelope = GcmEnvelope::parse(envelope)?;
    let (key, _) = derive(passphrase, Some(envelope.salt()), kdf)?;
    let cipher = cipher(&key[..])?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(envelope.nonce()), envelope.ciphertext())
        .map_err(|_| CryptError::Authentication)?;

    debug!(plaintext_len = plaintext.len(), "opened gcm envelope");
    Ok(Zeroizing::new(plaintext))
}
