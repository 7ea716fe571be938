//! Symmetric envelope layout.
//!
//! ```text
//! CIPHERTEXT | NONCE/IV (N) | SALT (32)
//! ```
//!
//! The trailer has a fixed length per mode, so metadata is recovered by
//! slicing from the end. Ciphertext content never affects parsing.

use super::SALT_LEN;
use crate::error::{CryptError, Result};

#[derive(Debug, PartialEq, Eq)]
pub struct Envelope<'a, const N: usize> {
    ciphertext: &'a [u8],
    nonce: [u8; N],
    salt: [u8; SALT_LEN],
}

impl<'a, const N: usize> Envelope<'a, N> {
    /// Length of the nonce/IV + salt suffix.
    pub const TRAILER_LEN: usize = N + SALT_LEN;

    pub fn new(ciphertext: &'a [u8], nonce: [u8; N], salt: [u8; SALT_LEN]) -> Self {
        Self {
            ciphertext,
            nonce,
            salt,
        }
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; N] {
        &self.nonce
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Serializes the trailer alone, for writers that emit ciphertext first.
    pub fn trailer(nonce: &[u8; N], salt: &[u8; SALT_LEN]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::TRAILER_LEN);
        buf.extend_from_slice(nonce);
        buf.extend_from_slice(salt);
        buf
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.ciphertext.len() + Self::TRAILER_LEN);
        buf.extend_from_slice(self.ciphertext);
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.salt);
        buf
    }

    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let len = data.len();
        let too_short = || CryptError::EnvelopeTooShort {
            len,
            min: Self::TRAILER_LEN,
        };

        let split = len.checked_sub(Self::TRAILER_LEN).ok_or_else(too_short)?;
        let (ciphertext, trailer) = data.split_at(split);
        let (nonce, salt) = trailer.split_at(N);

        Ok(Self {
            ciphertext,
            nonce: nonce.try_into().map_err(|_| too_short())?,
            salt: salt.try_into().map_err(|_| too_short())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CTR_IV_LEN, GCM_NONCE_LEN};
    use proptest::prelude::*;

    type GcmEnvelope<'a> = Envelope<'a, GCM_NONCE_LEN>;
    type CtrEnvelope<'a> = Envelope<'a, CTR_IV_LEN>;

    #[test]
    fn envelope_roundtrip() {
        let ciphertext = b"opaque bytes".to_vec();
        let envelope = GcmEnvelope::new(&ciphertext, [1u8; 12], [2u8; SALT_LEN]);

        let bytes = envelope.to_bytes();
        let parsed = GcmEnvelope::parse(&bytes).unwrap();

        assert_eq!(bytes.len(), ciphertext.len() + GcmEnvelope::TRAILER_LEN);
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn trailer_matches_envelope_suffix() {
        let envelope = CtrEnvelope::new(b"abc", [3u8; 16], [4u8; SALT_LEN]);
        let bytes = envelope.to_bytes();

        let trailer = CtrEnvelope::trailer(envelope.nonce(), envelope.salt());
        assert!(bytes.ends_with(&trailer));
    }

    #[test]
    fn empty_ciphertext_parses() {
        let bytes = vec![9u8; CtrEnvelope::TRAILER_LEN];
        let parsed = CtrEnvelope::parse(&bytes).unwrap();
        assert!(parsed.ciphertext().is_empty());
    }

    #[test]
    fn envelope_too_short_fails() {
        let data = vec![0u8; GcmEnvelope::TRAILER_LEN - 1];
        assert!(matches!(
            GcmEnvelope::parse(&data),
            Err(CryptError::EnvelopeTooShort { len: 43, min: 44 })
        ));
    }

    #[test]
    fn ciphertext_mimicking_trailer_is_preserved() {
        let nonce = [0xAAu8; 12];
        let salt = [0xBBu8; SALT_LEN];
        let ciphertext = GcmEnvelope::trailer(&nonce, &salt);

        let bytes = GcmEnvelope::new(&ciphertext, nonce, salt).to_bytes();
        let parsed = GcmEnvelope::parse(&bytes).unwrap();

        assert_eq!(parsed.ciphertext(), ciphertext.as_slice());
        assert_eq!(parsed.nonce(), &nonce);
        assert_eq!(parsed.salt(), &salt);
    }

    proptest! {
        #[test]
        fn parse_is_stable_for_any_ciphertext(
            ciphertext in proptest::collection::vec(any::<u8>(), 0..256),
            iv in any::<[u8; 16]>(),
            salt in any::<[u8; 32]>(),
        ) {
            let bytes = CtrEnvelope::new(&ciphertext, iv, salt).to_bytes();
            let parsed = CtrEnvelope::parse(&bytes).unwrap();

            prop_assert_eq!(parsed.ciphertext(), ciphertext.as_slice());
            prop_assert_eq!(parsed.nonce(), &iv);
            prop_assert_eq!(parsed.salt(), &salt);
        }
    }
}
