//! AES-256-CTR envelope cipher.
//!
//! Output layout: `ciphertext | iv (16) | salt (32)`.
//!
//! This mode provides confidentiality only. A flipped ciphertext bit decrypts
//! without error to plaintext with the same bit flipped. Use it for inputs
//! where GCM's single-shot buffering is undesirable and integrity is checked
//! some other way, or not needed.

use std::io::{self, Read, Write};

use ctr::cipher::{KeyIvInit, StreamCipher};
use tracing::debug;
use zeroize::Zeroizing;

use super::{CTR_IV_LEN, Envelope, KdfParams, derive, random_bytes};
use crate::error::{CryptError, Result};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
type CtrEnvelope<'a> = Envelope<'a, CTR_IV_LEN>;

/// Size of the working buffer the keystream is applied through.
pub const CHUNK_LEN: usize = 1024;

fn cipher(key: &[u8], iv: &[u8; CTR_IV_LEN]) -> Result<Aes256Ctr> {
    Aes256Ctr::new_from_slices(key, iv).map_err(|e| CryptError::CipherInit(e.to_string()))
}

/// XORs everything `reader` yields with the keystream and writes it out.
///
/// The working buffer is borrowed for one chunk at a time and wiped on return.
fn apply_keystream<R: Read, W: Write>(
    cipher: &mut Aes256Ctr,
    mut reader: R,
    mut writer: W,
) -> Result<u64> {
    let mut buf = Zeroizing::new([0u8; CHUNK_LEN]);
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf[..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let chunk = &mut buf[..n];
        cipher.apply_keystream(chunk);
        writer.write_all(chunk)?;
        total += n as u64;
    }

    Ok(total)
}

/// Encrypt everything from `reader` into `writer` as a complete envelope.
///
/// Returns the number of ciphertext bytes written, excluding the trailer.
pub fn encrypt_stream<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    passphrase: &[u8],
    kdf: KdfParams,
) -> Result<u64> {
    let (key, salt) = derive(passphrase, None, kdf)?;
    let iv = random_bytes::<CTR_IV_LEN>()
        .map_err(|e| CryptError::CipherInit(format!("OS random generator unavailable: {e}")))?;
    let mut cipher = cipher(&key[..], &iv)?;
    drop(key);

    let written = apply_keystream(&mut cipher, reader, &mut writer)?;
    writer.write_all(&CtrEnvelope::trailer(&iv, &salt))?;
    writer.flush()?;

    debug!(ciphertext_len = written, "sealed ctr envelope");
    Ok(written)
}

/// Encrypt an in-memory plaintext.
pub fn encrypt(plaintext: &[u8], passphrase: &[u8], kdf: KdfParams) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(plaintext.len() + CtrEnvelope::TRAILER_LEN);
    encrypt_stream(plaintext, &mut out, passphrase, kdf)?;
    Ok(out)
}

/// Decrypt a CTR envelope.
///
/// A wrong passphrase or tampered ciphertext is not detected; the result is
/// garbage of the same length.
pub fn decrypt(envelope: &[u8], passphrase: &[u8], kdf: KdfParams) -> Result<Zeroizing<Vec<u8>>> {
    let envelope = CtrEnvelope::parse(envelope)?;
    let (key, _) = derive(passphrase, Some(envelope.salt()), kdf)?;
    let mut cipher = cipher(&key[..], envelope.nonce())?;
    drop(key);

    let ciphertext = envelope.ciphertext();
    let mut plaintext = Zeroizing::new(Vec::with_capacity(ciphertext.len()));
    apply_keystream(&mut cipher, ciphertext, &mut *plaintext)?;

    debug!(plaintext_len = plaintext.len(), "opened ctr envelope");
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SALT_LEN, kdf::test_params};
    use proptest::prelude::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let kdf = test_params();
        let envelope = encrypt(b"attack at dawn", b"correct horse", kdf).unwrap();

        assert_eq!(
            envelope.len(),
            b"attack at dawn".len() + CTR_IV_LEN + SALT_LEN
        );

        let plaintext = decrypt(&envelope, b"correct horse", kdf).unwrap();
        assert_eq!(plaintext.as_slice(), b"attack at dawn");
    }

    #[test]
    fn multi_chunk_roundtrip() {
        let kdf = test_params();
        let data: Vec<u8> = (0..CHUNK_LEN * 5 + 17).map(|i| (i % 251) as u8).collect();

        let envelope = encrypt(&data, b"pw", kdf).unwrap();
        let plaintext = decrypt(&envelope, b"pw", kdf).unwrap();

        assert_eq!(plaintext.as_slice(), data.as_slice());
    }

    #[test]
    fn chunked_keystream_matches_one_shot() {
        let kdf = test_params();
        let data = vec![0u8; CHUNK_LEN * 3 + 5];

        let envelope = encrypt(&data, b"pw", kdf).unwrap();
        let parsed = CtrEnvelope::parse(&envelope).unwrap();
        let key = crate::crypto::derive_key(b"pw", parsed.salt(), kdf).unwrap();

        let mut expected = data.clone();
        cipher(&key[..], parsed.nonce())
            .unwrap()
            .apply_keystream(&mut expected);

        assert_eq!(parsed.ciphertext(), expected.as_slice());
    }

    #[test]
    fn stream_writes_full_envelope() {
        let kdf = test_params();
        let data = vec![0x5Au8; 3000];
        let mut out = Vec::new();

        let written = encrypt_stream(&data[..], &mut out, b"pw", kdf).unwrap();

        assert_eq!(written, 3000);
        assert_eq!(out.len(), 3000 + CtrEnvelope::TRAILER_LEN);
        assert_eq!(decrypt(&out, b"pw", kdf).unwrap().as_slice(), &data[..]);
    }

    #[test]
    fn bit_flip_is_not_detected() {
        let kdf = test_params();
        let mut envelope = encrypt(b"attack at dawn", b"pw", kdf).unwrap();
        envelope[3] ^= 0x01;

        let plaintext = decrypt(&envelope, b"pw", kdf).unwrap();

        let mut expected = b"attack at dawn".to_vec();
        expected[3] ^= 0x01;
        assert_eq!(plaintext.as_slice(), expected.as_slice());
    }

    #[test]
    fn wrong_passphrase_yields_garbage() {
        let kdf = test_params();
        let envelope = encrypt(b"attack at dawn", b"pw", kdf).unwrap();

        let plaintext = decrypt(&envelope, b"other", kdf).unwrap();
        assert_eq!(plaintext.len(), b"attack at dawn".len());
        assert_ne!(plaintext.as_slice(), b"attack at dawn");
    }

    #[test]
    fn encryption_is_randomized() {
        let kdf = test_params();
        let a = encrypt(b"same", b"pw", kdf).unwrap();
        let b = encrypt(b"same", b"pw", kdf).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn short_envelope_is_rejected() {
        let err = decrypt(&[1u8; 47], b"pw", test_params()).unwrap_err();
        assert!(matches!(err, CryptError::EnvelopeTooShort { len: 47, min: 48 }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn roundtrip_any_plaintext(
            plaintext in proptest::collection::vec(any::<u8>(), 0..4096),
            passphrase in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let kdf = test_params();
            let envelope = encrypt(&plaintext, &passphrase, kdf).unwrap();
            let recovered = decrypt(&envelope, &passphrase, kdf).unwrap();
            prop_assert_eq!(recovered.as_slice(), plaintext.as_slice());
        }
    }
}
