use argon2::{Algorithm, Argon2, Params, Version};
use tracing::debug;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN, random_bytes};
use crate::error::{CryptError, Result};

/// Version of the passphrase key derivation scheme (Argon2id v0x13).
///
/// Envelopes do not record cost parameters, so encrypt and decrypt must agree
/// on both the scheme and the [`KdfParams`] in use.
pub const KDF_VERSION: u8 = 1;

/// Largest accepted Argon2 memory cost (4 GiB). Argon2 allocates the whole
/// block matrix up front and a failed allocation aborts the process.
pub const MAX_MEM_COST_KIB: u32 = 4 * 1024 * 1024;

/// A 256-bit key that is wiped from memory when dropped.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 64 * 1024, // 64 MiB
            time_cost: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn validate(&self) -> Result<()> {
        let reject = |msg: &str| Err(CryptError::KeyDerivation(msg.to_string()));
        if self.mem_cost_kib < 8 {
            return reject("argon2 memory cost too low");
        }
        if self.mem_cost_kib > MAX_MEM_COST_KIB {
            return reject("argon2 memory cost exceeds 4 GiB");
        }
        if self.time_cost < 1 {
            return reject("argon2 time cost must be >= 1");
        }
        if self.parallelism < 1 {
            return reject("argon2 parallelism must be >= 1");
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return reject("argon2 memory cost must be at least 8 * parallelism");
        }
        Ok(())
    }
}

/// Derive a key from `passphrase`, generating a fresh salt when none is given.
///
/// Returns the key together with the salt it was derived from, so callers can
/// store the salt next to the ciphertext.
pub fn derive(
    passphrase: &[u8],
    salt: Option<&[u8; SALT_LEN]>,
    kdf: KdfParams,
) -> Result<(DerivedKey, [u8; SALT_LEN])> {
    let salt = match salt {
        Some(salt) => *salt,
        None => random_bytes::<SALT_LEN>().map_err(|e| {
            CryptError::KeyDerivation(format!("OS random generator unavailable: {e}"))
        })?,
    };
    let key = derive_key(passphrase, &salt, kdf)?;
    Ok((key, salt))
}

/// Deterministically derive a key from `passphrase` and `salt`.
pub fn derive_key(passphrase: &[u8], salt: &[u8], kdf: KdfParams) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(CryptError::MissingKey);
    }
    kdf.validate()?;

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CryptError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    debug!(
        mem_cost_kib = kdf.mem_cost_kib,
        time_cost = kdf.time_cost,
        parallelism = kdf.parallelism,
        "deriving key"
    );

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, &mut key[..])
        .map_err(|e| CryptError::KeyDerivation(format!("argon2 failed: {e}")))?;

    Ok(key)
}

#[cfg(test)]
pub(crate) fn test_params() -> KdfParams {
    KdfParams::new(256, 1, 1).unwrap()
}
