use anyhow::{Context, Result, bail};
use sealcrypt::CryptError;
use std::io::{self, IsTerminal};
use std::path::Path;
use zeroize::Zeroizing;

pub const PASSPHRASE_ENV: &str = "SEALCRYPT_PASSPHRASE";
pub const RSA_PUB_ENV: &str = "RSA_PUB_KEY";
pub const RSA_PRI_ENV: &str = "RSA_PRI_KEY";

/// Reads a key file. A single trailing newline is not part of the key.
pub fn read_key_file(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(
        std::fs::read(path).with_context(|| format!("failed to read key file {}", path.display()))?,
    );
    if key.ends_with(b"\n") {
        key.pop();
        if key.ends_with(b"\r") {
            key.pop();
        }
    }
    if key.is_empty() {
        return Err(CryptError::MissingKey).context(format!("key file {} is empty", path.display()));
    }
    Ok(key)
}

/// Resolves the symmetric key material: key file, then environment, then an
/// interactive prompt. Encryption prompts twice.
pub fn read_passphrase(key_file: Option<&Path>, confirm: bool) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(path) = key_file {
        return read_key_file(path);
    }

    //  SEALCRYPT_PASSPHRASE="correct horse" sealcrypt -i secret.txt -o secret.enc
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw.into_bytes()));
        }
    }

    // stdin may carry the payload, so prompts go through the terminal directly
    if io::stderr().is_terminal() {
        let pw = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
        if pw.is_empty() {
            bail!("passphrase cannot be empty");
        }
        if confirm {
            let again = Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?);
            if *pw != *again {
                bail!("passphrases do not match");
            }
        }
        return Ok(Zeroizing::new(pw.as_bytes().to_vec()));
    }

    Err(CryptError::MissingKey).context(format!(
        "use '--key-file <path>', {PASSPHRASE_ENV}, or run in a terminal to enter a passphrase"
    ))
}

/// Resolves PEM key material from a file or an environment variable.
pub fn read_pem(path: Option<&Path>, env: &str, flag: &str) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(path) = path {
        let pem = Zeroizing::new(
            std::fs::read(path)
                .with_context(|| format!("failed to read key file {}", path.display()))?,
        );
        if pem.trim_ascii().is_empty() {
            return Err(CryptError::MissingKey)
                .context(format!("key file {} is empty", path.display()));
        }
        return Ok(pem);
    }

    match std::env::var(env) {
        Ok(pem) if !pem.trim().is_empty() => Ok(Zeroizing::new(pem.into_bytes())),
        _ => Err(CryptError::MissingKey)
            .context(format!("use '{flag} <path>' or environment variable {env}")),
    }
}
