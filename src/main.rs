use anyhow::{Context, Result};
use clap::Parser;
mod auth;
use rsa::rand_core::OsRng;
use sealcrypt::{AesMode, Encoding, Input, KdfParams, OaepHash, Output, oaep, stream};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Debug, clap::Args)]
struct Argon2Args {
    /// Argon2 memory cost in KiB (default: 65536)
    #[arg(long = "argon-mem")]
    mem_cost_kib: Option<u32>,

    /// Argon2 time cost / iterations (default: 3)
    #[arg(long = "argon-time")]
    time_cost: Option<u32>,

    /// Argon2 parallelism (default: 1)
    #[arg(long = "argon-parallelism")]
    parallelism: Option<u32>,
}

impl Argon2Args {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        Ok(KdfParams::new(
            self.mem_cost_kib.unwrap_or(default.mem_cost_kib()),
            self.time_cost.unwrap_or(default.time_cost()),
            self.parallelism.unwrap_or(default.parallelism()),
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "sealcrypt")]
#[command(
    version,
    about = "Encrypt and decrypt files or pipes with a passphrase (AES-256) or an RSA key."
)]
struct Cli {
    /// Decrypt instead of encrypt
    #[arg(short, long)]
    decrypt: bool,

    /// Use RSA-OAEP (SHA-512) instead of a passphrase
    #[arg(long)]
    rsa: bool,

    /// AES mode: GCM (authenticated) or CTR (unauthenticated)
    #[arg(short, long, default_value = "gcm", conflicts_with = "rsa")]
    mode: AesMode,

    /// Input file (default: stdin)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Read the AES key material from a file instead of a passphrase
    #[arg(short, long, value_name = "PATH", conflicts_with = "rsa")]
    key_file: Option<PathBuf>,

    /// RSA public key (PKIX PEM) for encryption
    #[arg(long = "pub", value_name = "PATH")]
    public_key: Option<PathBuf>,

    /// RSA private key (PKCS#1 PEM) for decryption
    #[arg(long = "pri", value_name = "PATH")]
    private_key: Option<PathBuf>,

    /// Base64 encode output when encrypting, decode input when decrypting
    #[arg(short = 'B', long, conflicts_with = "hex")]
    base64: bool,

    /// Hex encode output when encrypting, decode input when decrypting
    #[arg(short = 'H', long)]
    hex: bool,

    #[command(flatten)]
    argon2: Argon2Args,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn encoding(&self) -> Option<Encoding> {
        match (self.base64, self.hex) {
            (true, _) => Some(Encoding::Base64),
            (false, true) => Some(Encoding::Hex),
            (false, false) => None,
        }
    }

    /// CTR encryption without a text encoding never needs the whole payload in
    /// memory.
    fn streams(&self) -> bool {
        !self.rsa && !self.decrypt && self.mode == AesMode::Ctr && self.encoding().is_none()
    }

    fn encrypt_stream(&self) -> Result<()> {
        let kdf = self.argon2.to_kdf_params()?;
        let passphrase = auth::read_passphrase(self.key_file.as_deref(), true)?;
        let reader = Input::from_path(self.input.clone()).reader()?;
        debug!("ctr mode output is not integrity protected");

        Output::from_path(self.output.clone()).write_with(|writer| {
            let written = stream::encrypt_stream(reader, writer, &passphrase, kdf)?;
            debug!(written, "streamed ctr envelope");
            Ok(())
        })
    }

    fn crypt(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if self.rsa {
            return self.rsa_crypt(data);
        }

        let kdf = self.argon2.to_kdf_params()?;
        let passphrase = auth::read_passphrase(self.key_file.as_deref(), !self.decrypt)?;

        if self.decrypt {
            Ok(self.mode.decrypt(data, &passphrase, kdf)?)
        } else {
            if !self.mode.is_authenticated() {
                debug!("ctr mode output is not integrity protected");
            }
            Ok(Zeroizing::new(self.mode.encrypt(data, &passphrase, kdf)?))
        }
    }

    fn rsa_crypt(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if self.decrypt {
            let pem = auth::read_pem(self.private_key.as_deref(), auth::RSA_PRI_ENV, "--pri")
                .context("no private key specified")?;
            Ok(oaep::decrypt(&mut OsRng, data, &pem, OaepHash::Sha512)?)
        } else {
            let pem = auth::read_pem(self.public_key.as_deref(), auth::RSA_PUB_ENV, "--pub")
                .context("no public key specified")?;
            Ok(Zeroizing::new(oaep::encrypt(
                &mut OsRng,
                data,
                &pem,
                OaepHash::Sha512,
            )?))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    init_logging(args.verbose);

    if args.streams() {
        return args.encrypt_stream();
    }

    let mut data = Input::from_path(args.input.clone()).read_all()?;
    if args.decrypt {
        if let Some(encoding) = args.encoding() {
            data = encoding.decode(&data)?;
        }
    }

    let mut out = args.crypt(&data)?;
    if !args.decrypt {
        if let Some(encoding) = args.encoding() {
            out = Zeroizing::new(encoding.encode(&out));
        }
    }

    Output::from_path(args.output.clone()).write_all(&out)?;
    Ok(())
}
