//! Payload input and output.
//!
//! Files are written atomically: the payload goes to a temporary sibling that
//! is synced and then renamed over the target, so an interrupted run leaves
//! either the old file or the complete new one.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Where the payload is read from.
#[derive(Debug, Clone)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Input::Stdin, Input::File)
    }

    /// Opens the source for incremental reads.
    pub fn reader(&self) -> Result<Box<dyn Read>> {
        match self {
            Input::Stdin => Ok(Box::new(io::stdin().lock())),
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        match self {
            Input::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
            Input::File(path) => {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))
            }
        }
    }
}

/// Where the payload is written to.
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Output::Stdout, Output::File)
    }

    pub fn write_all(&self, data: &[u8]) -> Result<()> {
        self.write_with(|w| Ok(w.write_all(data)?))
    }

    /// Hands a writer to `fill`. File targets only appear once `fill` succeeds.
    pub fn write_with<F>(&self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                fill(&mut stdout).context("failed to write stdout")?;
                stdout.flush()?;
                Ok(())
            }
            Output::File(path) => write_atomic_with(path, fill)
                .with_context(|| format!("failed to write {}", path.display())),
        }
    }
}

/// Writes `data` to `path` via a synced temporary file and a rename.
///
/// Creates parent directories if they don't exist.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    write_atomic_with(path, |w| Ok(w.write_all(data)?))
}

/// Like [`write_atomic`], with the contents produced by `fill`. The temporary
/// file is removed if `fill` fails.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = random_tmp_path(path)?;

    let tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .context("failed to create temporary file")?;

    let written = fill_and_sync(tmp_file, fill)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(Into::into));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    sync_parent(path)
}

fn fill_and_sync<F>(file: File, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let mut writer = BufWriter::new(file);
    fill(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Persists the rename by syncing the containing directory.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

/// Unique sibling path: `name.tmp.<16 hex chars>`.
fn random_tmp_path(path: &Path) -> Result<PathBuf> {
    let mut buf = [0u8; 8];
    getrandom::fill(&mut buf)?;

    let file_name = path
        .file_name()
        .context("output path has no file name")?
        .to_string_lossy();

    Ok(path.with_file_name(format!("{file_name}.tmp.{}", hex::encode(buf))))
}
