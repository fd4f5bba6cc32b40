//! The second-factor secret.
//!
//! A secret key is 16 random bytes, hex-encoded. Whoever presents the exact
//! token at login holds the factor; there is no expiry and no single-use
//! consumption, only replacement by rotation. The store tracks the value;
//! the file an operator keeps it in is handled by the helpers below.

use anyhow::{Context, Result};
use rand::Rng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::constants::secret_key::{ENCODED_LEN, KEY_FILE_EXTENSION, RANDOM_BYTES, STAGING_TAG_LEN};

/// Generate a fresh 32-character lowercase hex token.
#[must_use]
pub fn generate() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; RANDOM_BYTES] = rng.random();

    bytes
        .iter()
        .fold(String::with_capacity(ENCODED_LEN), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// The bytes an operator should store: the token itself, nothing else.
#[must_use]
pub fn export(secret_key: &str) -> Vec<u8> {
    secret_key.as_bytes().to_vec()
}

/// Exact, case-sensitive comparison.
#[must_use]
pub fn matches(stored: &str, presented: &str) -> bool {
    !stored.is_empty() && stored == presented
}

/// `<dir>/<username>.key`
#[must_use]
pub fn key_file_path(dir: &Path, username: &str) -> PathBuf {
    dir.join(format!("{username}.{KEY_FILE_EXTENSION}"))
}

/// A key file written under a temporary name next to `<username>.key`.
///
/// Callers stage the file before the database write that makes the key
/// valid, then `publish` it. If the write fails the staged file is
/// discarded and any existing key file is untouched.
#[derive(Debug)]
pub struct StagedKeyFile {
    staged: PathBuf,
    path: PathBuf,
}

impl StagedKeyFile {
    #[must_use]
    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    /// Move the staged file to `<dir>/<username>.key`, replacing any
    /// previous file. On failure the staged file stays where it is.
    pub async fn publish(&self) -> Result<PathBuf> {
        tokio::fs::rename(&self.staged, &self.path)
            .await
            .with_context(|| format!("Failed to move key file into place: {}", self.path.display()))?;

        Ok(self.path.clone())
    }

    pub async fn discard(self) {
        tokio::fs::remove_file(&self.staged).await.ok();
    }
}

/// Write `secret_key` to a fresh temporary file in `dir` (mode 0600 on unix).
pub async fn stage_key_file(dir: &Path, username: &str, secret_key: &str) -> Result<StagedKeyFile> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create key directory: {}", dir.display()))?;

    let path = key_file_path(dir, username);
    let staged = dir.join(format!(
        "{username}.{KEY_FILE_EXTENSION}.{}.tmp",
        &generate()[..STAGING_TAG_LEN]
    ));

    tokio::fs::write(&staged, export(secret_key))
        .await
        .with_context(|| format!("Failed to write key file: {}", staged.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) =
            tokio::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o600)).await
        {
            tokio::fs::remove_file(&staged).await.ok();
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to restrict key file: {}", staged.display())));
        }
    }

    Ok(StagedKeyFile { staged, path })
}

/// Read a key file, ignoring surrounding whitespace such as a trailing newline.
pub async fn read_key_file(path: &Path) -> Result<String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;

    let key = content.trim();
    if key.is_empty() {
        anyhow::bail!("Key file is empty: {}", path.display());
    }

    Ok(key.to_string())
}
