//! Atomic Writer
//!
//! Writes full file replacements through a scratch directory.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::error::{Result, VaultError};

/// Suffix of scratch files
const TEMP_EXTENSION: &str = ".tmp";

/// Replaces files atomically via temp-file-then-rename
///
/// The scratch directory must live on the same filesystem as the targets
/// so the rename is a single directory-entry swap.
#[derive(Debug, Clone)]
pub struct AtomicWriter {
    temp_dir: PathBuf,
}

impl AtomicWriter {
    /// Create a writer using `temp_dir` as scratch space
    pub fn new(temp_dir: &Path) -> Result<Self> {
        fs::create_dir_all(temp_dir)?;
        Ok(Self {
            temp_dir: temp_dir.to_path_buf(),
        })
    }

    /// Replace the contents of `target` with `bytes`
    ///
    /// Steps:
    /// 1. Write and fsync a fresh temp file
    /// 2. Rename it onto the target
    ///
    /// On any failure the temp file is removed and `target` is left as it was.
    pub fn write(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let temp = TempFile::new(self.temp_dir.join(format!("{}{}", Uuid::new_v4(), TEMP_EXTENSION)));

        // Step 1: Fully write the temp file
        write_synced(temp.path(), bytes).map_err(|source| VaultError::WriteFailed {
            path: temp.path().to_path_buf(),
            source,
        })?;

        // Step 2: Swap it into place
        fs::rename(temp.path(), target).map_err(|source| VaultError::WriteFailed {
            path: target.to_path_buf(),
            source,
        })?;
        temp.persisted();

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }

    /// Remove `*.tmp` scratch files older than `max_age` (left behind by crashes)
    pub fn cleanup_stale(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in fs::read_dir(&self.temp_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_scratch = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEMP_EXTENSION));
            if !is_scratch || !path.is_file() {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!("Cannot stat temp file {}: {}", path.display(), e);
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age < max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove temp file {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            tracing::info!("Removed {} stale temp files", removed);
        }
        Ok(removed)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Removes its path on drop unless marked persisted
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persisted(mut self) {
        self.persisted = true;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to remove temp file {}: {}", self.path.display(), e);
            }
        }
    }
}
