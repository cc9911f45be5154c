//! Backup Manager
//!
//! Creates, lists and prunes document backups.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::{BackupConfig, RecordType};
use crate::error::{Result, VaultError};
use crate::paths::PathResolver;

use super::plan_retention;

/// Timestamp layout inside backup names (no ':' or '.')
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%9fZ";

/// One backup file found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    /// File name inside `backups/`
    pub backup_name: String,

    /// Name of the document it was taken from
    pub original_name: String,

    pub record_type: String,

    /// Parsed from the backup name
    pub created_at: DateTime<Utc>,

    pub size: u64,

    pub path: PathBuf,
}

/// Outcome of a retention sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionReport {
    /// Backups considered
    pub examined: usize,

    /// Backups deleted
    pub deleted: usize,

    /// Deletions that failed (logged, left for the next sweep)
    pub failed: usize,
}

/// Manages the `backups/` folder
pub struct BackupManager {
    backup_dir: PathBuf,
    config: BackupConfig,
    record_types: Vec<RecordType>,
}

impl BackupManager {
    pub fn new(backup_dir: &Path, config: BackupConfig, record_types: Vec<RecordType>) -> Result<Self> {
        fs::create_dir_all(backup_dir)?;
        Ok(Self {
            backup_dir: backup_dir.to_path_buf(),
            config,
            record_types,
        })
    }

    /// Copy `source` (document `name` of `record_type`) into the backup folder
    ///
    /// Steps:
    /// 1. Pick a unique timestamped name
    /// 2. Copy the bytes and verify the copy by CRC32
    /// 3. Run the retention sweep (failures logged)
    pub fn backup(&self, source: &Path, name: &str, record_type: &RecordType) -> Result<PathBuf> {
        let stem = PathResolver::stem(name, record_type);

        // Step 1: Unique destination
        let mut timestamp = Utc::now();
        let mut destination = self
            .backup_dir
            .join(Self::backup_name(stem, timestamp, record_type));
        while destination.exists() {
            timestamp = timestamp + chrono::Duration::nanoseconds(1);
            destination = self
                .backup_dir
                .join(Self::backup_name(stem, timestamp, record_type));
        }

        // Step 2: Copy and verify
        fs::copy(source, &destination).map_err(|e| {
            VaultError::BackupFailed(format!("copying {}: {}", source.display(), e))
        })?;
        if let Err(e) = verify_copy(source, &destination) {
            let _ = fs::remove_file(&destination);
            return Err(e);
        }

        tracing::debug!("Backed up {} to {}", name, destination.display());

        // Step 3: Retention
        if let Err(e) = self.cleanup() {
            tracing::warn!("Backup retention sweep failed: {}", e);
        }

        Ok(destination)
    }

    /// Delete backups beyond the per-original count or past the retention age
    pub fn cleanup(&self) -> Result<RetentionReport> {
        let backups = self.list()?;
        let doomed = plan_retention(
            &backups,
            self.config.max_backups,
            self.config.retention,
            Utc::now(),
        );

        let mut report = RetentionReport {
            examined: backups.len(),
            ..Default::default()
        };

        for path in doomed {
            match fs::remove_file(&path) {
                Ok(()) => report.deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Failed to delete backup {}: {}", path.display(), e);
                }
            }
        }

        if report.deleted > 0 {
            tracing::info!(
                "Backup retention: {} of {} backups deleted",
                report.deleted,
                report.examined
            );
        }

        Ok(report)
    }

    /// All recognized backups, newest first
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((original_name, record_type, created_at)) =
                Self::parse_backup_name(file_name, &self.record_types)
            else {
                continue;
            };

            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Cannot stat backup {}: {}", path.display(), e);
                    continue;
                }
            };

            backups.push(BackupInfo {
                backup_name: file_name.to_string(),
                original_name,
                record_type: record_type.name.clone(),
                created_at,
                size: metadata.len(),
                path,
            });
        }

        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.backup_name.cmp(&a.backup_name))
        });
        Ok(backups)
    }

    /// Build a backup file name: `<stem>_<timestamp><backup extension>`
    pub fn backup_name(stem: &str, timestamp: DateTime<Utc>, record_type: &RecordType) -> String {
        format!(
            "{}_{}{}",
            stem,
            timestamp.format(TIMESTAMP_FORMAT),
            record_type.backup_extension()
        )
    }

    /// Split a backup file name into (original name, record type, timestamp)
    ///
    /// The longest matching backup extension wins, so types whose extensions
    /// share a suffix are told apart.
    pub fn parse_backup_name<'a>(
        file_name: &str,
        record_types: &'a [RecordType],
    ) -> Option<(String, &'a RecordType, DateTime<Utc>)> {
        let record_type = record_types
            .iter()
            .filter(|t| file_name.ends_with(&t.backup_extension()))
            .max_by_key(|t| t.extension.len())?;

        let base = file_name.strip_suffix(&record_type.backup_extension())?;
        let (stem, raw_timestamp) = base.rsplit_once('_')?;
        if stem.is_empty() {
            return None;
        }

        let naive = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT).ok()?;
        let created_at = Utc.from_utc_datetime(&naive);

        Some((
            format!("{}{}", stem, record_type.extension),
            record_type,
            created_at,
        ))
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

/// Compare source and copy checksums
fn verify_copy(source: &Path, copy: &Path) -> Result<()> {
    let checksum = |path: &Path| -> Result<u32> {
        let bytes = fs::read(path)
            .map_err(|e| VaultError::BackupFailed(format!("reading {}: {}", path.display(), e)))?;
        Ok(crc32fast::hash(&bytes))
    };

    let expected = checksum(source)?;
    let actual = checksum(copy)?;
    if expected != actual {
        return Err(VaultError::BackupFailed(format!(
            "checksum mismatch for {} ({:08x} != {:08x})",
            copy.display(),
            actual,
            expected
        )));
    }
    Ok(())
}
