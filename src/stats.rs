//! Store statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::backup::BackupInfo;
use crate::search::FileInfo;

/// Totals for one record type
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    pub files: usize,
    pub bytes: u64,
    pub locked_files: usize,
    pub backups: usize,
    pub backup_bytes: u64,
}

/// Totals across the requested record types
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub locked_files: usize,
    pub backup_count: usize,
    pub backup_bytes: u64,
    pub by_type: BTreeMap<String, TypeStats>,
}

impl StoreStats {
    /// Aggregate a listing and a backup scan
    pub fn collect(files: &[FileInfo], backups: &[BackupInfo]) -> Self {
        let mut stats = StoreStats::default();

        for file in files {
            let entry = stats.by_type.entry(file.record_type.clone()).or_default();
            entry.files += 1;
            entry.bytes += file.size;
            stats.total_files += 1;
            stats.total_bytes += file.size;
            if file.locked {
                entry.locked_files += 1;
                stats.locked_files += 1;
            }
        }

        for backup in backups {
            let entry = stats.by_type.entry(backup.record_type.clone()).or_default();
            entry.backups += 1;
            entry.backup_bytes += backup.size;
            stats.backup_count += 1;
            stats.backup_bytes += backup.size;
        }

        stats
    }
}
