//! Retention planning
//!
//! Pure selection of backups to delete; the manager performs the deletes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::BackupInfo;

/// Select backups that fall outside retention
///
/// Backups are grouped by `(original, record type)` and sorted newest
/// first. An entry is selected when it is beyond `max_backups` in its
/// group, or older than `retention`.
pub fn plan_retention(
    backups: &[BackupInfo],
    max_backups: usize,
    retention: Duration,
    now: DateTime<Utc>,
) -> Vec<PathBuf> {
    // A retention too large for chrono never expires anything
    let retention = chrono::Duration::from_std(retention).ok();

    let mut groups: BTreeMap<(&str, &str), Vec<&BackupInfo>> = BTreeMap::new();
    for backup in backups {
        groups
            .entry((backup.original_name.as_str(), backup.record_type.as_str()))
            .or_default()
            .push(backup);
    }

    let mut doomed = Vec::new();
    for mut group in groups.into_values() {
        group.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.backup_name.cmp(&a.backup_name))
        });

        for (rank, backup) in group.into_iter().enumerate() {
            let too_many = rank >= max_backups;
            let too_old = retention
                .map(|limit| now.signed_duration_since(backup.created_at) > limit)
                .unwrap_or(false);

            if too_many || too_old {
                doomed.push(backup.path.clone());
            }
        }
    }

    doomed
}
