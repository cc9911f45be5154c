//! Lock Manager
//!
//! Grants and releases exclusive locks keyed by file name.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{Result, VaultError};
use crate::storage::AtomicWriter;

use super::LockRecord;

/// Suffix of lock marker files
const LOCK_EXTENSION: &str = ".lock";

/// Outcome of an expired-lock sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockSweep {
    /// Expired lock markers removed
    pub expired: usize,

    /// Unreadable or corrupt markers removed
    pub corrupt: usize,

    /// Half-written marker scratch files removed
    pub temp_files: usize,
}

/// Manages exclusive locks for one store
///
/// ## Concurrency:
/// - `table`: the authoritative in-process view. Every check-then-act
///   sequence (acquire, release, sweep) runs with the table mutex held, so
///   two callers in one process can never both acquire the same name.
/// - Marker files in `lock_dir` carry locks across process restarts. They
///   are written atomically with scratch files kept in the same directory.
pub struct LockManager {
    /// Directory holding `<name>.lock` markers
    lock_dir: PathBuf,

    /// Lock lifetime
    timeout: chrono::Duration,

    /// Scratch files older than this are leftovers of a crashed marker write
    scratch_max_age: Duration,

    writer: AtomicWriter,

    /// In-memory lock table keyed by file name
    table: Mutex<HashMap<String, LockRecord>>,
}

impl LockManager {
    /// Create a manager storing markers in `lock_dir`
    pub fn new(lock_dir: &Path, timeout: Duration) -> Result<Self> {
        let writer = AtomicWriter::new(lock_dir)?;

        let scratch_max_age = timeout;
        let timeout = chrono::Duration::from_std(timeout)
            .map_err(|e| VaultError::Config(format!("lock timeout out of range: {}", e)))?;

        Ok(Self {
            lock_dir: lock_dir.to_path_buf(),
            timeout,
            scratch_max_age,
            writer,
            table: Mutex::new(HashMap::new()),
        })
    }

    /// Acquire the lock on `name`
    ///
    /// Steps:
    /// 1. Live in-memory record → `Locked`; expired record → evicted
    /// 2. Live marker on disk → `Locked`; expired/missing/corrupt → unlocked
    /// 3. Write a fresh marker and record it in memory
    pub fn acquire(&self, name: &str) -> Result<LockGuard<'_>> {
        let now = Utc::now();
        let mut table = self.table.lock();

        // Step 1: In-memory view
        if let Some(record) = table.get(name) {
            if !record.is_expired(now) {
                return Err(VaultError::Locked(name.to_string()));
            }
            tracing::debug!("Evicting expired lock on {}", name);
            table.remove(name);
        }

        // Step 2: Persisted marker (may belong to a previous process)
        let marker = self.marker_path(name);
        if let Some(record) = LockRecord::load(&marker) {
            if !record.is_expired(now) {
                return Err(VaultError::Locked(name.to_string()));
            }
            tracing::debug!("Replacing expired lock marker for {}", name);
        }

        // Step 3: Take the lock
        let record = LockRecord::new(now, self.timeout);
        self.write_marker(&marker, &record)?;
        let owner = record.owner.clone();
        table.insert(name.to_string(), record);

        tracing::debug!("Acquired lock on {}", name);

        Ok(LockGuard {
            manager: self,
            name: name.to_string(),
            owner,
            released: false,
        })
    }

    /// Release the lock on `name` regardless of owner
    ///
    /// Idempotent: releasing an unlocked name succeeds.
    pub fn release(&self, name: &str) -> Result<()> {
        let mut table = self.table.lock();
        table.remove(name);
        self.remove_marker(name)
    }

    /// Whether `name` is currently locked
    ///
    /// Checks memory first, then the marker file. Expired or corrupt entries
    /// found along the way are evicted.
    pub fn is_locked(&self, name: &str) -> bool {
        self.lock_info(name).is_some()
    }

    /// The live lock record for `name`, if any
    pub fn lock_info(&self, name: &str) -> Option<LockRecord> {
        let now = Utc::now();
        let mut table = self.table.lock();

        if let Some(record) = table.get(name) {
            if !record.is_expired(now) {
                return Some(record.clone());
            }
            table.remove(name);
        }

        let marker = self.marker_path(name);
        if !marker.exists() {
            return None;
        }

        match LockRecord::load(&marker) {
            Some(record) if !record.is_expired(now) => Some(record),
            _ => {
                if let Err(e) = self.remove_marker(name) {
                    tracing::warn!("Failed to evict stale lock marker for {}: {}", name, e);
                }
                None
            }
        }
    }

    /// Remove every expired lock, every corrupt marker and stale scratch files
    pub fn cleanup_expired(&self) -> Result<LockSweep> {
        let now = Utc::now();
        let mut sweep = LockSweep::default();
        let mut table = self.table.lock();

        // Every in-memory lock has a marker, so counting markers counts both
        table.retain(|_, record| !record.is_expired(now));

        for entry in fs::read_dir(&self.lock_dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(LOCK_EXTENSION) else {
                continue;
            };

            let stale = match LockRecord::load(&path) {
                Some(record) if record.is_expired(now) => {
                    sweep.expired += 1;
                    true
                }
                Some(_) => false,
                None => {
                    sweep.corrupt += 1;
                    true
                }
            };

            if stale {
                table.remove(name);
                if let Err(e) = fs::remove_file(&path) {
                    if e.kind() != ErrorKind::NotFound {
                        tracing::warn!("Failed to remove lock marker {}: {}", path.display(), e);
                    }
                }
            }
        }

        sweep.temp_files = self.writer.cleanup_stale(self.scratch_max_age)?;

        if sweep.expired > 0 || sweep.corrupt > 0 {
            tracing::info!(
                "Lock sweep: {} expired, {} corrupt markers removed",
                sweep.expired,
                sweep.corrupt
            );
        }

        Ok(sweep)
    }

    /// Number of live locks held in this process
    pub fn held_count(&self) -> usize {
        let now = Utc::now();
        self.table
            .lock()
            .values()
            .filter(|record| !record.is_expired(now))
            .count()
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// Path of the marker file for `name`
    pub fn marker_path(&self, name: &str) -> PathBuf {
        self.lock_dir.join(format!("{}{}", name, LOCK_EXTENSION))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Release only if `owner` still holds the lock
    fn release_owned(&self, name: &str, owner: &str) -> Result<()> {
        let mut table = self.table.lock();

        let owns_memory = table.get(name).map(|r| r.owner == owner).unwrap_or(false);
        let owns_marker = LockRecord::load(&self.marker_path(name))
            .map(|r| r.owner == owner)
            .unwrap_or(false);

        if owns_memory {
            table.remove(name);
        }
        if owns_marker {
            self.remove_marker(name)?;
        }
        if !owns_memory && !owns_marker {
            tracing::warn!("Lock on {} was taken over after expiry", name);
        }

        Ok(())
    }

    /// Readers never see half a record
    fn write_marker(&self, marker: &Path, record: &LockRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.writer.write(marker, &bytes)
    }

    fn remove_marker(&self, name: &str) -> Result<()> {
        let marker = self.marker_path(name);
        match fs::remove_file(&marker) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(VaultError::DeleteFailed {
                path: marker,
                source,
            }),
        }
    }
}

/// Scoped ownership of a lock; releases it when dropped
pub struct LockGuard<'a> {
    manager: &'a LockManager,
    name: String,
    owner: String,
    released: bool,
}

impl LockGuard<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Release now, surfacing any error
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.manager.release_owned(&self.name, &self.owner)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.manager.release_owned(&self.name, &self.owner) {
            tracing::warn!("Failed to release lock on {}: {}", self.name, e);
        } else {
            tracing::debug!("Released lock on {}", self.name);
        }
    }
}
