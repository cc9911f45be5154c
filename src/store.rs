//! Document Store
//!
//! The public facade that composes path resolution, locking, validation,
//! backups and atomic writes into one contract.
//!
//! ## Operation Order
//! ```text
//!   read:   name → lock check → exists → size → parse → validate
//!   write:  name → acquire → validate → size → cap → backup → atomic write → release
//!   delete: name → acquire → exists → backup → unlink → release
//! ```
//!
//! Name validation always comes first, so a rejected name never touches
//! the disk. Locks are released by a scope guard on every exit path.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::backup::{BackupInfo, BackupManager, RetentionReport};
use crate::config::{Config, RecordType};
use crate::document::Envelope;
use crate::error::{Result, VaultError};
use crate::lock::{LockManager, LockRecord, LockSweep};
use crate::paths::PathResolver;
use crate::search::{self, FileInfo, Page, SearchParams};
use crate::stats::StoreStats;
use crate::storage::AtomicWriter;
use crate::validation::{Validator, ValidatorRegistry};

/// Options for [`DocumentStore::read_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Return the envelope after the shape check only
    pub skip_validation: bool,
}

/// Options for [`DocumentStore::write`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Do not back up the file being replaced
    pub skip_backup: bool,

    /// Persist without running the type's validator
    pub skip_validation: bool,
}

/// Options for [`DocumentStore::delete`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Do not back up the file being deleted
    pub skip_backup: bool,
}

/// Outcome of a maintenance pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub locks: LockSweep,
    pub temp_files_removed: usize,
    pub backups: RetentionReport,
}

/// Per-type document storage on the local filesystem
///
/// ## Concurrency:
/// - All methods take `&self`; share across threads with `Arc`.
/// - Writes and deletes on one file name are mutually exclusive through
///   the lock manager. Reads never block each other.
/// - Readers see either "locked" or a complete file, never a partial one.
pub struct DocumentStore {
    config: Config,
    paths: PathResolver,
    locks: LockManager,
    backups: BackupManager,
    writer: AtomicWriter,
    validators: RwLock<ValidatorRegistry>,
}

impl DocumentStore {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create the folder layout
    /// 3. Sweep expired locks, stale temp files and old backups
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Reject inconsistent configuration
        config.validate()?;

        // Step 2: Folder layout
        fs::create_dir_all(&config.base_path)?;
        for record_type in &config.record_types {
            fs::create_dir_all(config.base_path.join(&record_type.folder))?;
        }

        let store = Self {
            paths: PathResolver::new(&config),
            locks: LockManager::new(&config.lock_dir(), config.lock_timeout)?,
            backups: BackupManager::new(
                &config.backup_dir(),
                config.backup,
                config.record_types.clone(),
            )?,
            writer: AtomicWriter::new(&config.temp_dir())?,
            validators: RwLock::new(ValidatorRegistry::with_builtin()),
            config,
        };

        // Step 3: Maintenance (never fails the open)
        let report = store.cleanup();
        tracing::info!(
            "Opened document store at {} ({} expired locks, {} temp files, {} backups pruned)",
            store.config.base_path.display(),
            report.locks.expired + report.locks.corrupt,
            report.temp_files_removed,
            report.backups.deleted
        );

        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified base path
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().base_path(path).build())
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Read and validate a document
    pub fn read(&self, type_name: &str, name: &str) -> Result<Envelope> {
        self.read_with(type_name, name, ReadOptions::default())
    }

    /// Read a document
    ///
    /// Steps:
    /// 1. Validate name
    /// 2. Fail `Locked` if a writer holds the file
    /// 3. Fail `NotFound` / `TooLarge` from file metadata
    /// 4. Parse the envelope (shape check)
    /// 5. Validate structure unless skipped
    pub fn read_with(&self, type_name: &str, name: &str, options: ReadOptions) -> Result<Envelope> {
        let (record_type, path) = self.resolve(type_name, name)?;

        if self.locks.is_locked(name) {
            return Err(VaultError::Locked(name.to_string()));
        }

        let size = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => return Err(VaultError::NotFound(name.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        check_size(name, size, record_type)?;

        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VaultError::NotFound(name.to_string()),
            _ => VaultError::Io(e),
        })?;
        // The file may have been replaced since the stat
        check_size(name, bytes.len() as u64, record_type)?;

        let envelope = Envelope::from_slice(&bytes, &record_type.payload_field)?;
        if !options.skip_validation {
            self.validators.read().validate(record_type, &envelope)?;
        }

        tracing::debug!("Read {} ({} bytes)", name, bytes.len());
        Ok(envelope)
    }

    /// Create or fully replace a document
    ///
    /// The lock is held from acquisition until this method returns, and
    /// released on every path including validation and write failures.
    pub fn write(
        &self,
        type_name: &str,
        name: &str,
        envelope: &Envelope,
        options: WriteOptions,
    ) -> Result<()> {
        let (record_type, path) = self.resolve(type_name, name)?;
        let _guard = self.locks.acquire(name)?;

        if !options.skip_validation {
            self.validators.read().validate(record_type, envelope)?;
        }

        let bytes = envelope.to_bytes()?;
        check_size(name, bytes.len() as u64, record_type)?;

        let exists = path.is_file();
        if !exists {
            self.check_capacity(record_type)?;
        }

        if exists && !options.skip_backup {
            self.backup_best_effort(&path, name, record_type);
        }

        self.writer.write(&path, &bytes)?;

        tracing::debug!(
            "{} {} ({} bytes)",
            if exists { "Updated" } else { "Created" },
            name,
            bytes.len()
        );
        Ok(())
    }

    /// Delete a document; a second delete of the same name fails `NotFound`
    pub fn delete(&self, type_name: &str, name: &str, options: DeleteOptions) -> Result<()> {
        let (record_type, path) = self.resolve(type_name, name)?;
        let _guard = self.locks.acquire(name)?;

        if !path.is_file() {
            return Err(VaultError::NotFound(name.to_string()));
        }

        if !options.skip_backup {
            self.backup_best_effort(&path, name, record_type);
        }

        fs::remove_file(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => VaultError::NotFound(name.to_string()),
            _ => VaultError::DeleteFailed {
                path: path.clone(),
                source,
            },
        })?;

        tracing::debug!("Deleted {}", name);
        Ok(())
    }

    /// Whether a document exists
    pub fn exists(&self, type_name: &str, name: &str) -> Result<bool> {
        let (_, path) = self.resolve(type_name, name)?;
        Ok(path.is_file())
    }

    // =========================================================================
    // Listing & Stats
    // =========================================================================

    /// List documents of one type, or of all types when `type_name` is `None`
    pub fn list(&self, type_name: Option<&str>, params: &SearchParams) -> Result<Page<FileInfo>> {
        // Reject a bad pattern before scanning anything
        params.compile_pattern()?;

        let mut files = Vec::new();
        for record_type in self.selected_types(type_name)? {
            files.extend(self.scan(record_type)?);
        }

        search::apply(files, params)
    }

    /// File, size, lock and backup totals from a fresh scan
    pub fn stats(&self, type_name: Option<&str>) -> Result<StoreStats> {
        let types = self.selected_types(type_name)?;
        let files = self.list(type_name, &SearchParams::unbounded())?.items;
        let backups = self.list_backups(type_name, None)?;

        let mut stats = StoreStats::collect(&files, &backups);
        for record_type in types {
            stats.by_type.entry(record_type.name.clone()).or_default();
        }
        Ok(stats)
    }

    // =========================================================================
    // Backups
    // =========================================================================

    /// Backups newest first, optionally narrowed to a type and a document
    pub fn list_backups(
        &self,
        type_name: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<BackupInfo>> {
        if let Some(type_name) = type_name {
            self.paths.record_type(type_name)?;
        }

        let mut backups = self.backups.list()?;
        backups.retain(|b| {
            type_name.map_or(true, |t| b.record_type == t)
                && name.map_or(true, |n| b.original_name == n)
        });
        Ok(backups)
    }

    /// Write a backup's contents back over its original document
    ///
    /// The current document (if any) is backed up first, so a restore can
    /// itself be undone.
    pub fn restore_backup(&self, type_name: &str, backup_name: &str) -> Result<()> {
        let record_type = self.paths.record_type(type_name)?;
        self.paths.check_backup_name(backup_name)?;

        let (original_name, _, _) =
            BackupManager::parse_backup_name(backup_name, std::slice::from_ref(record_type))
                .ok_or_else(|| {
                    VaultError::invalid_name(
                        backup_name,
                        format!("not a '{}' backup", record_type.name),
                    )
                })?;
        let (_, path) = self.resolve(type_name, &original_name)?;

        let backup_path = self.backups.backup_dir().join(backup_name);
        if !backup_path.is_file() {
            return Err(VaultError::NotFound(backup_name.to_string()));
        }
        let bytes = fs::read(&backup_path)?;
        check_size(backup_name, bytes.len() as u64, record_type)?;

        let envelope = Envelope::from_slice(&bytes, &record_type.payload_field)?;
        self.validators.read().validate(record_type, &envelope)?;

        let _guard = self.locks.acquire(&original_name)?;
        if path.is_file() {
            self.backup_best_effort(&path, &original_name, record_type);
        } else {
            self.check_capacity(record_type)?;
        }
        self.writer.write(&path, &bytes)?;

        tracing::info!("Restored {} from {}", original_name, backup_name);
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Sweep expired locks, stale temp files and backups beyond retention
    ///
    /// Each pass is idempotent; failures are logged and the remaining
    /// passes still run.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.locks.cleanup_expired() {
            Ok(sweep) => report.locks = sweep,
            Err(e) => tracing::warn!("Lock sweep failed: {}", e),
        }
        match self.writer.cleanup_stale(self.config.temp_max_age) {
            Ok(removed) => report.temp_files_removed = removed,
            Err(e) => tracing::warn!("Temp file sweep failed: {}", e),
        }
        match self.backups.cleanup() {
            Ok(retention) => report.backups = retention,
            Err(e) => tracing::warn!("Backup retention sweep failed: {}", e),
        }

        report
    }

    /// Register (or replace) the validator for a configured record type
    pub fn register_validator<V>(&self, type_name: &str, validator: V) -> Result<()>
    where
        V: Validator + 'static,
    {
        self.paths.record_type(type_name)?;
        self.validators.write().register(type_name, validator);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether a writer currently holds `name`
    pub fn is_locked(&self, name: &str) -> bool {
        self.locks.is_locked(name)
    }

    pub fn lock_info(&self, name: &str) -> Option<LockRecord> {
        self.locks.lock_info(name)
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn resolve(&self, type_name: &str, name: &str) -> Result<(&RecordType, PathBuf)> {
        self.paths.resolve(name, type_name)
    }

    fn selected_types(&self, type_name: Option<&str>) -> Result<Vec<&RecordType>> {
        match type_name {
            Some(type_name) => Ok(vec![self.paths.record_type(type_name)?]),
            None => Ok(self.paths.record_types().iter().collect()),
        }
    }

    /// Back up before a destructive change; failures never block the caller
    fn backup_best_effort(&self, path: &Path, name: &str, record_type: &RecordType) {
        if !self.backups.enabled() {
            return;
        }
        if let Err(e) = self.backups.backup(path, name, record_type) {
            tracing::warn!("Backup of {} failed, continuing: {}", name, e);
        }
    }

    /// Fail `TooManyFiles` if one more document would exceed the type's cap
    ///
    /// Callers hold the lock on the name being created.
    fn check_capacity(&self, record_type: &RecordType) -> Result<()> {
        if self.count_documents(record_type)? >= record_type.max_files {
            return Err(VaultError::TooManyFiles {
                record_type: record_type.name.clone(),
                limit: record_type.max_files,
            });
        }
        Ok(())
    }

    /// Documents currently in a type's folder
    fn count_documents(&self, record_type: &RecordType) -> Result<usize> {
        let folder = self.config.base_path.join(&record_type.folder);
        let mut count = 0;
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            let is_document = entry
                .file_name()
                .to_str()
                .is_some_and(|n| self.paths.validate_name(n, record_type).is_ok());
            if is_document && entry.path().is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Stat every document in a type's folder
    fn scan(&self, record_type: &RecordType) -> Result<Vec<FileInfo>> {
        let folder = self.config.base_path.join(&record_type.folder);
        if !folder.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if self.paths.validate_name(name, record_type).is_err() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let modified_at: DateTime<Utc> = match metadata.modified() {
                Ok(t) => t.into(),
                Err(_) => Utc::now(),
            };
            let created_at: DateTime<Utc> = metadata
                .created()
                .map(Into::into)
                .unwrap_or(modified_at);

            let (title, item_count) = if metadata.len() <= record_type.max_file_size {
                summarize(&path, record_type)
            } else {
                (None, None)
            };

            files.push(FileInfo {
                name: name.to_string(),
                locked: self.locks.is_locked(name),
                record_type: record_type.name.clone(),
                size: metadata.len(),
                created_at,
                modified_at,
                title,
                item_count,
                path,
            });
        }

        Ok(files)
    }
}

fn check_size(name: &str, size: u64, record_type: &RecordType) -> Result<()> {
    if size > record_type.max_file_size {
        return Err(VaultError::TooLarge {
            name: name.to_string(),
            size,
            limit: record_type.max_file_size,
        });
    }
    Ok(())
}

/// Best-effort title and payload length for listings
fn summarize(path: &Path, record_type: &RecordType) -> (Option<String>, Option<usize>) {
    let Ok(bytes) = fs::read(path) else {
        return (None, None);
    };
    let Ok(envelope) = Envelope::from_slice(&bytes, &record_type.payload_field) else {
        return (None, None);
    };

    let title = envelope.metadata_str("title").map(str::to_string);
    let item_count = match envelope.payload(&record_type.payload_field) {
        Some(Value::Array(items)) => Some(items.len()),
        _ => None,
    };
    (title, item_count)
}
