//! Configuration for DocVault
//!
//! Centralized configuration with sensible defaults. Defaults can be
//! overlaid from the environment via [`Config::from_env`].

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VaultError};

/// Environment variable names read by [`Config::from_env`]
pub const ENV_BASE_PATH: &str = "DOCVAULT_BASE_PATH";
pub const ENV_LOCK_TIMEOUT_SECS: &str = "DOCVAULT_LOCK_TIMEOUT_SECS";
pub const ENV_BACKUP_ENABLED: &str = "DOCVAULT_BACKUP_ENABLED";
pub const ENV_MAX_BACKUPS: &str = "DOCVAULT_MAX_BACKUPS";
pub const ENV_BACKUP_RETENTION_DAYS: &str = "DOCVAULT_BACKUP_RETENTION_DAYS";

const MIB: u64 = 1024 * 1024;
const DAY_SECS: u64 = 24 * 60 * 60;

/// Longest single path component on common filesystems (`NAME_MAX`)
pub const FS_NAME_MAX: usize = 255;

/// Bytes a backup name adds to its document name: `_`, a 30-byte
/// timestamp and `.bak`. Longer than the `.lock` marker suffix.
pub const DERIVED_NAME_OVERHEAD: usize = 1 + 30 + 4;

/// Longest document name (in bytes) whose lock marker and backup names
/// still fit in [`FS_NAME_MAX`]
pub const MAX_NAME_BYTES: usize = FS_NAME_MAX - DERIVED_NAME_OVERHEAD;

/// Main configuration for a DocVault store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {base_path}/
    ///     ├── chats/ documents/ settings/ logs/   (one per record type)
    ///     ├── backups/     (timestamped copies)
    ///     ├── temp/        (atomic write scratch space)
    ///     └── locks/       (lock markers)
    pub base_path: PathBuf,

    /// Known record types, fixed for the lifetime of a store
    pub record_types: Vec<RecordType>,

    /// Longest accepted file name, in bytes (at most [`MAX_NAME_BYTES`])
    pub max_name_length: usize,

    /// Scratch files older than this are removed by cleanup
    pub temp_max_age: Duration,

    // -------------------------------------------------------------------------
    // Locking Configuration
    // -------------------------------------------------------------------------
    /// How long an acquired lock stays exclusive
    pub lock_timeout: Duration,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    pub backup: BackupConfig,
}

/// A named category of documents with its own folder, extension and limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    /// Type name used by callers ("chat", "document", ...)
    pub name: String,

    /// Folder under the base path
    pub folder: String,

    /// File name suffix, including the leading dot
    pub extension: String,

    /// Envelope field holding the type's payload
    pub payload_field: String,

    /// Largest accepted file (in bytes)
    pub max_file_size: u64,

    /// Most live documents allowed in the folder
    pub max_files: usize,

    /// Accepted envelope versions
    pub supported_versions: Vec<String>,
}

impl RecordType {
    /// Create a record type with default limits and version "1.0.0"
    pub fn new(
        name: impl Into<String>,
        folder: impl Into<String>,
        extension: impl Into<String>,
        payload_field: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        let extension = if extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };

        Self {
            name: name.into(),
            folder: folder.into(),
            extension,
            payload_field: payload_field.into(),
            max_file_size: 10 * MIB,
            max_files: 1000,
            supported_versions: vec!["1.0.0".to_string()],
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Backup files of this type end with this suffix
    pub fn backup_extension(&self) -> String {
        format!("{}{}", self.extension, BackupConfig::BACKUP_SUFFIX)
    }

    /// The built-in record types: chat, document, settings, log
    pub fn defaults() -> Vec<RecordType> {
        vec![
            RecordType::new("chat", "chats", ".chat.json", "messages")
                .with_max_file_size(10 * MIB)
                .with_max_files(1000),
            RecordType::new("document", "documents", ".doc.json", "content")
                .with_max_file_size(50 * MIB)
                .with_max_files(500),
            RecordType::new("settings", "settings", ".settings.json", "settings")
                .with_max_file_size(MIB)
                .with_max_files(10),
            RecordType::new("log", "logs", ".log.json", "entries")
                .with_max_file_size(5 * MIB)
                .with_max_files(100),
        ]
    }
}

/// Backup behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupConfig {
    /// Snapshot files before overwrite/delete
    pub enabled: bool,

    /// Backups kept per original file
    pub max_backups: usize,

    /// Backups older than this are removed regardless of count
    pub retention: Duration,
}

impl BackupConfig {
    pub const BACKUP_SUFFIX: &'static str = ".bak";
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_backups: 10,
            retention: Duration::from_secs(30 * DAY_SECS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./docvault_data"),
            record_types: RecordType::defaults(),
            max_name_length: MAX_NAME_BYTES,
            temp_max_age: Duration::from_secs(60 * 60),
            lock_timeout: Duration::from_secs(5 * 60),
            backup: BackupConfig::default(),
        }
    }
}

impl Config {
    // =========================================================================
    // Internal Folder Names
    // =========================================================================
    pub const BACKUP_DIR: &'static str = "backups";
    pub const TEMP_DIR: &'static str = "temp";
    pub const LOCK_DIR: &'static str = "locks";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults overlaid with `DOCVAULT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_BASE_PATH) {
            config.base_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_LOCK_TIMEOUT_SECS) {
            config.lock_timeout = Duration::from_secs(parse_var(ENV_LOCK_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_BACKUP_ENABLED) {
            config.backup.enabled = parse_bool(ENV_BACKUP_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_BACKUPS) {
            config.backup.max_backups = parse_var(ENV_MAX_BACKUPS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BACKUP_RETENTION_DAYS) {
            let days: u64 = parse_var(ENV_BACKUP_RETENTION_DAYS, &raw)?;
            let secs = days.checked_mul(DAY_SECS).ok_or_else(|| {
                VaultError::Config(format!("{} is out of range: {}", ENV_BACKUP_RETENTION_DAYS, raw))
            })?;
            config.backup.retention = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.record_types.is_empty() {
            return Err(VaultError::Config("no record types configured".to_string()));
        }
        if self.lock_timeout.is_zero() {
            return Err(VaultError::Config("lock timeout must be positive".to_string()));
        }
        if self.max_name_length == 0 || self.max_name_length > MAX_NAME_BYTES {
            return Err(VaultError::Config(format!(
                "max name length must be between 1 and {} bytes",
                MAX_NAME_BYTES
            )));
        }

        let reserved = [Self::BACKUP_DIR, Self::TEMP_DIR, Self::LOCK_DIR];
        let mut names = HashSet::new();
        let mut folders = HashSet::new();
        let mut extensions = HashSet::new();

        for record_type in &self.record_types {
            if record_type.name.is_empty() || record_type.folder.is_empty() {
                return Err(VaultError::Config(
                    "record type name and folder must be non-empty".to_string(),
                ));
            }
            if record_type.extension.len() < 2 {
                return Err(VaultError::Config(format!(
                    "record type '{}' has an empty extension",
                    record_type.name
                )));
            }
            if reserved.contains(&record_type.folder.as_str()) {
                return Err(VaultError::Config(format!(
                    "record type '{}' uses reserved folder '{}'",
                    record_type.name, record_type.folder
                )));
            }
            if !names.insert(record_type.name.as_str()) {
                return Err(VaultError::Config(format!(
                    "duplicate record type '{}'",
                    record_type.name
                )));
            }
            if !folders.insert(record_type.folder.as_str()) {
                return Err(VaultError::Config(format!(
                    "duplicate folder '{}'",
                    record_type.folder
                )));
            }
            if !extensions.insert(record_type.extension.as_str()) {
                return Err(VaultError::Config(format!(
                    "duplicate extension '{}'",
                    record_type.extension
                )));
            }
        }

        Ok(())
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.base_path.join(Self::BACKUP_DIR)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.base_path.join(Self::TEMP_DIR)
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.base_path.join(Self::LOCK_DIR)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| VaultError::Config(format!("{} has invalid value '{}'", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(VaultError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base path (root for all storage)
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Replace the set of record types
    pub fn record_types(mut self, record_types: Vec<RecordType>) -> Self {
        self.config.record_types = record_types;
        self
    }

    /// Add a record type (or replace one with the same name)
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.config.record_types.retain(|t| t.name != record_type.name);
        self.config.record_types.push(record_type);
        self
    }

    /// Set the max file size (in bytes) of an already configured type
    pub fn max_file_size(mut self, type_name: &str, bytes: u64) -> Self {
        if let Some(t) = self.config.record_types.iter_mut().find(|t| t.name == type_name) {
            t.max_file_size = bytes;
        }
        self
    }

    /// Set the max live-file count of an already configured type
    pub fn max_files(mut self, type_name: &str, count: usize) -> Self {
        if let Some(t) = self.config.record_types.iter_mut().find(|t| t.name == type_name) {
            t.max_files = count;
        }
        self
    }

    /// Set the longest accepted file name, in bytes
    pub fn max_name_length(mut self, length: usize) -> Self {
        self.config.max_name_length = length;
        self
    }

    /// Set the lock timeout
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Set the age past which scratch files are swept
    pub fn temp_max_age(mut self, age: Duration) -> Self {
        self.config.temp_max_age = age;
        self
    }

    /// Enable or disable backups
    pub fn backup_enabled(mut self, enabled: bool) -> Self {
        self.config.backup.enabled = enabled;
        self
    }

    /// Set the number of backups kept per original file
    pub fn max_backups(mut self, count: usize) -> Self {
        self.config.backup.max_backups = count;
        self
    }

    /// Set the backup retention period
    pub fn backup_retention(mut self, retention: Duration) -> Self {
        self.config.backup.retention = retention;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
