//! Path Resolver
//!
//! Maps record types to folders and file names to absolute paths.
//!
//! ## Responsibilities
//! - Look up record types by name
//! - Reject unsafe file names before any disk access
//! - Join base path, type folder and file name

use std::path::{Path, PathBuf};

use crate::config::{Config, RecordType, FS_NAME_MAX};
use crate::error::{Result, VaultError};

/// Characters never allowed in a file name
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Resolves record types and file names to locations on disk
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_path: PathBuf,
    record_types: Vec<RecordType>,
    max_name_length: usize,
}

impl PathResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            base_path: config.base_path.clone(),
            record_types: config.record_types.clone(),
            max_name_length: config.max_name_length,
        }
    }

    /// Look up a configured record type
    pub fn record_type(&self, type_name: &str) -> Result<&RecordType> {
        self.record_types
            .iter()
            .find(|t| t.name == type_name)
            .ok_or_else(|| VaultError::UnsupportedType(type_name.to_string()))
    }

    /// All configured record types, in configuration order
    pub fn record_types(&self) -> &[RecordType] {
        &self.record_types
    }

    /// Absolute folder for a record type
    pub fn folder_for(&self, type_name: &str) -> Result<PathBuf> {
        let record_type = self.record_type(type_name)?;
        Ok(self.base_path.join(&record_type.folder))
    }

    /// Absolute path of a document. Does not validate the name.
    pub fn file_path_for(&self, name: &str, type_name: &str) -> Result<PathBuf> {
        Ok(self.folder_for(type_name)?.join(name))
    }

    /// Validate a file name for a record type and return the type and path
    pub fn resolve(&self, name: &str, type_name: &str) -> Result<(&RecordType, PathBuf)> {
        let record_type = self.record_type(type_name)?;
        self.validate_name(name, record_type)?;
        Ok((record_type, self.base_path.join(&record_type.folder).join(name)))
    }

    /// Check that `name` is a safe file name for `record_type`
    ///
    /// Rules, checked in order:
    /// 1. non-empty after trimming
    /// 2. at most `max_name_length` bytes
    /// 3. no path separators, reserved characters or control characters
    /// 4. no `..` sequence
    /// 5. ends with the type's extension, with a non-empty identifier before it
    pub fn validate_name(&self, name: &str, record_type: &RecordType) -> Result<()> {
        self.check_safe(name)?;

        match name.strip_suffix(record_type.extension.as_str()) {
            Some(stem) if !stem.trim().is_empty() => Ok(()),
            Some(_) => Err(VaultError::invalid_name(name, "identifier is empty")),
            None => Err(VaultError::invalid_name(
                name,
                format!("expected extension '{}'", record_type.extension),
            )),
        }
    }

    /// Rules 1-4 of [`PathResolver::validate_name`], without the extension check
    pub fn check_safe(&self, name: &str) -> Result<()> {
        check_component(name, self.max_name_length)
    }

    /// Safety rules for a backup file name
    ///
    /// Backup names carry a timestamp suffix, so they are only held to the
    /// filesystem's component limit rather than `max_name_length`.
    pub fn check_backup_name(&self, name: &str) -> Result<()> {
        check_component(name, FS_NAME_MAX)
    }

    /// Identifier part of a file name (the name without its type extension)
    pub fn stem<'a>(name: &'a str, record_type: &RecordType) -> &'a str {
        name.strip_suffix(record_type.extension.as_str())
            .unwrap_or(name)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Shared rules for a single path component no longer than `max_bytes`
fn check_component(name: &str, max_bytes: usize) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VaultError::invalid_name(name, "name is empty"));
    }

    if name.len() > max_bytes {
        return Err(VaultError::invalid_name(
            name,
            format!("name exceeds {} bytes", max_bytes),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| RESERVED_CHARS.contains(c) || c.is_control())
    {
        return Err(VaultError::invalid_name(
            name,
            format!("forbidden character {:?}", c),
        ));
    }

    if name.contains("..") {
        return Err(VaultError::invalid_name(name, "path traversal sequence"));
    }

    Ok(())
}
