//! Error types for DocVault
//!
//! Provides a unified error type for all store operations. Every variant
//! carries a short stable code (see [`VaultError::code`]) alongside its
//! human-readable message.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for DocVault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Unsupported record type: {0}")]
    UnsupportedType(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    // -------------------------------------------------------------------------
    // Document State Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File is locked: {0}")]
    Locked(String),

    #[error("File '{name}' is too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("Too many '{record_type}' files: limit of {limit} reached")]
    TooManyFiles { record_type: String, limit: usize },

    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Backup failed: {0}")]
    BackupFailed(String),

    #[error("Write failed for {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Delete failed for {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// Short, stable code identifying the error kind
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::InvalidName { .. } => "INVALID_NAME",
            VaultError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            VaultError::InvalidQuery(_) => "INVALID_QUERY",
            VaultError::NotFound(_) => "NOT_FOUND",
            VaultError::Locked(_) => "LOCKED",
            VaultError::TooLarge { .. } => "TOO_LARGE",
            VaultError::TooManyFiles { .. } => "TOO_MANY_FILES",
            VaultError::InvalidFormat(_) => "INVALID_FORMAT",
            VaultError::BackupFailed(_) => "BACKUP_FAILED",
            VaultError::WriteFailed { .. } => "WRITE_FAILED",
            VaultError::DeleteFailed { .. } => "DELETE_FAILED",
            VaultError::Io(_) => "IO_ERROR",
            VaultError::Serialization(_) => "SERIALIZATION_ERROR",
            VaultError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        VaultError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_format(reason: impl Into<String>) -> Self {
        VaultError::InvalidFormat(reason.into())
    }
}
