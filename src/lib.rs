//! # DocVault
//!
//! A per-type document storage engine that keeps application records
//! (chats, documents, settings, logs) as individual JSON files with:
//! - Exclusive per-file locks that survive process restarts
//! - Crash-safe atomic writes (temp file + rename)
//! - Automatic backups with count and age retention
//! - Pluggable structural validation per record type
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DocumentStore                           │
//! │        read / write / delete / list / stats / restore        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!     ┌─────────────┬───┴─────────┬──────────────┬─────────────┐
//!     ▼             ▼             ▼              ▼             ▼
//! ┌─────────┐ ┌───────────┐ ┌───────────┐ ┌────────────┐ ┌──────────┐
//! │  Path   │ │   Lock    │ │ Validator │ │   Backup   │ │  Atomic  │
//! │Resolver │ │  Manager  │ │ Registry  │ │  Manager   │ │  Writer  │
//! └─────────┘ └─────┬─────┘ └───────────┘ └─────┬──────┘ └────┬─────┘
//!                   ▼                           ▼             ▼
//!                locks/                     backups/   temp/ → chats/ ...
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docvault::{DocumentStore, Envelope, WriteOptions};
//! use serde_json::json;
//!
//! let store = DocumentStore::open_path(std::path::Path::new("./data"))?;
//! let metadata = json!({
//!     "id": "c1",
//!     "title": "Demo",
//!     "createdAt": "2026-01-01T00:00:00Z",
//!     "updatedAt": "2026-01-01T00:00:00Z",
//!     "settings": { "model": "m", "provider": "p" }
//! });
//! let envelope = Envelope::new(
//!     "1.0.0",
//!     metadata.as_object().cloned().unwrap_or_default(),
//!     "messages",
//!     json!([]),
//! );
//! store.write("chat", "c1.chat.json", &envelope, WriteOptions::default())?;
//! let read_back = store.read("chat", "c1.chat.json")?;
//! assert_eq!(read_back, envelope);
//! # Ok::<(), docvault::VaultError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod paths;
pub mod document;
pub mod lock;
pub mod validation;
pub mod backup;
pub mod storage;
pub mod search;
pub mod stats;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, VaultError};
pub use config::{BackupConfig, Config, RecordType};
pub use document::Envelope;
pub use search::{FileInfo, Page, PageInfo, SearchParams, SortField, SortOrder};
pub use stats::{StoreStats, TypeStats};
pub use store::{CleanupReport, DeleteOptions, DocumentStore, ReadOptions, WriteOptions};
pub use validation::{Validator, ValidatorRegistry};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DocVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
