//! Backup Module
//!
//! Timestamped copies of documents taken before overwrite or delete.
//!
//! ## Responsibilities
//! - Copy (never move) a document into `backups/` before it is replaced
//! - Verify each copy against the source
//! - Enforce retention by count per original and by age
//!
//! ## Naming
//! ```text
//!   chats/c1.chat.json
//!     └──► backups/c1_2026-10-18T09-30-12-123456789Z.chat.json.bak
//!              stem  timestamp (':' and '.' → '-')   backup extension
//! ```
//!
//! Backups are best-effort durability: callers log and swallow failures
//! rather than abort the write or delete they protect.

mod manager;
mod retention;

pub use manager::{BackupInfo, BackupManager, RetentionReport};
pub use retention::plan_retention;
