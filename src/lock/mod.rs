//! Lock Module
//!
//! Short-lived exclusive locks per file name.
//!
//! ## Responsibilities
//! - Grant at most one live lock per file name
//! - Persist lock markers so locks survive process restarts
//! - Expire locks held past the timeout
//! - Release on every exit path via [`LockGuard`]
//!
//! ## Two Views
//! ```text
//!   is_locked(name)
//!        │
//!        ▼
//!   in-memory table ──(miss or expired)──► marker file in locks/
//!        │                                      │
//!     live → Locked                   live → Locked
//!                                     expired/corrupt → evicted, unlocked
//! ```
//!
//! The timeout is a safety valve against crashed holders. A holder that
//! keeps a lock past its timeout is no longer exclusive.

mod manager;
mod record;

pub use manager::{LockGuard, LockManager, LockSweep};
pub use record::LockRecord;
