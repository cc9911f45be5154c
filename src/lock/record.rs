//! Lock record definitions
//!
//! The persisted shape of a lock marker.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A live or expired exclusive lock on one file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Unpredictable token identifying the holder
    pub owner: String,

    pub locked_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl LockRecord {
    /// Fresh record with a random owner token
    pub fn new(now: DateTime<Utc>, timeout: chrono::Duration) -> Self {
        Self {
            owner: Uuid::new_v4().to_string(),
            locked_at: now,
            expires_at: now
                .checked_add_signed(timeout)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Read a marker file. Missing, unreadable or corrupt markers yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = fs::read(path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring corrupt lock marker {}: {}", path.display(), e);
                None
            }
        }
    }
}
