//! Document envelope
//!
//! The versioned wrapper persisted for every document:
//!
//! ```text
//! {
//!   "version": "1.0.0",
//!   "metadata": { ...type-specific fields... },
//!   "<payload-field>": ...type-specific payload...
//! }
//! ```
//!
//! The payload field name depends on the record type (`messages` for
//! chats, `content` for documents, ...), so everything besides `version`
//! and `metadata` is kept in a flattened `body` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, VaultError};

/// Top-level keys owned by the envelope itself
pub const RESERVED_KEYS: [&str; 2] = ["version", "metadata"];

/// A parsed document envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,

    pub metadata: Map<String, Value>,

    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Envelope {
    /// Build an envelope with a single payload field
    pub fn new(
        version: impl Into<String>,
        metadata: Map<String, Value>,
        payload_field: impl Into<String>,
        payload: Value,
    ) -> Self {
        let mut body = Map::new();
        body.insert(payload_field.into(), payload);
        Self {
            version: version.into(),
            metadata,
            body,
        }
    }

    /// Parse raw bytes, checking the envelope shape
    pub fn from_slice(bytes: &[u8], payload_field: &str) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::invalid_format(format!("malformed JSON: {}", e)))?;
        Self::from_value(value, payload_field)
    }

    /// Shape check: an object with a string `version`, an object `metadata`
    /// and the payload field present
    pub fn from_value(value: Value, payload_field: &str) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(VaultError::invalid_format("document must be a JSON object"));
        };

        let version = match object.remove("version") {
            Some(Value::String(v)) => v,
            Some(_) => return Err(VaultError::invalid_format("'version' must be a string")),
            None => return Err(VaultError::invalid_format("missing 'version'")),
        };

        let metadata = match object.remove("metadata") {
            Some(Value::Object(m)) => m,
            Some(_) => return Err(VaultError::invalid_format("'metadata' must be an object")),
            None => return Err(VaultError::invalid_format("missing 'metadata'")),
        };

        if !object.contains_key(payload_field) {
            return Err(VaultError::invalid_format(format!(
                "missing payload field '{}'",
                payload_field
            )));
        }

        Ok(Self {
            version,
            metadata,
            body: object,
        })
    }

    /// Serialize to the on-disk representation
    ///
    /// Fails `InvalidFormat` if the body redefines a reserved key, since the
    /// flattened output would then carry that key twice.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.check_reserved()?;
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// The body must not shadow `version` or `metadata`
    pub fn check_reserved(&self) -> Result<()> {
        match RESERVED_KEYS.iter().find(|key| self.body.contains_key(**key)) {
            Some(key) => Err(VaultError::invalid_format(format!(
                "payload may not redefine '{}'",
                key
            ))),
            None => Ok(()),
        }
    }

    pub fn payload(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
