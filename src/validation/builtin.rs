//! Built-in validators for the default record types

use serde_json::{Map, Value};

use crate::document::Envelope;
use crate::error::{Result, VaultError};

const MAX_TITLE_LENGTH: usize = 200;

const MESSAGE_ROLES: &[&str] = &["user", "assistant", "system"];
const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

// =============================================================================
// Chat
// =============================================================================

/// Chat transcripts: `metadata` + `messages: [...]`
#[derive(Debug, Clone)]
pub struct ChatValidator {
    pub max_title_length: usize,
    pub max_messages: usize,
    pub max_content_length: usize,
}

impl Default for ChatValidator {
    fn default() -> Self {
        Self {
            max_title_length: MAX_TITLE_LENGTH,
            max_messages: 10_000,
            max_content_length: 100_000,
        }
    }
}

impl super::Validator for ChatValidator {
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        let meta = &envelope.metadata;
        require_present(meta, "id", "metadata")?;
        let title = require_str(meta, "title", "metadata")?;
        require_present(meta, "createdAt", "metadata")?;
        require_present(meta, "updatedAt", "metadata")?;
        check_length(title, "metadata.title", self.max_title_length)?;

        let settings = require_object(meta, "settings", "metadata")?;
        require_str(settings, "model", "metadata.settings")?;
        require_str(settings, "provider", "metadata.settings")?;

        let messages = require_array(envelope, "messages", self.max_messages)?;
        for (index, message) in messages.iter().enumerate() {
            let ctx = format!("messages[{}]", index);
            let message = as_object(message, &ctx)?;
            require_present(message, "id", &ctx)?;
            require_one_of(message, "role", MESSAGE_ROLES, &ctx)?;
            let content = require_string_field(message, "content", &ctx)?;
            check_length(content, &format!("{}.content", ctx), self.max_content_length)?;
            require_present(message, "timestamp", &ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Document
// =============================================================================

/// Free-form documents: `metadata` + `content: "..."`
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    pub max_title_length: usize,
    pub max_content_length: usize,
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self {
            max_title_length: MAX_TITLE_LENGTH,
            max_content_length: 10 * 1024 * 1024,
        }
    }
}

impl super::Validator for DocumentValidator {
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        let meta = &envelope.metadata;
        require_present(meta, "id", "metadata")?;
        let title = require_str(meta, "title", "metadata")?;
        require_present(meta, "createdAt", "metadata")?;
        require_present(meta, "updatedAt", "metadata")?;
        check_length(title, "metadata.title", self.max_title_length)?;

        let content = require_string_field(&envelope.body, "content", "document")?;
        check_length(content, "content", self.max_content_length)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Application settings: `metadata` + `settings: {...}`
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsValidator;

impl super::Validator for SettingsValidator {
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        require_present(&envelope.metadata, "updatedAt", "metadata")?;
        require_object(&envelope.body, "settings", "document")?;
        Ok(())
    }
}

// =============================================================================
// Log
// =============================================================================

/// Log files: `metadata` + `entries: [...]`
#[derive(Debug, Clone)]
pub struct LogValidator {
    pub max_entries: usize,
    pub max_message_length: usize,
}

impl Default for LogValidator {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_message_length: 10_000,
        }
    }
}

impl super::Validator for LogValidator {
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        let meta = &envelope.metadata;
        require_present(meta, "id", "metadata")?;
        require_present(meta, "createdAt", "metadata")?;

        let entries = require_array(envelope, "entries", self.max_entries)?;
        for (index, entry) in entries.iter().enumerate() {
            let ctx = format!("entries[{}]", index);
            let entry = as_object(entry, &ctx)?;
            require_present(entry, "timestamp", &ctx)?;
            require_one_of(entry, "level", LOG_LEVELS, &ctx)?;
            let message = require_string_field(entry, "message", &ctx)?;
            check_length(message, &format!("{}.message", ctx), self.max_message_length)?;
        }

        Ok(())
    }
}

// =============================================================================
// Field Checks
// =============================================================================

/// Present, not null, and not an empty/blank string
fn require_present<'a>(map: &'a Map<String, Value>, field: &str, ctx: &str) -> Result<&'a Value> {
    match map.get(field) {
        None | Some(Value::Null) => Err(VaultError::invalid_format(format!(
            "{}.{} is required",
            ctx, field
        ))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(VaultError::invalid_format(
            format!("{}.{} must not be empty", ctx, field),
        )),
        Some(value) => Ok(value),
    }
}

/// A non-empty string
fn require_str<'a>(map: &'a Map<String, Value>, field: &str, ctx: &str) -> Result<&'a str> {
    require_present(map, field, ctx)?
        .as_str()
        .ok_or_else(|| VaultError::invalid_format(format!("{}.{} must be a string", ctx, field)))
}

/// A string, possibly empty
fn require_string_field<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    ctx: &str,
) -> Result<&'a str> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(VaultError::invalid_format(format!(
            "{}.{} must be a string",
            ctx, field
        ))),
        None => Err(VaultError::invalid_format(format!(
            "{}.{} is required",
            ctx, field
        ))),
    }
}

fn require_object<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    ctx: &str,
) -> Result<&'a Map<String, Value>> {
    match map.get(field) {
        Some(Value::Object(object)) => Ok(object),
        Some(_) => Err(VaultError::invalid_format(format!(
            "{}.{} must be an object",
            ctx, field
        ))),
        None => Err(VaultError::invalid_format(format!(
            "{}.{} is required",
            ctx, field
        ))),
    }
}

fn require_one_of(map: &Map<String, Value>, field: &str, allowed: &[&str], ctx: &str) -> Result<()> {
    let value = require_str(map, field, ctx)?;
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(VaultError::invalid_format(format!(
            "{}.{} has invalid value '{}' (expected one of: {})",
            ctx,
            field,
            value,
            allowed.join(", ")
        )))
    }
}

/// The payload array, capped at `max_items`
fn require_array<'a>(envelope: &'a Envelope, field: &str, max_items: usize) -> Result<&'a [Value]> {
    let items = match envelope.payload(field) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(VaultError::invalid_format(format!(
                "{} must be an array",
                field
            )))
        }
        None => return Err(VaultError::invalid_format(format!("{} is required", field))),
    };

    if items.len() > max_items {
        return Err(VaultError::invalid_format(format!(
            "{} has {} items (max {})",
            field,
            items.len(),
            max_items
        )));
    }

    Ok(items)
}

fn as_object<'a>(value: &'a Value, ctx: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| VaultError::invalid_format(format!("{} must be an object", ctx)))
}

fn check_length(value: &str, field: &str, max: usize) -> Result<()> {
    let length = value.chars().count();
    if length > max {
        return Err(VaultError::invalid_format(format!(
            "{} is {} characters (max {})",
            field, length, max
        )));
    }
    Ok(())
}
