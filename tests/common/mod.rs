//! Shared fixtures for DocVault integration tests

#![allow(dead_code)]

use docvault::config::ConfigBuilder;
use docvault::{Config, DocumentStore, Envelope};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

pub const T0: &str = "2026-01-01T00:00:00Z";

pub fn setup_temp_store() -> (TempDir, DocumentStore) {
    setup_store_with(|builder| builder)
}

pub fn setup_store_with<F>(configure: F) -> (TempDir, DocumentStore)
where
    F: FnOnce(ConfigBuilder) -> ConfigBuilder,
{
    let temp_dir = TempDir::new().unwrap();
    let config = configure(Config::builder().base_path(temp_dir.path())).build();
    let store = DocumentStore::open(config).unwrap();
    (temp_dir, store)
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("fixture must be an object")
}

pub fn message(id: &str, role: &str, content: &str) -> Value {
    json!({ "id": id, "role": role, "content": content, "timestamp": T0 })
}

pub fn chat_envelope(id: &str, title: &str, messages: Vec<Value>) -> Envelope {
    let metadata = json!({
        "id": id,
        "title": title,
        "createdAt": T0,
        "updatedAt": T0,
        "settings": { "model": "m", "provider": "p" }
    });
    Envelope::new("1.0.0", object(metadata), "messages", Value::Array(messages))
}

pub fn document_envelope(id: &str, title: &str, content: &str) -> Envelope {
    let metadata = json!({ "id": id, "title": title, "createdAt": T0, "updatedAt": T0 });
    Envelope::new("1.0.0", object(metadata), "content", json!(content))
}

pub fn settings_envelope(theme: &str) -> Envelope {
    Envelope::new(
        "1.0.0",
        object(json!({ "updatedAt": T0 })),
        "settings",
        json!({ "theme": theme }),
    )
}

pub fn log_entry(level: &str, message: &str) -> Value {
    json!({ "timestamp": T0, "level": level, "message": message })
}

pub fn log_envelope(id: &str, entries: Vec<Value>) -> Envelope {
    Envelope::new(
        "1.0.0",
        object(json!({ "id": id, "createdAt": T0 })),
        "entries",
        Value::Array(entries),
    )
}
