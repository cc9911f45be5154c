//! Tests for ValidatorRegistry and the built-in validators

mod common;

use docvault::{Envelope, RecordType, ValidatorRegistry, VaultError};
use serde_json::json;

use common::{
    chat_envelope, document_envelope, log_entry, log_envelope, message, object,
    settings_envelope,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn record_type(name: &str) -> RecordType {
    RecordType::defaults()
        .into_iter()
        .find(|t| t.name == name)
        .unwrap()
}

fn assert_rejected(result: docvault::Result<()>, needle: &str) {
    match result {
        Err(VaultError::InvalidFormat(reason)) => {
            assert!(reason.contains(needle), "'{}' should mention '{}'", reason, needle)
        }
        other => panic!("expected InvalidFormat, got {:?}", other),
    }
}

// =============================================================================
// Generic Checks
// =============================================================================

#[test]
fn test_builtin_accepts_valid_documents() {
    let registry = ValidatorRegistry::with_builtin();

    let chat = chat_envelope("c1", "Demo", vec![message("m1", "user", "hi")]);
    registry.validate(&record_type("chat"), &chat).unwrap();

    let document = document_envelope("d1", "Notes", "body text");
    registry.validate(&record_type("document"), &document).unwrap();

    let settings = settings_envelope("dark");
    registry.validate(&record_type("settings"), &settings).unwrap();

    let log = log_envelope("l1", vec![log_entry("info", "started")]);
    registry.validate(&record_type("log"), &log).unwrap();
}

#[test]
fn test_unsupported_version() {
    let registry = ValidatorRegistry::with_builtin();
    let mut chat = chat_envelope("c1", "Demo", vec![]);
    chat.version = "9.9.9".to_string();

    assert_rejected(registry.validate(&record_type("chat"), &chat), "unsupported version");
}

#[test]
fn test_missing_payload_field() {
    let registry = ValidatorRegistry::with_builtin();
    let mut chat = chat_envelope("c1", "Demo", vec![]);
    chat.body.remove("messages");

    assert_rejected(registry.validate(&record_type("chat"), &chat), "messages");
}

#[test]
fn test_payload_may_not_shadow_reserved_keys() {
    let registry = ValidatorRegistry::new();
    let mut chat = chat_envelope("c1", "Demo", vec![]);
    chat.body.insert("metadata".to_string(), json!({}));

    assert_rejected(registry.validate(&record_type("chat"), &chat), "metadata");
}

#[test]
fn test_empty_registry_runs_generic_checks_only() {
    let registry = ValidatorRegistry::new();
    let bare = Envelope::new("1.0.0", object(json!({})), "messages", json!([]));

    registry.validate(&record_type("chat"), &bare).unwrap();
}

// =============================================================================
// Chat Validator
// =============================================================================

#[test]
fn test_chat_invalid_role_names_index() {
    let registry = ValidatorRegistry::with_builtin();
    let chat = chat_envelope(
        "c1",
        "Demo",
        vec![
            message("m1", "user", "a"),
            message("m2", "assistant", "b"),
            message("m3", "robot", "c"),
        ],
    );

    assert_rejected(
        registry.validate(&record_type("chat"), &chat),
        "messages[2].role",
    );
}

#[test]
fn test_chat_title_length_limit() {
    let registry = ValidatorRegistry::with_builtin();

    let at_limit = chat_envelope("c1", &"t".repeat(200), vec![]);
    registry.validate(&record_type("chat"), &at_limit).unwrap();

    let over = chat_envelope("c1", &"t".repeat(201), vec![]);
    assert_rejected(registry.validate(&record_type("chat"), &over), "metadata.title");
}

#[test]
fn test_chat_missing_settings_model() {
    let registry = ValidatorRegistry::with_builtin();
    let mut chat = chat_envelope("c1", "Demo", vec![]);
    chat.metadata
        .insert("settings".to_string(), json!({ "provider": "p" }));

    assert_rejected(
        registry.validate(&record_type("chat"), &chat),
        "metadata.settings.model",
    );
}

#[test]
fn test_chat_blank_id_rejected() {
    let registry = ValidatorRegistry::with_builtin();
    let chat = chat_envelope("  ", "Demo", vec![]);

    assert_rejected(registry.validate(&record_type("chat"), &chat), "metadata.id");
}

#[test]
fn test_chat_message_content_must_be_string() {
    let registry = ValidatorRegistry::with_builtin();
    let chat = chat_envelope(
        "c1",
        "Demo",
        vec![json!({ "id": "m1", "role": "user", "content": 42, "timestamp": common::T0 })],
    );

    assert_rejected(
        registry.validate(&record_type("chat"), &chat),
        "messages[0].content",
    );
}

#[test]
fn test_chat_messages_must_be_array() {
    let registry = ValidatorRegistry::with_builtin();
    let mut chat = chat_envelope("c1", "Demo", vec![]);
    chat.body.insert("messages".to_string(), json!("not a list"));

    assert_rejected(registry.validate(&record_type("chat"), &chat), "array");
}

// =============================================================================
// Other Built-ins
// =============================================================================

#[test]
fn test_document_content_must_be_string() {
    let registry = ValidatorRegistry::with_builtin();
    let mut document = document_envelope("d1", "Notes", "");
    document.body.insert("content".to_string(), json!(["x"]));

    assert_rejected(registry.validate(&record_type("document"), &document), "content");
}

#[test]
fn test_settings_payload_must_be_object() {
    let registry = ValidatorRegistry::with_builtin();
    let mut settings = settings_envelope("dark");
    settings.body.insert("settings".to_string(), json!(1));

    assert_rejected(
        registry.validate(&record_type("settings"), &settings),
        "settings must be an object",
    );
}

#[test]
fn test_log_invalid_level() {
    let registry = ValidatorRegistry::with_builtin();
    let log = log_envelope(
        "l1",
        vec![log_entry("info", "ok"), log_entry("fatal", "boom")],
    );

    assert_rejected(registry.validate(&record_type("log"), &log), "entries[1].level");
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_register_closure_validator() {
    let mut registry = ValidatorRegistry::new();
    registry.register("note", |envelope: &Envelope| {
        match envelope.metadata_str("author") {
            Some(_) => Ok(()),
            None => Err(VaultError::InvalidFormat("metadata.author is required".into())),
        }
    });
    assert!(registry.contains("note"));

    let note = RecordType::new("note", "notes", "note.json", "text");
    let valid = Envelope::new("1.0.0", object(json!({ "author": "a" })), "text", json!("hi"));
    let invalid = Envelope::new("1.0.0", object(json!({})), "text", json!("hi"));

    registry.validate(&note, &valid).unwrap();
    assert_rejected(registry.validate(&note, &invalid), "author");
}

#[test]
fn test_register_replaces_existing() {
    let mut registry = ValidatorRegistry::with_builtin();
    registry.register("chat", |_: &Envelope| Ok::<(), VaultError>(()));

    // The permissive replacement ignores chat metadata rules
    let bare = Envelope::new("1.0.0", object(json!({})), "messages", json!([]));
    registry.validate(&record_type("chat"), &bare).unwrap();
}
