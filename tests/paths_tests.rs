//! Tests for PathResolver
//!
//! These tests verify:
//! - Record type lookup and folder mapping
//! - Every name-safety rule
//! - Path joining

use std::path::PathBuf;

use docvault::paths::PathResolver;
use docvault::config::MAX_NAME_BYTES;
use docvault::{Config, VaultError};

// =============================================================================
// Helper Functions
// =============================================================================

fn resolver() -> PathResolver {
    let config = Config::builder().base_path("/data").build();
    PathResolver::new(&config)
}

fn assert_invalid(name: &str) {
    let resolver = resolver();
    let chat = resolver.record_type("chat").unwrap();
    let result = resolver.validate_name(name, chat);
    assert!(
        matches!(result, Err(VaultError::InvalidName { .. })),
        "expected InvalidName for {:?}, got {:?}",
        name,
        result
    );
}

// =============================================================================
// Type Mapping Tests
// =============================================================================

#[test]
fn test_folder_for_known_types() {
    let resolver = resolver();

    assert_eq!(resolver.folder_for("chat").unwrap(), PathBuf::from("/data/chats"));
    assert_eq!(resolver.folder_for("log").unwrap(), PathBuf::from("/data/logs"));
}

#[test]
fn test_folder_for_unknown_type() {
    let result = resolver().folder_for("video");
    assert!(matches!(result, Err(VaultError::UnsupportedType(t)) if t == "video"));
}

#[test]
fn test_file_path_for() {
    let path = resolver().file_path_for("c1.chat.json", "chat").unwrap();
    assert_eq!(path, PathBuf::from("/data/chats/c1.chat.json"));
}

#[test]
fn test_resolve_validates_then_joins() {
    let resolver = resolver();

    assert_eq!(
        resolver.resolve("c1.chat.json", "chat").unwrap().1,
        PathBuf::from("/data/chats/c1.chat.json")
    );
    assert!(matches!(
        resolver.resolve("../c1.chat.json", "chat"),
        Err(VaultError::InvalidName { .. })
    ));
}

// =============================================================================
// Name Safety Tests
// =============================================================================

#[test]
fn test_valid_names() {
    let resolver = resolver();
    let chat = resolver.record_type("chat").unwrap();

    for name in ["c1.chat.json", "my chat 2.chat.json", "a.b.chat.json", "ünïcode.chat.json"] {
        assert!(resolver.validate_name(name, chat).is_ok(), "{} should be valid", name);
    }
}

#[test]
fn test_empty_and_blank_names() {
    assert_invalid("");
    assert_invalid("   ");
}

#[test]
fn test_path_separators() {
    assert_invalid("a/b.chat.json");
    assert_invalid("a\\b.chat.json");
    assert_invalid("/etc/passwd.chat.json");
}

#[test]
fn test_traversal_sequences() {
    assert_invalid("../secret.chat.json");
    assert_invalid("a..b.chat.json");
    assert_invalid("..chat.json");
}

#[test]
fn test_reserved_characters() {
    for c in ['<', '>', ':', '"', '|', '?', '*'] {
        assert_invalid(&format!("a{}b.chat.json", c));
    }
}

#[test]
fn test_control_characters() {
    assert_invalid("a\0b.chat.json");
    assert_invalid("a\nb.chat.json");
    assert_invalid("a\u{1f}b.chat.json");
}

#[test]
fn test_wrong_or_missing_extension() {
    assert_invalid("c1.json");
    assert_invalid("c1.doc.json");
    assert_invalid("c1");
}

#[test]
fn test_empty_identifier() {
    assert_invalid(".chat.json");
}

#[test]
fn test_name_length_limit() {
    let config = Config::builder().max_name_length(20).build();
    let resolver = PathResolver::new(&config);
    let chat = resolver.record_type("chat").unwrap();

    assert!(resolver.validate_name("short.chat.json", chat).is_ok());
    assert!(matches!(
        resolver.validate_name("much-too-long-name.chat.json", chat),
        Err(VaultError::InvalidName { .. })
    ));
}

#[test]
fn test_name_length_counts_bytes() {
    let config = Config::builder().max_name_length(20).build();
    let resolver = PathResolver::new(&config);
    let chat = resolver.record_type("chat").unwrap();

    // 17 characters, 24 bytes
    let name = "ééééééé.chat.json";
    assert!(name.chars().count() <= 20);
    assert!(matches!(
        resolver.validate_name(name, chat),
        Err(VaultError::InvalidName { .. })
    ));
}

#[test]
fn test_default_limit_is_max_name_bytes() {
    let resolver = resolver();
    let chat = resolver.record_type("chat").unwrap();
    let stem_len = MAX_NAME_BYTES - ".chat.json".len();

    let at_limit = format!("{}.chat.json", "a".repeat(stem_len));
    let over = format!("{}.chat.json", "a".repeat(stem_len + 1));

    assert!(resolver.validate_name(&at_limit, chat).is_ok());
    assert!(matches!(
        resolver.validate_name(&over, chat),
        Err(VaultError::InvalidName { .. })
    ));
}

#[test]
fn test_backup_names_use_filesystem_limit() {
    let resolver = resolver();
    let backup = format!("{}_2026-01-01T00-00-00-000000000Z.chat.json.bak", "a".repeat(MAX_NAME_BYTES - 10));

    assert!(resolver.check_safe(&backup).is_err());
    assert!(resolver.check_backup_name(&backup).is_ok());
    assert!(resolver.check_backup_name("../x.chat.json.bak").is_err());
}

#[test]
fn test_stem() {
    let resolver = resolver();
    let chat = resolver.record_type("chat").unwrap();

    assert_eq!(PathResolver::stem("c1.chat.json", chat), "c1");
    assert_eq!(PathResolver::stem("other.txt", chat), "other.txt");
}
