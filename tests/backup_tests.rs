//! Tests for BackupManager and retention planning
//!
//! These tests verify:
//! - Backup naming and parsing
//! - Byte-identical copies
//! - Count-based and age-based retention
//! - Sweep idempotence

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use docvault::backup::{plan_retention, BackupInfo, BackupManager};
use docvault::{BackupConfig, RecordType};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn chat_type() -> RecordType {
    RecordType::defaults()
        .into_iter()
        .find(|t| t.name == "chat")
        .unwrap()
}

fn setup_backup_manager(config: BackupConfig) -> (TempDir, BackupManager, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let manager = BackupManager::new(
        &temp_dir.path().join("backups"),
        config,
        RecordType::defaults(),
    )
    .unwrap();
    let source = temp_dir.path().join("c1.chat.json");
    (temp_dir, manager, source)
}

fn info(original: &str, backup_name: &str, minutes_ago: i64, now: chrono::DateTime<Utc>) -> BackupInfo {
    BackupInfo {
        backup_name: backup_name.to_string(),
        original_name: original.to_string(),
        record_type: "chat".to_string(),
        created_at: now - chrono::Duration::minutes(minutes_ago),
        size: 10,
        path: PathBuf::from(backup_name),
    }
}

fn backup_version(manager: &BackupManager, source: &Path, contents: &str) -> PathBuf {
    fs::write(source, contents).unwrap();
    let path = manager.backup(source, "c1.chat.json", &chat_type()).unwrap();
    // Distinct timestamps in backup names
    thread::sleep(Duration::from_millis(5));
    path
}

// =============================================================================
// Naming Tests
// =============================================================================

#[test]
fn test_backup_name_layout() {
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
    let name = BackupManager::backup_name("c1", at, &chat_type());

    assert_eq!(name, "c1_2026-03-04T05-06-07-000000000Z.chat.json.bak");
    assert!(!name.contains(':'));
}

#[test]
fn test_longest_document_name_fits_backup_name() {
    use docvault::config::{FS_NAME_MAX, MAX_NAME_BYTES};

    let chat = chat_type();
    let stem = "a".repeat(MAX_NAME_BYTES - chat.extension.len());
    let name = BackupManager::backup_name(&stem, Utc::now(), &chat);

    assert_eq!(name.len(), FS_NAME_MAX);
}

#[test]
fn test_backup_of_long_name_succeeds() {
    let (temp, manager, _source) = setup_backup_manager(BackupConfig::default());
    let chat = chat_type();
    let name = format!(
        "{}{}",
        "a".repeat(docvault::config::MAX_NAME_BYTES - chat.extension.len()),
        chat.extension
    );
    let source = temp.path().join(&name);
    fs::write(&source, "{}").unwrap();

    manager.backup(&source, &name, &chat).unwrap();

    let listed = manager.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].original_name, name);
}

#[test]
fn test_parse_backup_name() {
    let types = RecordType::defaults();
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
    let name = BackupManager::backup_name("my_chat", at, &chat_type());

    let (original, record_type, created_at) =
        BackupManager::parse_backup_name(&name, &types).unwrap();

    assert_eq!(original, "my_chat.chat.json");
    assert_eq!(record_type.name, "chat");
    assert_eq!(created_at, at);
}

#[test]
fn test_parse_rejects_foreign_files() {
    let types = RecordType::defaults();

    assert!(BackupManager::parse_backup_name("notes.txt", &types).is_none());
    assert!(BackupManager::parse_backup_name("c1.chat.json", &types).is_none());
    assert!(BackupManager::parse_backup_name("c1_garbage.chat.json.bak", &types).is_none());
    assert!(
        BackupManager::parse_backup_name("_2026-03-04T05-06-07-000000000Z.chat.json.bak", &types)
            .is_none()
    );
}

// =============================================================================
// Backup Tests
// =============================================================================

#[test]
fn test_backup_copies_bytes() {
    let (_temp, manager, source) = setup_backup_manager(BackupConfig::default());

    let path = backup_version(&manager, &source, "{\"v\":1}");

    assert_eq!(fs::read(&path).unwrap(), b"{\"v\":1}");
    assert!(path.starts_with(manager.backup_dir()));

    let listed = manager.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].original_name, "c1.chat.json");
    assert_eq!(listed[0].record_type, "chat");
    assert_eq!(listed[0].size, 7);
}

#[test]
fn test_backup_of_missing_source_fails() {
    let (_temp, manager, source) = setup_backup_manager(BackupConfig::default());

    let result = manager.backup(&source, "c1.chat.json", &chat_type());

    assert!(matches!(result, Err(docvault::VaultError::BackupFailed(_))));
    assert!(manager.list().unwrap().is_empty());
}

#[test]
fn test_list_is_newest_first() {
    let (_temp, manager, source) = setup_backup_manager(BackupConfig::default());

    backup_version(&manager, &source, "one");
    backup_version(&manager, &source, "two");
    backup_version(&manager, &source, "three");

    let listed = manager.list().unwrap();
    let contents: Vec<String> = listed
        .iter()
        .map(|b| fs::read_to_string(&b.path).unwrap())
        .collect();
    assert_eq!(contents, vec!["three", "two", "one"]);
}

// =============================================================================
// Retention Tests
// =============================================================================

#[test]
fn test_max_backups_keeps_most_recent() {
    let config = BackupConfig {
        max_backups: 2,
        ..Default::default()
    };
    let (_temp, manager, source) = setup_backup_manager(config);

    backup_version(&manager, &source, "v1");
    backup_version(&manager, &source, "v2");
    backup_version(&manager, &source, "v3");

    let listed = manager.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(fs::read_to_string(&listed[0].path).unwrap(), "v3");
    assert_eq!(fs::read_to_string(&listed[1].path).unwrap(), "v2");
}

#[test]
fn test_retention_groups_by_original() {
    let now = Utc::now();
    let backups = vec![
        info("a.chat.json", "a1", 1, now),
        info("a.chat.json", "a2", 2, now),
        info("b.chat.json", "b1", 3, now),
    ];

    let doomed = plan_retention(&backups, 1, Duration::from_secs(86_400), now);

    assert_eq!(doomed, vec![PathBuf::from("a2")]);
}

#[test]
fn test_retention_by_age() {
    let now = Utc::now();
    let backups = vec![
        info("a.chat.json", "fresh", 5, now),
        info("a.chat.json", "stale", 120, now),
    ];

    let doomed = plan_retention(&backups, 10, Duration::from_secs(3_600), now);

    assert_eq!(doomed, vec![PathBuf::from("stale")]);
}

#[test]
fn test_retention_zero_max_deletes_all() {
    let now = Utc::now();
    let backups = vec![info("a.chat.json", "a1", 1, now)];

    let doomed = plan_retention(&backups, 0, Duration::from_secs(3_600), now);

    assert_eq!(doomed.len(), 1);
}

#[test]
fn test_cleanup_is_idempotent() {
    let config = BackupConfig {
        max_backups: 1,
        ..Default::default()
    };
    let (_temp, manager, source) = setup_backup_manager(config);
    backup_version(&manager, &source, "v1");
    backup_version(&manager, &source, "v2");

    let first = manager.cleanup().unwrap();
    let second = manager.cleanup().unwrap();

    assert_eq!(first.deleted, 0);
    assert_eq!(second.deleted, 0);
    assert_eq!(second.examined, 1);
}

#[test]
fn test_cleanup_removes_expired_files_on_disk() {
    let config = BackupConfig {
        retention: Duration::from_secs(3_600),
        ..Default::default()
    };
    let (_temp, manager, _source) = setup_backup_manager(config);

    let old = Utc::now() - chrono::Duration::hours(2);
    let old_name = BackupManager::backup_name("c1", old, &chat_type());
    fs::write(manager.backup_dir().join(&old_name), "old").unwrap();
    fs::write(manager.backup_dir().join("unrelated.txt"), "keep").unwrap();

    let report = manager.cleanup().unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.deleted, 1);
    assert!(!manager.backup_dir().join(&old_name).exists());
    assert!(manager.backup_dir().join("unrelated.txt").exists());
}
