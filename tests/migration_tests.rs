//! Integration tests for legacy secrets file migration.

use std::fs;

use lockbox::crypto::{encrypt, AesGcmEngine, EncryptionKey};
use lockbox::errors::LockboxError;
use lockbox::vault::migration::backup_path_for;
use lockbox::vault::{
    migrate_to_new_format, FileStore, MigrationOutcome, SecretsFile, VersionedSecretService,
};
use tempfile::TempDir;

const KEY: [u8; 32] = [0x24; 32];

fn legacy_record(name: &str, value: &str, version: u32, updated_by: &str) -> serde_json::Value {
    serde_json::json!({
        "secretName": name,
        "secretValueEnc": encrypt(value.as_bytes(), &KEY).unwrap(),
        "type": "key_value",
        "version": version,
        "updatedAt": "2024-03-01T10:00:00Z",
        "updatedBy": updated_by,
    })
}

fn write_legacy(dir: &TempDir, records: Vec<serde_json::Value>) -> std::path::PathBuf {
    let path = dir.path().join("secrets.json");
    let doc = serde_json::json!({
        "appVersion": "0.9.0",
        "appUser": "legacy-user",
        "lastUpdated": "2024-03-01T10:00:00Z",
        "secrets": records,
    });
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}

#[test]
fn two_flat_records_become_one_secret() {
    let dir = TempDir::new().unwrap();
    let path = write_legacy(
        &dir,
        vec![
            legacy_record("A", "first", 1, "alice"),
            legacy_record("A", "second", 2, "bob"),
        ],
    );
    let original = fs::read_to_string(&path).unwrap();

    let outcome = migrate_to_new_format(&path).unwrap();
    let backup = backup_path_for(&path);
    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            secrets: 1,
            versions: 2,
            backup_path: backup.clone(),
        }
    );

    // Original preserved byte-for-byte as a `.backup` sibling.
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);

    let migrated: SecretsFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(migrated.secrets.len(), 1);
    let a = &migrated.secrets[0];
    assert_eq!(a.secret_name, "A");
    assert_eq!(a.current_version, 2);
    assert_eq!(a.versions.len(), 2);
    assert_eq!(a.versions[1].updated_by.as_deref(), Some("bob"));
    assert_eq!(migrated.app_user, "legacy-user");
}

#[test]
fn migrated_values_still_decrypt() {
    let dir = TempDir::new().unwrap();
    let path = write_legacy(
        &dir,
        vec![
            legacy_record("B", "b2", 2, ""),
            legacy_record("A", "a1", 1, ""),
            legacy_record("B", "b1", 1, ""),
        ],
    );

    migrate_to_new_format(&path).unwrap();

    let service = VersionedSecretService::new(
        AesGcmEngine,
        FileStore::new(&path, "1.0.0", "tester"),
        EncryptionKey::new(KEY.to_vec()),
    );
    let b = service.get_secret("B").unwrap();
    assert_eq!(service.get_secret_value(&b).unwrap(), "b2");
    assert_eq!(service.get_secret_value_by_version(&b, 1).unwrap(), "b1");
    assert_eq!(
        service.list_secrets().unwrap().len(),
        2,
        "records are grouped by name"
    );
}

#[test]
fn second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let path = write_legacy(&dir, vec![legacy_record("A", "x", 1, "u")]);

    migrate_to_new_format(&path).unwrap();
    let after_first = fs::read_to_string(&path).unwrap();

    assert_eq!(
        migrate_to_new_format(&path).unwrap(),
        MigrationOutcome::AlreadyCurrent
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
}

#[test]
fn missing_file_is_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.json");

    assert_eq!(
        migrate_to_new_format(&path).unwrap(),
        MigrationOutcome::NoFile
    );
    assert!(!path.exists());
}

#[test]
fn empty_secrets_list_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = write_legacy(&dir, vec![]);

    assert_eq!(
        migrate_to_new_format(&path).unwrap(),
        MigrationOutcome::AlreadyCurrent
    );
    assert!(!backup_path_for(&path).exists());
}

#[test]
fn unrecognized_document_fails_and_is_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.json");
    fs::write(&path, r#"{"something": "else"}"#).unwrap();

    assert!(matches!(
        migrate_to_new_format(&path),
        Err(LockboxError::Migration(_))
    ));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        r#"{"something": "else"}"#
    );
    assert!(!backup_path_for(&path).exists());
}
