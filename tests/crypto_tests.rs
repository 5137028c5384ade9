//! Integration tests for the Lockbox crypto module.

use lockbox::crypto::{decrypt, encrypt, AesGcmEngine, CryptoEngine, KeyManager, KeyOrigin};
use lockbox::errors::LockboxError;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_across_payload_shapes() {
    let key = [0xABu8; 32];
    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"a".to_vec(),
        b"DATABASE_URL=postgres://localhost/mydb".to_vec(),
        "x".repeat(64 * 1024).into_bytes(),
        "p\u{e4}ssw\u{f6}rd \u{1f511}".as_bytes().to_vec(),
        vec![0x00, 0xFF, 0x10, 0x80, 0x00],
    ];

    for plaintext in payloads {
        let token = encrypt(&plaintext, &key).expect("encrypt should succeed");
        let recovered = decrypt(&token, &key).expect("decrypt should succeed");
        assert_eq!(recovered, plaintext);
    }
}

#[test]
fn roundtrip_for_every_supported_key_length() {
    let engine = AesGcmEngine;
    for len in [16, 24, 32] {
        let key = vec![0x42u8; len];
        let token = engine.encrypt(b"SECRET=hello", &key).unwrap();
        assert_eq!(engine.decrypt(&token, &key).unwrap(), b"SECRET=hello");
    }
}

#[test]
fn encrypt_produces_different_tokens_each_time() {
    let key = [0xCDu8; 32];

    let t1 = encrypt(b"SECRET=hello", &key).unwrap();
    let t2 = encrypt(b"SECRET=hello", &key).unwrap();

    // Fresh random nonce per call.
    assert_ne!(t1, t2);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_key_is_decryption_failure() {
    let token = encrypt(b"top secret", &[1u8; 32]).unwrap();
    let result = decrypt(&token, &[2u8; 32]);
    assert!(matches!(result, Err(LockboxError::DecryptionFailed)));
}

#[test]
fn tampered_token_is_decryption_failure() {
    let key = [3u8; 32];
    let token = encrypt(b"integrity matters", &key).unwrap();

    // Flip one base64 character in the ciphertext part.
    let mut chars: Vec<char> = token.chars().collect();
    let i = chars.len() / 2;
    chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    assert!(matches!(
        decrypt(&tampered, &key),
        Err(LockboxError::DecryptionFailed)
    ));
}

#[test]
fn short_or_invalid_tokens_fail() {
    let key = [4u8; 32];
    assert!(matches!(
        decrypt("AAAA", &key),
        Err(LockboxError::DecryptionFailed)
    ));
    assert!(matches!(
        decrypt("not base64 !!!", &key),
        Err(LockboxError::DecryptionFailed)
    ));
}

#[test]
fn unsupported_key_length_is_validation_error() {
    assert!(matches!(
        encrypt(b"x", &[0u8; 20]),
        Err(LockboxError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// Key manager
// ---------------------------------------------------------------------------

#[test]
fn key_is_generated_once_then_loaded() {
    let dir = TempDir::new().unwrap();
    let manager = KeyManager::new(dir.path().join("keys"), 32);
    let uuid = "7f1c2a9e-0000-4000-8000-123456789abc";

    let (first, origin) = manager.load_or_create_key_with_origin(uuid).unwrap();
    assert_eq!(origin, KeyOrigin::Generated);
    assert_eq!(first.len(), 32);
    assert!(manager.key_path(uuid).exists());

    let (second, origin) = manager.load_or_create_key_with_origin(uuid).unwrap();
    assert_eq!(origin, KeyOrigin::Loaded);
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn different_uuids_get_isolated_keys() {
    let dir = TempDir::new().unwrap();
    let manager = KeyManager::new(dir.path(), 32);

    let k1 = manager.load_or_create_key("uuid-one").unwrap();
    let k2 = manager.load_or_create_key("uuid-two").unwrap();
    assert_ne!(k1.as_bytes(), k2.as_bytes());

    let token = encrypt(b"value", k1.as_bytes()).unwrap();
    assert!(decrypt(&token, k2.as_bytes()).is_err());
}

#[test]
fn configured_key_size_is_honoured() {
    let dir = TempDir::new().unwrap();
    let key = KeyManager::new(dir.path(), 16)
        .load_or_create_key("short-key")
        .unwrap();
    assert_eq!(key.len(), 16);
}

#[test]
fn empty_key_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let manager = KeyManager::new(dir.path(), 32);
    std::fs::write(manager.key_path("empty"), b"").unwrap();

    assert!(matches!(
        manager.load_or_create_key("empty"),
        Err(LockboxError::Validation(_))
    ));
}

#[test]
fn path_like_uuid_is_rejected() {
    let dir = TempDir::new().unwrap();
    let manager = KeyManager::new(dir.path(), 32);
    assert!(manager.load_or_create_key("../escape").is_err());
}
