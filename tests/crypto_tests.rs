//! Integration tests for the envcrypt crypto module.

use envcrypt::crypto::envelope::{NONCE_LEN, TAG_LEN};
use envcrypt::crypto::integrity::HMAC_LEN;
use envcrypt::crypto::{decrypt, derive_key, encrypt, generate_salt, KdfParams, Password, SALT_LEN};
use envcrypt::errors::EnvCryptError;
use std::collections::HashSet;

/// Fast Argon2id parameters for tests (8 MiB floor, single pass).
fn fast() -> KdfParams {
    KdfParams::new(8_192, 1, 1).expect("valid test params")
}

// ---------------------------------------------------------------------------
// Envelope round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let password = Password::from("correct horse");
    let plaintext = br#"{"DATABASE_URL":"postgres://localhost/mydb"}"#;

    let envelope = encrypt(plaintext, &password, &fast()).expect("encrypt should succeed");
    assert_eq!(
        envelope.len(),
        SALT_LEN + NONCE_LEN + plaintext.len() + TAG_LEN + HMAC_LEN
    );

    let recovered = decrypt(&envelope, &password, &fast()).expect("decrypt should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn wrong_password_fails() {
    let envelope = encrypt(b"{}", &Password::from("pw-one"), &fast()).unwrap();

    for wrong in ["pw-two", "pw-one ", "PW-ONE", "x"] {
        let err = decrypt(&envelope, &Password::from(wrong), &fast()).unwrap_err();
        assert!(
            matches!(err, EnvCryptError::DecryptionFailed),
            "password {wrong:?} gave {err:?}"
        );
    }
}

#[test]
fn different_kdf_params_cannot_decrypt() {
    let password = Password::from("pw");
    let envelope = encrypt(b"{}", &password, &fast()).unwrap();
    let other = KdfParams::new(8_192, 2, 1).unwrap();

    assert!(matches!(
        decrypt(&envelope, &password, &other),
        Err(EnvCryptError::DecryptionFailed)
    ));
}

#[test]
fn salts_and_nonces_never_repeat() {
    let password = Password::from("pw");
    let mut salts = HashSet::new();
    let mut nonces = HashSet::new();

    for _ in 0..32 {
        let env = encrypt(b"same plaintext", &password, &fast()).unwrap();
        assert!(salts.insert(env[..SALT_LEN].to_vec()), "salt repeated");
        assert!(
            nonces.insert(env[SALT_LEN..SALT_LEN + NONCE_LEN].to_vec()),
            "nonce repeated"
        );
    }
}

#[test]
fn truncated_envelopes_are_rejected() {
    let password = Password::from("pw");
    let envelope = encrypt(b"payload", &password, &fast()).unwrap();

    assert!(matches!(
        decrypt(&envelope[..10], &password, &fast()),
        Err(EnvCryptError::InvalidVaultData)
    ));
    assert!(matches!(
        decrypt(&envelope[..SALT_LEN + 5], &password, &fast()),
        Err(EnvCryptError::CiphertextTooShort)
    ));
    // Cut inside the ciphertext: neither HMAC nor GCM tag can verify.
    assert!(matches!(
        decrypt(&envelope[..envelope.len() - 1], &password, &fast()),
        Err(EnvCryptError::DecryptionFailed)
    ));
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derive_key_is_deterministic_per_salt() {
    let password = Password::from("pw");
    let salt = generate_salt().unwrap();
    let other_salt = generate_salt().unwrap();

    let k1 = derive_key(&password, &salt, &fast()).unwrap();
    let k2 = derive_key(&password, &salt, &fast()).unwrap();
    let k3 = derive_key(&password, &other_salt, &fast()).unwrap();

    assert_eq!(k1.as_bytes(), k2.as_bytes());
    assert_ne!(k1.as_bytes(), k3.as_bytes());
}

#[test]
fn kdf_params_reject_weak_settings() {
    assert!(KdfParams::new(1_024, 1, 1).is_err(), "below memory floor");
    assert!(KdfParams::new(65_536, 0, 4).is_err());
    assert!(KdfParams::new(65_536, 1, 0).is_err());
    assert!(KdfParams::new(65_536, 1, 4).is_ok());
}

#[test]
fn debug_output_never_shows_secrets() {
    let password = Password::from("hunter2-super-secret");
    let key = derive_key(&password, &generate_salt().unwrap(), &fast()).unwrap();

    assert!(!format!("{password:?}").contains("hunter2"));
    assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
}
