//! Record encryption boundary.
//!
//! Records synced to the remote store are sealed with XChaCha20-Poly1305
//! under a key derived from the user id. The key is derivable by anyone who
//! can read the user's documents, so this only keeps the remote copy opaque
//! to casual inspection.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::constants::{KDF_CONTEXT_RECORD_KEY, NONCE_SIZE, SYMMETRIC_KEY_SIZE};
use crate::error::CryptoError;
use crate::types::{Envelope, Subscription};

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];

pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Seal `plaintext` under `key`. Output layout: 24-byte nonce, then the
/// AEAD ciphertext with its tag.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce = generate_nonce();
    let sealed = XChaCha20Poly1305::new(key.into())
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok([nonce.as_slice(), sealed.as_slice()].concat())
}

/// Inverse of [`encrypt`]. Truncated input, a wrong key and tampering all
/// fail the same way.
pub fn decrypt(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce, sealed) = data.split_at(NONCE_SIZE);
    XChaCha20Poly1305::new(key.into())
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Per-user record key: BLAKE3 in key-derivation mode over the uid.
pub fn derive_record_key(uid: &str) -> Result<SymmetricKey, CryptoError> {
    if uid.is_empty() {
        return Err(CryptoError::EmptyKey);
    }
    Ok(blake3::derive_key(KDF_CONTEXT_RECORD_KEY, uid.as_bytes()))
}

/// Serialize and encrypt a record, returning base64 text suitable for a
/// document field.
pub fn encrypt_record(record: &Subscription, uid: &str) -> Result<String, CryptoError> {
    let key = derive_record_key(uid)?;
    let json =
        serde_json::to_vec(record).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    let sealed = encrypt(&key, &json)?;
    Ok(BASE64_STANDARD.encode(sealed))
}

/// Inverse of [`encrypt_record`]. Any failure (bad encoding, wrong key,
/// tampering, malformed payload) yields `None`.
pub fn decrypt_record(ciphertext: &str, uid: &str) -> Option<Subscription> {
    let key = derive_record_key(uid).ok()?;
    let sealed = BASE64_STANDARD.decode(ciphertext.trim()).ok()?;
    let json = decrypt(&key, &sealed).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Build the envelope stored remotely for `record`.
pub fn seal(record: &Subscription, uid: &str, now: DateTime<Utc>) -> Result<Envelope, CryptoError> {
    Ok(Envelope {
        id: record.id.clone(),
        ciphertext: encrypt_record(record, uid)?,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Frequency;
    use chrono::NaiveDate;

    fn sample() -> Subscription {
        Subscription {
            id: "sub-1".into(),
            name: "Netflix (Standard)".into(),
            amount: 15.49,
            frequency: Frequency::Monthly,
            renewal_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = derive_record_key("uid-1").unwrap();
        let plaintext = b"twelve dollars a month";

        let encrypted = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample();
        let ciphertext = encrypt_record(&record, "uid-1").unwrap();

        assert_eq!(decrypt_record(&ciphertext, "uid-1"), Some(record));
    }

    #[test]
    fn test_wrong_uid_yields_none() {
        let ciphertext = encrypt_record(&sample(), "uid-1").unwrap();
        assert_eq!(decrypt_record(&ciphertext, "uid-2"), None);
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(decrypt_record("", "uid-1"), None);
        assert_eq!(decrypt_record("not base64 at all!", "uid-1"), None);
        assert_eq!(decrypt_record("aGVsbG8=", "uid-1"), None);
        assert_eq!(decrypt_record("aGVsbG8=", ""), None);
    }

    #[test]
    fn test_tampered_ciphertext_yields_none() {
        let ciphertext = encrypt_record(&sample(), "uid-1").unwrap();
        let mut raw = BASE64_STANDARD.decode(&ciphertext).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;

        assert_eq!(decrypt_record(&BASE64_STANDARD.encode(raw), "uid-1"), None);
    }

    #[test]
    fn test_record_key_derivation_deterministic() {
        assert_eq!(
            derive_record_key("uid-1").unwrap(),
            derive_record_key("uid-1").unwrap()
        );
        assert_ne!(
            derive_record_key("uid-1").unwrap(),
            derive_record_key("uid-2").unwrap()
        );
        assert!(derive_record_key("").is_err());
    }

    #[test]
    fn test_seal_mirrors_record_id() {
        let record = sample();
        let envelope = seal(&record, "uid-1", Utc::now()).unwrap();

        assert_eq!(envelope.id, record.id);
        assert_eq!(decrypt_record(&envelope.ciphertext, "uid-1"), Some(record));
    }

    #[test]
    fn test_nonce_prepended() {
        let key = derive_record_key("uid-1").unwrap();
        let encrypted = encrypt(&key, b"test").unwrap();
        // nonce (24) + ciphertext (4 + 16 tag)
        assert!(encrypted.len() >= NONCE_SIZE + 4 + 16);
    }
}
