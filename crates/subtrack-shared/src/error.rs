use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Empty identity key")]
    EmptyKey,

    #[error("Record serialization failed: {0}")]
    Serialization(String),
}
