use thiserror::Error;

use subtrack_shared::{CryptoError, SharedError};
use subtrack_store::StoreError;

use crate::remote::RemoteError;
use crate::session::AuthError;

/// Errors surfaced by the sync engine.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("A subscription named \"{0}\" already exists")]
    DuplicateName(String),

    #[error("Invalid subscription: {0}")]
    Invalid(String),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Engine state lock poisoned")]
    LockPoisoned,

    #[error("Remote writes need a Tokio runtime")]
    NoRuntime,
}

impl From<SharedError> for SyncError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::InvalidSubscription(reason) => Self::Invalid(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
