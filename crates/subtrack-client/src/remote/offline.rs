use async_trait::async_trait;

use subtrack_shared::{Envelope, RemoteDocument};

use super::{RemoteError, RemoteStore, WriteBatch};

/// Stand-in for builds with no backend configured. Every call fails as
/// unavailable, so the engine behaves exactly as it does offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemoteStore;

fn unavailable() -> RemoteError {
    RemoteError::Unavailable("no remote store configured".into())
}

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    async fn list_all(&self, _uid: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        Err(unavailable())
    }

    async fn put(&self, _uid: &str, _envelope: &Envelope) -> Result<(), RemoteError> {
        Err(unavailable())
    }

    async fn delete(&self, _uid: &str, _id: &str) -> Result<(), RemoteError> {
        Err(unavailable())
    }

    async fn commit(&self, _uid: &str, _batch: WriteBatch) -> Result<(), RemoteError> {
        Err(unavailable())
    }
}
