//! Remote document store contract.
//!
//! Each user owns a collection of documents keyed by record id. The engine
//! only ever writes [`Envelope`]s; reads may also return legacy plaintext
//! documents, see [`RemoteDocument`].

pub mod memory;
pub mod offline;

use async_trait::async_trait;
use thiserror::Error;

use subtrack_shared::{Envelope, RemoteDocument};

pub use memory::MemoryRemoteStore;
pub use offline::OfflineRemoteStore;

/// The only failure category the engine distinguishes: the store could not
/// be reached or refused the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set(Envelope),
    Delete(String),
}

/// An all-or-nothing group of writes against one user's collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, envelope: Envelope) -> &mut Self {
        self.ops.push(WriteOp::Set(envelope));
        self
    }

    pub fn delete(&mut self, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete(id.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_all(&self, uid: &str) -> Result<Vec<RemoteDocument>, RemoteError>;
    async fn put(&self, uid: &str, envelope: &Envelope) -> Result<(), RemoteError>;
    async fn delete(&self, uid: &str, id: &str) -> Result<(), RemoteError>;

    /// Apply every write in `batch` or none of them. A concurrent
    /// [`RemoteStore::list_all`] must never observe a partial batch.
    async fn commit(&self, uid: &str, batch: WriteBatch) -> Result<(), RemoteError>;

    async fn put_batch(&self, uid: &str, envelopes: &[Envelope]) -> Result<(), RemoteError> {
        let mut batch = WriteBatch::new();
        for envelope in envelopes {
            batch.set(envelope.clone());
        }
        self.commit(uid, batch).await
    }

    async fn delete_many(&self, uid: &str, ids: &[String]) -> Result<(), RemoteError> {
        let mut batch = WriteBatch::new();
        for id in ids {
            batch.delete(id.as_str());
        }
        self.commit(uid, batch).await
    }

    /// Remove every listed document of `uid` in one batch (used by reset).
    async fn delete_all(&self, uid: &str, ids: &[String]) -> Result<(), RemoteError> {
        self.delete_many(uid, ids).await
    }
}
