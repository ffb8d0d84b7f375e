use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use subtrack_shared::{Envelope, RemoteDocument};

use super::{RemoteError, RemoteStore, WriteBatch, WriteOp};

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-process document store. Documents are kept as JSON so reads go
/// through the same shape resolution as a real backend.
pub struct MemoryRemoteStore {
    users: Mutex<Collections>,
    available: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            commits: AtomicUsize::new(0),
        }
    }

    /// Simulate going offline (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Store an arbitrary document, bypassing the envelope shape.
    pub fn insert_raw(&self, uid: &str, id: &str, document: Value) {
        if let Ok(mut users) = self.users.lock() {
            users
                .entry(uid.to_string())
                .or_default()
                .insert(id.to_string(), document);
        }
    }

    pub fn document_count(&self, uid: &str) -> usize {
        self.users
            .lock()
            .map(|users| users.get(uid).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Number of successfully applied batches.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), RemoteError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("remote store is offline".into()))
        }
    }

    fn collections(&self) -> Result<std::sync::MutexGuard<'_, Collections>, RemoteError> {
        self.users
            .lock()
            .map_err(|_| RemoteError::Unavailable("remote store lock poisoned".into()))
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_document(envelope: &Envelope) -> Result<Value, RemoteError> {
    serde_json::to_value(envelope).map_err(|e| RemoteError::Unavailable(e.to_string()))
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list_all(&self, uid: &str) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.ensure_available()?;

        let raw: Vec<(String, Value)> = {
            let users = self.collections()?;
            users
                .get(uid)
                .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        };

        let mut documents = Vec::with_capacity(raw.len());
        for (id, value) in raw {
            match serde_json::from_value::<RemoteDocument>(value) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!(uid, id = %id, error = %e, "skipping unreadable document"),
            }
        }
        Ok(documents)
    }

    async fn put(&self, uid: &str, envelope: &Envelope) -> Result<(), RemoteError> {
        self.ensure_available()?;
        let document = to_document(envelope)?;
        self.collections()?
            .entry(uid.to_string())
            .or_default()
            .insert(envelope.id.clone(), document);
        Ok(())
    }

    async fn delete(&self, uid: &str, id: &str) -> Result<(), RemoteError> {
        self.ensure_available()?;
        if let Some(docs) = self.collections()?.get_mut(uid) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn commit(&self, uid: &str, batch: WriteBatch) -> Result<(), RemoteError> {
        self.ensure_available()?;

        // Serialize everything up front so a bad op rejects the whole batch.
        let mut prepared = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            prepared.push(match op {
                WriteOp::Set(envelope) => (envelope.id.clone(), Some(to_document(&envelope)?)),
                WriteOp::Delete(id) => (id, None),
            });
        }

        let mut users = self.collections()?;
        let docs = users.entry(uid.to_string()).or_default();
        for (id, document) in prepared {
            match document {
                Some(value) => {
                    docs.insert(id, value);
                }
                None => {
                    docs.remove(&id);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn envelope(id: &str) -> Envelope {
        Envelope {
            id: id.into(),
            ciphertext: format!("sealed-{id}"),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_and_list() {
        let store = MemoryRemoteStore::new();
        store.put("alice", &envelope("a")).await.unwrap();
        store.put("alice", &envelope("a")).await.unwrap();
        store.put("bob", &envelope("b")).await.unwrap();

        let docs = store.list_all("alice").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "a");
    }

    #[tokio::test]
    async fn test_offline_rejects_everything() {
        let store = MemoryRemoteStore::new();
        store.set_available(false);

        assert!(store.list_all("alice").await.is_err());
        assert!(store.put("alice", &envelope("a")).await.is_err());
        assert!(store.put_batch("alice", &[envelope("a")]).await.is_err());
        assert_eq!(store.document_count("alice"), 0);
    }

    #[tokio::test]
    async fn test_batch_put_and_delete() {
        let store = MemoryRemoteStore::new();
        store
            .put_batch("alice", &[envelope("a"), envelope("b"), envelope("c")])
            .await
            .unwrap();
        assert_eq!(store.document_count("alice"), 3);

        store
            .delete_all("alice", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(store.document_count("alice"), 1);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_one() {
        let store = MemoryRemoteStore::new();
        store.put("alice", &envelope("a")).await.unwrap();
        store.delete("alice", "a").await.unwrap();
        store.delete("alice", "missing").await.unwrap();

        assert_eq!(store.document_count("alice"), 0);
    }

    #[tokio::test]
    async fn test_unreadable_documents_are_skipped() {
        let store = MemoryRemoteStore::new();
        store.put("alice", &envelope("a")).await.unwrap();
        store.insert_raw("alice", "junk", json!({"hello": "world"}));

        let docs = store.list_all("alice").await.unwrap();
        assert_eq!(docs.len(), 1);
    }
}
