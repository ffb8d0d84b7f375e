//! Typed view over the local store's cache slots.

use subtrack_shared::constants::LAST_UID_KEY;
use subtrack_shared::Subscription;
use subtrack_store::Database;

use crate::error::Result;

/// Serialized subscription sets, the remembered identity and the outbox.
pub struct SubscriptionCache {
    db: Database,
}

impl SubscriptionCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read a subscription set. A slot that no longer parses is reported as
    /// absent rather than failing the load.
    pub fn load_set(&self, key: &str) -> Result<Option<Vec<Subscription>>> {
        let Some(raw) = self.db.read_slot(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(Some(records)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring corrupt cache slot");
                Ok(None)
            }
        }
    }

    pub fn store_set(&self, key: &str, records: &[Subscription]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.db.write_slot(key, &raw)?;
        Ok(())
    }

    pub fn clear(&self, key: &str) -> Result<bool> {
        Ok(self.db.remove_slot(key)?)
    }

    pub fn remembered_uid(&self) -> Result<Option<String>> {
        Ok(self
            .db
            .read_slot(LAST_UID_KEY)?
            .filter(|uid| !uid.is_empty()))
    }

    pub fn remember_uid(&self, uid: &str) -> Result<()> {
        Ok(self.db.write_slot(LAST_UID_KEY, uid)?)
    }

    pub fn forget_uid(&self) -> Result<()> {
        self.db.remove_slot(LAST_UID_KEY)?;
        Ok(())
    }

    pub fn enqueue_pending(&self, uid: &str, record_id: &str) -> Result<()> {
        Ok(self.db.enqueue_outbox(uid, record_id)?)
    }

    /// Record ids still waiting for a remote write, oldest first.
    pub fn pending(&self, uid: &str) -> Result<Vec<String>> {
        Ok(self
            .db
            .list_outbox(uid)?
            .into_iter()
            .map(|entry| entry.record_id)
            .collect())
    }

    pub fn mark_synced(&self, uid: &str, record_id: &str) -> Result<()> {
        self.db.remove_outbox(uid, record_id)?;
        Ok(())
    }

    pub fn clear_pending(&self, uid: &str) -> Result<usize> {
        Ok(self.db.clear_outbox(uid)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use subtrack_shared::constants::GUEST_CACHE_KEY;
    use subtrack_shared::Frequency;

    fn cache() -> SubscriptionCache {
        SubscriptionCache::new(Database::open_in_memory().unwrap())
    }

    fn record(name: &str) -> Subscription {
        Subscription {
            id: format!("id-{name}"),
            name: name.into(),
            amount: 9.99,
            frequency: Frequency::Monthly,
            renewal_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_set_roundtrip() {
        let cache = cache();
        let records = vec![record("Tidal"), record("Uber One")];
        cache.store_set(GUEST_CACHE_KEY, &records).unwrap();

        assert_eq!(cache.load_set(GUEST_CACHE_KEY).unwrap(), Some(records));
    }

    #[test]
    fn test_corrupt_slot_reads_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.write_slot(GUEST_CACHE_KEY, "{not json").unwrap();
        let cache = SubscriptionCache::new(db);

        assert_eq!(cache.load_set(GUEST_CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_remembered_uid_lifecycle() {
        let cache = cache();
        assert_eq!(cache.remembered_uid().unwrap(), None);

        cache.remember_uid("alice").unwrap();
        assert_eq!(cache.remembered_uid().unwrap().as_deref(), Some("alice"));

        cache.forget_uid().unwrap();
        assert_eq!(cache.remembered_uid().unwrap(), None);
    }

    #[test]
    fn test_pending_roundtrip() {
        let cache = cache();
        cache.enqueue_pending("alice", "id-1").unwrap();
        cache.enqueue_pending("alice", "id-2").unwrap();
        cache.mark_synced("alice", "id-1").unwrap();

        assert_eq!(cache.pending("alice").unwrap(), vec!["id-2".to_string()]);
        assert_eq!(cache.clear_pending("alice").unwrap(), 1);
    }
}
