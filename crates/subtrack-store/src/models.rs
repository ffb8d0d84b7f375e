//! Row structs read back from the local database.

use chrono::{DateTime, Utc};

/// A record whose remote write failed and is waiting to be flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    /// Owner of the record.
    pub uid: String,
    /// Id of the subscription record.
    pub record_id: String,
    /// When the failed write was queued.
    pub queued_at: DateTime<Utc>,
}
