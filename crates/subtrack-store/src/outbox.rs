//! Durable queue of record ids whose remote write has not succeeded yet.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::OutboxEntry;

impl Database {
    /// Queue `record_id` for `uid`. Queuing the same record twice keeps the
    /// original timestamp.
    pub fn enqueue_outbox(&self, uid: &str, record_id: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO outbox (uid, record_id, queued_at) VALUES (?1, ?2, ?3)",
            params![uid, record_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Pending entries for `uid`, oldest first.
    pub fn list_outbox(&self, uid: &str) -> Result<Vec<OutboxEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT uid, record_id, queued_at FROM outbox
             WHERE uid = ?1 ORDER BY queued_at ASC, record_id ASC",
        )?;
        let rows = stmt.query_map(params![uid], |row| {
            let uid: String = row.get(0)?;
            let record_id: String = row.get(1)?;
            let queued_str: String = row.get(2)?;

            let queued_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&queued_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

            Ok(OutboxEntry {
                uid,
                record_id,
                queued_at,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn remove_outbox(&self, uid: &str, record_id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM outbox WHERE uid = ?1 AND record_id = ?2",
            params![uid, record_id],
        )?;
        Ok(affected > 0)
    }

    /// Drop every pending entry for `uid`, returning how many were removed.
    pub fn clear_outbox(&self, uid: &str) -> Result<usize> {
        let affected = self
            .conn()
            .execute("DELETE FROM outbox WHERE uid = ?1", params![uid])?;
        Ok(affected)
    }
}
