//! Key/value cache slots.
//!
//! A slot is replaced wholesale on every write; there are no partial updates.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM cache_slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO cache_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Returns whether a slot was present.
    pub fn remove_slot(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM cache_slots WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}
