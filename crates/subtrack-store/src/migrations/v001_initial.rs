//! v001 -- Initial schema creation.
//!
//! Creates `cache_slots`, the key/value table holding serialized
//! subscription sets and the remembered user id.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Cache slots
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS cache_slots (
    key        TEXT PRIMARY KEY NOT NULL,   -- `subscriptions`, `subscriptions_{uid}`, `last_uid`
    value      TEXT NOT NULL,               -- serialized payload, replaced wholesale
    updated_at TEXT NOT NULL                -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
