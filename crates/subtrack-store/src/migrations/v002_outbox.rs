use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS outbox (
    uid       TEXT NOT NULL,
    record_id TEXT NOT NULL,
    queued_at TEXT NOT NULL,                -- RFC-3339
    PRIMARY KEY (uid, record_id)
);

CREATE INDEX IF NOT EXISTS idx_outbox_uid_queued ON outbox(uid, queued_at ASC);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
