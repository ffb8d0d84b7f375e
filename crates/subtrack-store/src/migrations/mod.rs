//! Schema migrations, tracked through the `user_version` pragma.
//!
//! Steps run in order inside the constructors of [`crate::Database`]; each
//! one is applied at most once per database file.

pub mod v001_initial;
pub mod v002_outbox;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered schema steps. The position + 1 is the version a step produces.
const STEPS: &[(&str, Step)] = &[
    ("initial", v001_initial::up),
    ("outbox", v002_outbox::up),
];

pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    tracing::debug!(current, target = CURRENT_VERSION, "checking cache schema");

    for (version, &(name, up)) in (1u32..).zip(STEPS.iter()) {
        if version <= current {
            continue;
        }

        tracing::info!(version, name, "applying cache migration");
        up(conn).map_err(|e| StoreError::Migration {
            version,
            reason: e.to_string(),
        })?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
