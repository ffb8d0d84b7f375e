use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use subtrack_shared::constants::GUEST_CACHE_KEY;
use subtrack_shared::crypto::seal;

use super::SyncEngine;
use crate::error::Result;
use crate::events::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    NothingToMigrate,
    /// The user said no; guest data stays on the device.
    Declined { count: usize },
    Migrated { count: usize },
    /// The batch write failed; guest data stays on the device.
    Failed { count: usize },
}

impl SyncEngine {
    /// Offer to upload guest records into the account of `uid`.
    ///
    /// All records go up in a single atomic batch. Nothing leaves the guest
    /// slot unless every record was sealed and the batch committed.
    pub(super) async fn migrate_guest_data(&self, uid: &str) -> Result<MigrationOutcome> {
        let cached = self.lock()?.cache.load_set(GUEST_CACHE_KEY)?;
        let guest = match cached {
            Some(records) if !records.is_empty() => records,
            _ => return Ok(MigrationOutcome::NothingToMigrate),
        };

        let count = guest.len();
        if !self.consent.confirm_migration(count).await {
            info!(uid, count, "guest migration declined");
            return Ok(MigrationOutcome::Declined { count });
        }

        let now = Utc::now();
        let mut envelopes = Vec::with_capacity(count);
        for record in &guest {
            match seal(record, uid, now) {
                Ok(envelope) => envelopes.push(envelope),
                Err(e) => {
                    warn!(uid, id = %record.id, error = %e, "could not seal guest record");
                    self.notify(Notification::MigrationFailed { count });
                    return Ok(MigrationOutcome::Failed { count });
                }
            }
        }

        if let Err(e) = self.remote.put_batch(uid, &envelopes).await {
            warn!(uid, count, error = %e, "guest migration failed");
            self.notify(Notification::MigrationFailed { count });
            return Ok(MigrationOutcome::Failed { count });
        }

        let migrated: HashSet<&str> = guest.iter().map(|r| r.id.as_str()).collect();
        self.forget_migrated(&migrated)?;

        info!(uid, count = envelopes.len(), "guest data migrated");
        self.notify(Notification::MigrationCompleted {
            count: envelopes.len(),
        });
        Ok(MigrationOutcome::Migrated {
            count: envelopes.len(),
        })
    }

    /// Drop the migrated records from the guest slot. Records saved as guest
    /// while the batch was in flight stay.
    fn forget_migrated(&self, migrated: &HashSet<&str>) -> Result<()> {
        let mut state = self.lock()?;
        let remaining: Vec<_> = state
            .cache
            .load_set(GUEST_CACHE_KEY)?
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !migrated.contains(r.id.as_str()))
            .collect();

        if remaining.is_empty() {
            state.cache.clear(GUEST_CACHE_KEY)?;
        } else {
            state.cache.store_set(GUEST_CACHE_KEY, &remaining)?;
        }

        // Signed out again while the batch was in flight.
        if state.session.uid().is_none() {
            state.subscriptions = remaining;
            self.publish(&state);
        }
        Ok(())
    }
}
