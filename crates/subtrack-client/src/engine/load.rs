use subtrack_shared::crypto::decrypt_record;
use subtrack_shared::{RemoteDocument, Subscription};
use tracing::{debug, info, warn};

use super::SyncEngine;
use crate::error::{Result, SyncError};
use crate::session::{AuthError, IdentityEvent, SessionUser};
use crate::state::SessionState;

/// What a load did to the in-memory set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Shown from a local cache slot; `found` is false when the slot was empty.
    Local { found: bool },
    /// Replaced by the remote set.
    Remote { count: usize, skipped: usize },
    /// The remote store could not be reached; the cached view stays.
    Offline,
    /// The identity changed while the load was in flight; result dropped.
    Stale,
}

impl SyncEngine {
    /// Startup. Shows cached data immediately, without touching the network.
    ///
    /// A remembered uid puts the engine into the optimistic state on that
    /// user's slot until the identity provider confirms or revokes it.
    pub fn resume(&self) -> Result<LoadOutcome> {
        let mut state = self.lock()?;

        let session = match state.cache.remembered_uid()? {
            Some(uid) => {
                info!(uid = %uid, "resuming remembered identity");
                SessionState::Optimistic { uid }
            }
            None => {
                info!("starting as guest");
                SessionState::Guest
            }
        };

        state.transition(session);
        let found = state.show_cached()?;
        self.publish(&state);

        debug!(found, count = state.subscriptions.len(), "cached view shown");
        Ok(LoadOutcome::Local { found })
    }

    /// Apply one identity transition reported by the provider.
    pub async fn handle_identity(&self, event: IdentityEvent) -> Result<LoadOutcome> {
        match event {
            IdentityEvent::SignedIn(user) if user.uid.trim().is_empty() => {
                warn!("ignoring sign-in without a uid");
                Err(SyncError::Auth(AuthError::Rejected("identity has no uid".into())))
            }
            IdentityEvent::SignedIn(user) => self.confirm_identity(user).await,
            IdentityEvent::SignedOut => {
                info!("identity revoked");
                self.enter_guest()
            }
        }
    }

    async fn confirm_identity(&self, user: SessionUser) -> Result<LoadOutcome> {
        let uid = user.uid.clone();

        let epoch = {
            let mut state = self.lock()?;
            state.cache.remember_uid(&uid)?;

            let same_identity = state.session.uid() == Some(uid.as_str());
            let epoch = state.transition(SessionState::Confirmed(user));
            if !same_identity {
                state.show_cached()?;
            }
            self.publish(&state);
            epoch
        };

        info!(uid = %uid, epoch, "identity confirmed");

        match self.migrate_guest_data(&uid).await {
            Ok(outcome) => debug!(?outcome, "guest migration finished"),
            Err(e) => warn!(uid = %uid, error = %e, "guest migration aborted"),
        }

        self.load_authoritative(epoch, &uid).await
    }

    /// Fetch every remote document of `uid` and make the result the
    /// in-memory set, unless the identity moved on in the meantime.
    pub(super) async fn load_authoritative(&self, epoch: u64, uid: &str) -> Result<LoadOutcome> {
        let documents = match self.remote.list_all(uid).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(uid, error = %e, "remote load failed, keeping cached view");
                return Ok(LoadOutcome::Offline);
            }
        };

        let (mut records, skipped) = resolve_documents(uid, documents);

        let mut state = self.lock()?;
        if state.epoch != epoch || state.session.uid() != Some(uid) {
            debug!(uid, epoch, current = state.epoch, "discarding stale load");
            return Ok(LoadOutcome::Stale);
        }

        // Records whose remote write is still queued are not in the remote
        // set yet; keep the local copies.
        for id in state.cache.pending(uid)? {
            if records.iter().any(|r| r.id == id) {
                continue;
            }
            if let Some(local) = state.subscriptions.iter().find(|r| r.id == id) {
                records.push(local.clone());
            }
        }

        let count = records.len();
        state.replace_all(records)?;
        self.publish(&state);

        info!(uid, count, skipped, "remote set loaded");
        Ok(LoadOutcome::Remote { count, skipped })
    }
}

/// Turn raw remote documents into records. Encrypted documents that fail to
/// open are skipped; legacy plaintext documents are accepted as they are.
fn resolve_documents(uid: &str, documents: Vec<RemoteDocument>) -> (Vec<Subscription>, usize) {
    let mut records = Vec::with_capacity(documents.len());
    let mut skipped = 0;

    for document in documents {
        match document {
            RemoteDocument::Encrypted(envelope) => match decrypt_record(&envelope.ciphertext, uid) {
                Some(record) if record.id == envelope.id => records.push(record),
                Some(record) => {
                    warn!(
                        document = %envelope.id,
                        record = %record.id,
                        "envelope id mismatch, skipping"
                    );
                    skipped += 1;
                }
                None => {
                    warn!(document = %envelope.id, "undecryptable document, skipping");
                    skipped += 1;
                }
            },
            RemoteDocument::Legacy(record) => {
                debug!(document = %record.id, "accepting legacy plaintext document");
                records.push(record);
            }
        }
    }

    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use subtrack_shared::crypto::seal;
    use subtrack_shared::{Envelope, Frequency};

    fn record(id: &str, name: &str) -> Subscription {
        Subscription {
            id: id.into(),
            name: name.into(),
            amount: 9.99,
            frequency: Frequency::Monthly,
            renewal_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_mixed_documents() {
        let sealed = seal(&record("a", "Netflix"), "alice", Utc::now()).unwrap();
        let foreign = seal(&record("b", "Hulu"), "mallory", Utc::now()).unwrap();
        let legacy = record("c", "Spotify");

        let (records, skipped) = resolve_documents(
            "alice",
            vec![
                RemoteDocument::Encrypted(sealed),
                RemoteDocument::Encrypted(foreign),
                RemoteDocument::Legacy(legacy),
            ],
        );

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Netflix", "Spotify"]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_resolve_rejects_swapped_envelope() {
        let sealed = seal(&record("a", "Netflix"), "alice", Utc::now()).unwrap();
        let swapped = Envelope {
            id: "z".into(),
            ..sealed
        };

        let (records, skipped) =
            resolve_documents("alice", vec![RemoteDocument::Encrypted(swapped)]);
        assert!(records.is_empty());
        assert_eq!(skipped, 1);
    }
}
