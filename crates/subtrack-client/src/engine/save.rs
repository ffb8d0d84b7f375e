use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use subtrack_shared::crypto::seal;
use subtrack_shared::{NewSubscription, Subscription};

use super::SyncEngine;
use crate::error::{Result, SyncError};
use crate::events::Notification;
use crate::retry::retry;

/// Where a saved record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Guest mode; the local cache is the only copy.
    Local,
    Synced,
    /// Remote write failed; the record is queued for [`SyncEngine::flush_pending`].
    Pending,
}

/// Returned as soon as a record is visible locally. The remote write, if
/// any, keeps running in the background.
#[derive(Debug)]
pub struct SaveHandle {
    record: Subscription,
    task: SaveTask,
}

#[derive(Debug)]
enum SaveTask {
    Ready(SaveOutcome),
    Spawned(JoinHandle<SaveOutcome>),
}

impl SaveHandle {
    pub fn record(&self) -> &Subscription {
        &self.record
    }

    pub async fn outcome(self) -> SaveOutcome {
        match self.task {
            SaveTask::Ready(outcome) => outcome,
            SaveTask::Spawned(handle) => handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "sync task ended abnormally");
                SaveOutcome::Pending
            }),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub synced: usize,
    pub still_pending: usize,
    /// Queued ids whose record no longer exists locally.
    pub dropped: usize,
}

impl SyncEngine {
    /// Add a subscription.
    ///
    /// The record is cached and published before this returns. For a signed
    /// in user the encrypted write is spawned onto the current Tokio runtime;
    /// without one the save is refused with [`SyncError::NoRuntime`] before
    /// anything changes.
    pub fn save_subscription(&self, draft: NewSubscription) -> Result<SaveHandle> {
        let runtime = Handle::try_current().ok();

        let (record, uid) = {
            let mut state = self.lock()?;

            if state.contains_name(&draft.name) {
                let name = draft.name.trim().to_string();
                info!(name = %name, "rejecting duplicate subscription");
                self.notify(Notification::DuplicateName { name: name.clone() });
                return Err(SyncError::DuplicateName(name));
            }

            if state.session.uid().is_some() && runtime.is_none() {
                warn!("signed-in save outside a runtime");
                return Err(SyncError::NoRuntime);
            }

            let record = draft.into_record(Utc::now())?;
            state.append(record.clone())?;
            self.publish(&state);
            (record, state.session.uid().map(str::to_owned))
        };

        let (Some(uid), Some(runtime)) = (uid, runtime) else {
            info!(id = %record.id, "saved locally");
            self.notify(Notification::SavedLocally);
            return Ok(SaveHandle {
                record,
                task: SaveTask::Ready(SaveOutcome::Local),
            });
        };

        let engine = self.clone();
        let pending = record.clone();
        let handle = runtime.spawn(async move { engine.push_record(&uid, &pending).await });

        Ok(SaveHandle {
            record,
            task: SaveTask::Spawned(handle),
        })
    }

    async fn push_record(&self, uid: &str, record: &Subscription) -> SaveOutcome {
        let result = match seal(record, uid, Utc::now()) {
            Ok(envelope) => self.remote.put(uid, &envelope).await.map_err(SyncError::from),
            Err(e) => Err(SyncError::from(e)),
        };

        match result {
            Ok(()) => {
                info!(uid, id = %record.id, "subscription synced");
                self.notify(Notification::Synced);
                SaveOutcome::Synced
            }
            Err(e) => {
                warn!(uid, id = %record.id, error = %e, "remote write failed, keeping local copy");
                self.queue_pending(uid, &record.id);
                self.notify(Notification::SyncPending);
                SaveOutcome::Pending
            }
        }
    }

    /// Retry every queued remote write of the current user.
    pub async fn flush_pending(&self) -> Result<FlushReport> {
        let (uid, records, dropped) = {
            let state = self.lock()?;
            let Some(uid) = state.session.uid().map(str::to_owned) else {
                return Ok(FlushReport::default());
            };

            let mut records = Vec::new();
            let mut dropped = 0;
            for id in state.cache.pending(&uid)? {
                match state.subscriptions.iter().find(|r| r.id == id) {
                    Some(record) => records.push(record.clone()),
                    None => {
                        state.cache.mark_synced(&uid, &id)?;
                        dropped += 1;
                    }
                }
            }
            (uid, records, dropped)
        };

        let mut report = FlushReport {
            dropped,
            ..Default::default()
        };

        for record in records {
            let envelope = seal(&record, &uid, Utc::now())?;
            let put = retry("outbox put", &self.flush_retry, || {
                self.remote.put(&uid, &envelope)
            });
            match put.await {
                Ok(()) => {
                    self.mark_synced(&uid, &record.id)?;
                    report.synced += 1;
                }
                Err(e) => {
                    warn!(uid = %uid, id = %record.id, error = %e, "queued write still failing");
                    report.still_pending += 1;
                }
            }
        }

        if report.synced > 0 {
            self.notify(Notification::Synced);
        }
        info!(
            uid = %uid,
            synced = report.synced,
            pending = report.still_pending,
            dropped = report.dropped,
            "outbox flushed"
        );
        Ok(report)
    }

    fn queue_pending(&self, uid: &str, record_id: &str) {
        let queued = self
            .lock()
            .and_then(|state| state.cache.enqueue_pending(uid, record_id));
        if let Err(e) = queued {
            error!(uid, id = record_id, error = %e, "failed to queue pending write");
        }
    }

    fn mark_synced(&self, uid: &str, record_id: &str) -> Result<()> {
        self.lock()?.cache.mark_synced(uid, record_id)
    }
}
