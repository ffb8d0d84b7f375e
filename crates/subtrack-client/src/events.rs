//! What the engine hands to the presentation layer: render snapshots and
//! transient notifications.

use serde::Serialize;
use tokio::sync::mpsc;

use subtrack_shared::summary::{sorted_by_monthly_cost, total_monthly};
use subtrack_shared::Subscription;

use crate::state::SessionState;

/// Read-only view rendered after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Sorted by monthly cost, most expensive first.
    pub subscriptions: Vec<Subscription>,
    pub total_monthly: f64,
    pub count: usize,
    pub session: SessionState,
}

impl Snapshot {
    pub fn build(records: &[Subscription], session: &SessionState) -> Self {
        Self {
            subscriptions: sorted_by_monthly_cost(records),
            total_monthly: total_monthly(records),
            count: records.len(),
            session: session.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::build(&[], &SessionState::Guest)
    }
}

/// Transient, auto-dismissing user notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
    Synced,
    SyncPending,
    SavedLocally,
    DuplicateName { name: String },
    ResetArmed,
    ResetConfirmed,
    MigrationCompleted { count: usize },
    MigrationFailed { count: usize },
    AuthFailed { message: String },
}

impl Notification {
    pub fn message(&self) -> String {
        match self {
            Self::Synced => "Saved to Cloud".into(),
            Self::SyncPending => "Saved Locally (Sync Pending)".into(),
            Self::SavedLocally => "Saved Locally".into(),
            Self::DuplicateName { .. } => "Already Exists!".into(),
            Self::ResetArmed => "Click Again to Confirm".into(),
            Self::ResetConfirmed => "All subscriptions deleted".into(),
            Self::MigrationCompleted { .. } => "Subscriptions uploaded successfully!".into(),
            Self::MigrationFailed { count } => {
                format!("Upload failed, {count} subscriptions kept on this device")
            }
            Self::AuthFailed { message } => format!("Login failed: {message}"),
        }
    }
}

pub fn emit(tx: &mpsc::UnboundedSender<Notification>, notification: Notification) {
    tracing::debug!(?notification, "notify");
    if tx.send(notification).is_err() {
        tracing::trace!("notification dropped, no listener");
    }
}
