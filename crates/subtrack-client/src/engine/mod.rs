//! The sync engine: owns the in-memory subscription set and moves it between
//! memory, the local cache and the remote store.
//!
//! Every mutation follows the same order: write the cache slot, update
//! memory, publish a [`Snapshot`], and only then talk to the remote store.
//! Remote results that arrive after the identity changed are dropped by
//! comparing the epoch they were issued under.

mod load;
mod migration;
mod reset;
mod save;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use subtrack_shared::Subscription;

use crate::cache::SubscriptionCache;
use crate::config::ClientConfig;
use crate::error::{Result, SyncError};
use crate::events::{emit, Notification, Snapshot};
use crate::remote::RemoteStore;
use crate::retry::RetryConfig;
use crate::session::{IdentityEvent, MigrationConsent, SessionProvider, SessionUser};
use crate::state::{EngineState, SessionState};

pub use load::LoadOutcome;
pub use migration::MigrationOutcome;
pub use reset::ResetStep;
pub use save::{FlushReport, SaveHandle, SaveOutcome};

/// Receiving ends handed to the presentation layer.
pub struct EngineReceivers {
    pub snapshots: watch::Receiver<Snapshot>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

/// Cloneable handle to one engine instance.
#[derive(Clone)]
pub struct SyncEngine {
    state: Arc<Mutex<EngineState>>,
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionProvider>,
    consent: Arc<dyn MigrationConsent>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    notifications: mpsc::UnboundedSender<Notification>,
    reset_window: Duration,
    flush_retry: RetryConfig,
}

impl SyncEngine {
    pub fn new(
        cache: SubscriptionCache,
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionProvider>,
        consent: Arc<dyn MigrationConsent>,
        config: &ClientConfig,
    ) -> (Self, EngineReceivers) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let engine = Self {
            state: Arc::new(Mutex::new(EngineState::new(cache))),
            remote,
            session,
            consent,
            snapshots: Arc::new(snapshot_tx),
            notifications: notify_tx,
            reset_window: config.reset_window,
            flush_retry: config.flush_retry.clone(),
        };

        let receivers = EngineReceivers {
            snapshots: snapshot_rx,
            notifications: notify_rx,
        };

        (engine, receivers)
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn session_state(&self) -> Result<SessionState> {
        Ok(self.lock()?.session.clone())
    }

    /// In-memory set, insertion order.
    pub fn subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.lock()?.subscriptions.clone())
    }

    /// Contents of an arbitrary cache slot.
    pub fn cached_set(&self, key: &str) -> Result<Option<Vec<Subscription>>> {
        self.lock()?.cache.load_set(key)
    }

    /// Record ids of the current user still waiting for a remote write.
    pub fn pending_sync(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        match state.session.uid() {
            Some(uid) => state.cache.pending(uid),
            None => Ok(Vec::new()),
        }
    }

    /// Ask the identity provider to sign in. The resulting identity event
    /// drives the engine through [`SyncEngine::run_session_events`].
    pub async fn sign_in(&self) -> Result<SessionUser> {
        match self.session.sign_in().await {
            Ok(user) => {
                info!(uid = %user.uid, "sign-in accepted");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.notify(Notification::AuthFailed {
                    message: e.to_string(),
                });
                Err(SyncError::Auth(e))
            }
        }
    }

    /// Sign out, forget the remembered identity and fall back to guest data.
    pub async fn sign_out(&self) -> Result<LoadOutcome> {
        if let Err(e) = self.session.sign_out().await {
            warn!(error = %e, "sign-out failed");
            self.notify(Notification::AuthFailed {
                message: e.to_string(),
            });
            return Err(SyncError::Auth(e));
        }

        let outcome = self.enter_guest()?;
        info!("signed out");
        Ok(outcome)
    }

    /// Consume identity events until the provider drops its sender.
    pub async fn run_session_events(&self, mut events: mpsc::UnboundedReceiver<IdentityEvent>) {
        info!("session event loop started");
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_identity(event).await {
                error!(error = %e, "failed to apply identity event");
            }
        }
        info!("session event loop stopped");
    }

    fn enter_guest(&self) -> Result<LoadOutcome> {
        let mut state = self.lock()?;
        state.cache.forget_uid()?;

        if state.session != SessionState::Guest {
            state.transition(SessionState::SignedOut);
            state.subscriptions.clear();
            self.publish(&state);
        }

        state.transition(SessionState::Guest);
        let found = state.show_cached()?;
        self.publish(&state);
        Ok(LoadOutcome::Local { found })
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state.lock().map_err(|_| SyncError::LockPoisoned)
    }

    fn publish(&self, state: &EngineState) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn notify(&self, notification: Notification) {
        emit(&self.notifications, notification);
    }
}
