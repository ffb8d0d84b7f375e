//! Identity provider contract and the user-consent hook used by migration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            avatar_url: None,
        }
    }
}

/// Identity transitions emitted by a [`SessionProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(SessionUser),
    SignedOut,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("no identity provider configured")]
    NotConfigured,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_in(&self) -> Result<SessionUser, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Stream of identity transitions, in the order they happen.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<IdentityEvent>;
}

/// Asks the user whether guest data should be uploaded to their account.
#[async_trait]
pub trait MigrationConsent: Send + Sync {
    async fn confirm_migration(&self, pending: usize) -> bool;
}

/// Consent that always answers the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedConsent(pub bool);

#[async_trait]
impl MigrationConsent for FixedConsent {
    async fn confirm_migration(&self, pending: usize) -> bool {
        tracing::debug!(pending, answer = self.0, "migration consent");
        self.0
    }
}

/// In-process identity provider that signs in a preconfigured account.
pub struct MemorySessionProvider {
    account: Option<SessionUser>,
    current: Mutex<Option<SessionUser>>,
    failing: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<IdentityEvent>>>,
}

impl MemorySessionProvider {
    /// `account` is the user returned by [`SessionProvider::sign_in`];
    /// `None` makes sign-in fail with [`AuthError::NotConfigured`].
    pub fn new(account: Option<SessionUser>) -> Self {
        Self {
            account,
            current: Mutex::new(None),
            failing: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent sign-in/sign-out calls fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    fn broadcast(&self, event: IdentityEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    fn set_current(&self, user: Option<SessionUser>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = user;
        }
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn sign_in(&self) -> Result<SessionUser, AuthError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected("sign-in window closed".into()));
        }
        let user = self.account.clone().ok_or(AuthError::NotConfigured)?;

        self.set_current(Some(user.clone()));
        self.broadcast(IdentityEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("sign-out request failed".into()));
        }

        self.set_current(None);
        self.broadcast(IdentityEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<IdentityEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }
}
