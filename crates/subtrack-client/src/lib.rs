//! # subtrack-client
//!
//! Local-first sync engine for SubTrack. Subscriptions are shown from the
//! local cache first, written to it before any network call, and mirrored
//! to a per-user encrypted remote collection when someone is signed in.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod remote;
pub mod reset;
pub mod retry;
pub mod session;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use cache::SubscriptionCache;
pub use config::ClientConfig;
pub use engine::{
    EngineReceivers, FlushReport, LoadOutcome, MigrationOutcome, ResetStep, SaveHandle,
    SaveOutcome, SyncEngine,
};
pub use error::{Result, SyncError};
pub use events::{Notification, Snapshot};
pub use remote::{MemoryRemoteStore, OfflineRemoteStore, RemoteError, RemoteStore};
pub use session::{
    AuthError, FixedConsent, IdentityEvent, MemorySessionProvider, MigrationConsent,
    SessionProvider, SessionUser,
};
pub use state::SessionState;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Calling this twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("tracing initialised");
    }
}
