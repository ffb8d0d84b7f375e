//! State owned by the sync engine.
//!
//! [`EngineState`] sits behind an `Arc<Mutex<>>` inside the engine handle.
//! The lock is never held across an await point.

use serde::Serialize;

use subtrack_shared::constants::{user_cache_key, GUEST_CACHE_KEY};
use subtrack_shared::Subscription;

use crate::cache::SubscriptionCache;
use crate::error::Result;
use crate::events::Snapshot;
use crate::reset::ResetArm;
use crate::session::SessionUser;

/// Where the engine is in the identity lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SessionState {
    Guest,
    /// Resumed from the remembered uid, not yet confirmed by the provider.
    Optimistic { uid: String },
    Confirmed(SessionUser),
    SignedOut,
}

impl SessionState {
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::Optimistic { uid } => Some(uid),
            Self::Confirmed(user) => Some(&user.uid),
            Self::Guest | Self::SignedOut => None,
        }
    }

    /// Cache slot backing the in-memory set for this state.
    pub fn cache_key(&self) -> String {
        match self.uid() {
            Some(uid) => user_cache_key(uid),
            None => GUEST_CACHE_KEY.to_string(),
        }
    }
}

pub struct EngineState {
    pub session: SessionState,
    /// Insertion order; sorting happens when a snapshot is built.
    pub subscriptions: Vec<Subscription>,
    /// Bumped on every identity transition; loads issued under an older
    /// epoch are discarded.
    pub epoch: u64,
    pub reset: ResetArm,
    pub cache: SubscriptionCache,
}

impl EngineState {
    pub fn new(cache: SubscriptionCache) -> Self {
        Self {
            session: SessionState::Guest,
            subscriptions: Vec::new(),
            epoch: 0,
            reset: ResetArm::Disarmed,
            cache,
        }
    }

    /// Switch identity. Returns the new epoch.
    pub fn transition(&mut self, session: SessionState) -> u64 {
        tracing::debug!(from = ?self.session, to = ?session, "session transition");
        self.session = session;
        self.epoch += 1;
        self.reset.disarm();
        self.epoch
    }

    /// Show whatever the active slot holds without writing to it.
    pub fn show_cached(&mut self) -> Result<bool> {
        match self.cache.load_set(&self.session.cache_key())? {
            Some(records) => {
                self.subscriptions = records;
                Ok(true)
            }
            None => {
                self.subscriptions.clear();
                Ok(false)
            }
        }
    }

    /// Replace the set wholesale. The slot is written first so a store error
    /// leaves memory untouched.
    pub fn replace_all(&mut self, records: Vec<Subscription>) -> Result<()> {
        self.cache.store_set(&self.session.cache_key(), &records)?;
        self.subscriptions = records;
        Ok(())
    }

    pub fn append(&mut self, record: Subscription) -> Result<()> {
        let mut next = self.subscriptions.clone();
        next.push(record);
        self.replace_all(next)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.subscriptions.iter().any(|s| s.has_name(name))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::build(&self.subscriptions, &self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use subtrack_shared::Frequency;
    use subtrack_store::Database;

    fn state() -> EngineState {
        EngineState::new(SubscriptionCache::new(Database::open_in_memory().unwrap()))
    }

    fn record(name: &str) -> Subscription {
        Subscription {
            id: format!("id-{name}"),
            name: name.into(),
            amount: 4.0,
            frequency: Frequency::Monthly,
            renewal_date: NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_cache_key_follows_session() {
        assert_eq!(SessionState::Guest.cache_key(), "subscriptions");
        assert_eq!(
            SessionState::Optimistic { uid: "alice".into() }.cache_key(),
            "subscriptions_alice"
        );
        assert_eq!(
            SessionState::Confirmed(SessionUser::new("bob")).cache_key(),
            "subscriptions_bob"
        );
    }

    #[test]
    fn test_append_keeps_memory_and_slot_in_step() {
        let mut state = state();
        state.append(record("Walmart+")).unwrap();

        let cached = state.cache.load_set("subscriptions").unwrap().unwrap();
        assert_eq!(cached, state.subscriptions);
        assert!(state.contains_name("walmart+"));
    }

    #[test]
    fn test_transition_bumps_epoch_and_disarms() {
        let mut state = state();
        state.reset.trigger(std::time::Instant::now(), std::time::Duration::from_secs(3));

        let epoch = state.transition(SessionState::Optimistic { uid: "alice".into() });
        assert_eq!(epoch, 1);
        assert_eq!(state.reset, ResetArm::Disarmed);
    }

    #[test]
    fn test_show_cached_switches_slot() {
        let mut state = state();
        state.append(record("Guest Thing")).unwrap();

        state.transition(SessionState::Confirmed(SessionUser::new("alice")));
        assert!(!state.show_cached().unwrap());
        assert!(state.subscriptions.is_empty());

        // Guest slot untouched by the switch.
        assert_eq!(state.cache.load_set("subscriptions").unwrap().unwrap().len(), 1);
    }
}
