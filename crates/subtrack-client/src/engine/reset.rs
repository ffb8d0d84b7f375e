use std::time::Instant;

use tracing::{info, warn};

use subtrack_shared::constants::{user_cache_key, GUEST_CACHE_KEY};

use super::SyncEngine;
use crate::error::Result;
use crate::events::Notification;
use crate::reset::ResetTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    /// First trigger; call again before `deadline` to confirm.
    Armed { deadline: Instant },
    Completed { removed: usize },
}

impl SyncEngine {
    /// Press the reset control once.
    ///
    /// On confirmation a signed-in user's remote documents are deleted in
    /// one batch first; if that fails nothing local is touched.
    pub async fn request_reset(&self, now: Instant) -> Result<ResetStep> {
        let (uid, ids) = {
            let mut state = self.lock()?;
            if let ResetTrigger::Armed { deadline } = state.reset.trigger(now, self.reset_window) {
                info!("reset armed");
                self.notify(Notification::ResetArmed);
                return Ok(ResetStep::Armed { deadline });
            }

            let ids: Vec<String> = state.subscriptions.iter().map(|r| r.id.clone()).collect();
            (state.session.uid().map(str::to_owned), ids)
        };

        if let Some(uid) = uid.as_deref() {
            if !ids.is_empty() {
                if let Err(e) = self.remote.delete_all(uid, &ids).await {
                    warn!(
                        uid,
                        count = ids.len(),
                        error = %e,
                        "remote reset failed, keeping local data"
                    );
                    return Err(e.into());
                }
            }
        }

        let key = match uid.as_deref() {
            Some(uid) => user_cache_key(uid),
            None => GUEST_CACHE_KEY.to_string(),
        };

        {
            let mut state = self.lock()?;
            state.cache.clear(&key)?;
            if let Some(uid) = uid.as_deref() {
                state.cache.clear_pending(uid)?;
            }
            if state.session.cache_key() == key {
                state.subscriptions.clear();
                self.publish(&state);
            }
        }

        info!(removed = ids.len(), "all subscriptions deleted");
        self.notify(Notification::ResetConfirmed);
        Ok(ResetStep::Completed { removed: ids.len() })
    }

    pub fn cancel_reset(&self) -> Result<()> {
        self.lock()?.reset.disarm();
        Ok(())
    }

    pub fn reset_armed(&self, now: Instant) -> Result<bool> {
        Ok(self.lock()?.reset.is_armed(now))
    }
}
