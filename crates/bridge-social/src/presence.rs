use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use bridge_db::Database;
use bridge_types::models::{Account, AccountId, Presence};

use crate::clock::Clock;
use crate::error::SocialError;

/// An account counts as online for this long after its last activity.
pub const ONLINE_WINDOW_SECS: i64 = 5 * 60;

/// Online iff there is a recorded activity strictly less than the window ago.
pub fn is_online_at(last_active_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_active_at {
        Some(last) => now - last < Duration::seconds(ONLINE_WINDOW_SECS),
        None => false,
    }
}

/// Derives presence from `last_active_at`. No online flag is ever stored.
#[derive(Clone)]
pub struct PresenceTracker {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl PresenceTracker {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn is_online(&self, account: &Account) -> bool {
        is_online_at(account.last_active_at, self.clock.now())
    }

    pub fn presence_of(&self, account: &Account) -> Presence {
        Presence {
            user_id: account.id,
            is_online: self.is_online(account),
            last_active_at: account.last_active_at,
        }
    }

    /// Records activity for `user_id` now. Last write wins.
    pub fn touch(&self, user_id: AccountId) -> Result<DateTime<Utc>, SocialError> {
        let now = self.clock.now_micros();
        if !self.db.touch_account(user_id, now)? {
            return Err(SocialError::NotFound("User"));
        }
        trace!("Activity recorded for {}", user_id);
        Ok(now)
    }

    pub fn status(&self, user_id: AccountId) -> Result<Presence, SocialError> {
        let account = self
            .db
            .get_account(user_id)?
            .ok_or(SocialError::NotFound("User"))?;
        Ok(self.presence_of(&account))
    }

    /// One entry per requested id, in request order. Unknown ids read as
    /// offline with no recorded activity.
    pub fn bulk_status(&self, user_ids: &[AccountId]) -> Result<Vec<Presence>, SocialError> {
        let known: HashMap<AccountId, Account> = self
            .db
            .get_accounts(user_ids)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(user_ids
            .iter()
            .map(|id| match known.get(id) {
                Some(account) => self.presence_of(account),
                None => Presence {
                    user_id: *id,
                    is_online: false,
                    last_active_at: None,
                },
            })
            .collect())
    }
}
