use std::sync::Arc;

use bridge_db::Database;
use bridge_types::models::{Account, AccountId};

use crate::error::SocialError;

/// Read-only view of the accounts owned by the profile subsystem.
#[derive(Clone)]
pub struct Directory {
    db: Arc<Database>,
}

impl Directory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn find(&self, id: AccountId) -> Result<Option<Account>, SocialError> {
        Ok(self.db.get_account(id)?)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, SocialError> {
        Ok(self.db.get_account_by_email(email)?)
    }

    /// Like `find`, but an unknown id is a `NotFound` error.
    pub fn require(&self, id: AccountId) -> Result<Account, SocialError> {
        self.find(id)?.ok_or(SocialError::NotFound("User"))
    }

    /// Accounts for the given ids, ordered by id. Unknown ids are skipped.
    pub fn find_many(&self, ids: &[AccountId]) -> Result<Vec<Account>, SocialError> {
        Ok(self.db.get_accounts(ids)?)
    }
}
