//! Account lookups.

use hub_common::AppResult;
use hub_db::{
    entities::user::{self, UserRole},
    repositories::DynUserStore,
};

/// Read access to accounts.
#[derive(Clone)]
pub struct UserService {
    user_store: DynUserStore,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_store: DynUserStore) -> Self {
        Self { user_store }
    }

    /// Every volunteer account, newest first.
    pub async fn list_volunteers(&self) -> AppResult<Vec<user::Model>> {
        self.user_store.find_by_role(UserRole::Volunteer).await
    }
}
