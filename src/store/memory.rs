//! `UserStore` over an in-process map. Same contract as the file-backed
//! store, without durability; used by tests and ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::store::models::{normalize_user_handle, CredentialRecord, UserRecord};
use crate::store::UserStore;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, bypassing handle normalization. Lets tests
    /// stage legacy data the way an old document would hold it.
    pub async fn seed(&self, user: UserRecord) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ensure_user(&self, user_id: &str) -> AppResult<UserRecord> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get_mut(user_id) {
            existing.user_handle = normalize_user_handle(&existing.user_handle);
            return Ok(existing.clone());
        }

        let user = UserRecord::new(user_id);
        users.insert(user_id.to_string(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(user_id).map(|user| {
            user.user_handle = normalize_user_handle(&user.user_handle);
            user.clone()
        }))
    }

    async fn add_or_update_credential(
        &self,
        user_id: &str,
        credential: CredentialRecord,
    ) -> AppResult<UserRecord> {
        let mut users = self.users.write().await;
        let user = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        user.user_handle = normalize_user_handle(&user.user_handle);
        user.upsert_credential(credential);
        Ok(user.clone())
    }
}
