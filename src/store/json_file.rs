//! # JSON File Store
//!
//! `UserStore` backed by one pretty-printed JSON document on disk, keyed by
//! user id. The whole read-modify-write cycle of every operation runs under
//! a single async mutex: that gives at-most-one-creation for racing
//! `ensure_user` calls and serializes same-user updates, at the cost of
//! briefly serializing unrelated users through the shared document.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::store::models::{normalize_user_handle, CredentialRecord, UserRecord};
use crate::store::UserStore;

type StoreDocument = BTreeMap<String, UserRecord>;

/// File-backed credential store.
pub struct JsonFileStore {
    path: PathBuf,
    /// Guards every read-modify-write cycle against the document.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create the data directory and an empty document if none exists yet.
    async fn ensure_data_file(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }
        fs::write(&self.path, b"{}").await?;
        Ok(())
    }

    /// Callers must hold `lock`.
    async fn read_document(&self) -> AppResult<StoreDocument> {
        self.ensure_data_file().await?;
        let raw = fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(StoreDocument::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Callers must hold `lock`.
    async fn write_document(&self, document: &StoreDocument) -> AppResult<()> {
        self.ensure_data_file().await?;
        let raw = serde_json::to_vec_pretty(document)?;
        fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn ensure_user(&self, user_id: &str) -> AppResult<UserRecord> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;

        if let Some(existing) = document.get_mut(user_id) {
            let normalized = normalize_user_handle(&existing.user_handle);
            if normalized != existing.user_handle {
                existing.user_handle = normalized;
                let healed = existing.clone();
                self.write_document(&document).await?;
                return Ok(healed);
            }
            return Ok(existing.clone());
        }

        let user = UserRecord::new(user_id);
        document.insert(user_id.to_string(), user.clone());
        self.write_document(&document).await?;
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;

        let Some(user) = document.get_mut(user_id) else {
            return Ok(None);
        };

        let normalized = normalize_user_handle(&user.user_handle);
        if normalized != user.user_handle {
            user.user_handle = normalized;
            let healed = user.clone();
            self.write_document(&document).await?;
            return Ok(Some(healed));
        }

        Ok(Some(user.clone()))
    }

    async fn add_or_update_credential(
        &self,
        user_id: &str,
        credential: CredentialRecord,
    ) -> AppResult<UserRecord> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;

        let mut user = document
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserRecord::new(user_id));
        user.user_handle = normalize_user_handle(&user.user_handle);
        user.upsert_credential(credential);

        document.insert(user_id.to_string(), user.clone());
        self.write_document(&document).await?;
        Ok(user)
    }
}
