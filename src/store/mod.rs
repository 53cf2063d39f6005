//! # Credential Store
//!
//! Durable mapping from user identity to user record. The store owns
//! `UserRecord` persistence exclusively; ceremony state lives in the
//! challenge ledger instead.
//!
//! The storage port keeps the document format and locking behind a trait so
//! the file-backed store can be swapped for a database without touching the
//! orchestrator.

pub mod json_file;
pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::error::AppResult;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use models::{CredentialRecord, UserRecord};

/// Storage port for user records.
///
/// Mutating operations are read-modify-write against a single logical
/// document: calls for the same user serialize (last write wins, no loss of
/// unrelated fields) and concurrent calls for different users must not
/// corrupt each other.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Return the existing record, or atomically create one with a freshly
    /// generated user handle and an empty credential list. At most one
    /// record is ever created for an id, however many callers race.
    async fn ensure_user(&self, user_id: &str) -> AppResult<UserRecord>;

    /// Pure lookup; never creates. Handles read from storage are normalized
    /// and the corrected value is persisted back before being returned.
    async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>>;

    /// Upsert a credential by id within the user's list, creating the user
    /// first (same handle-generation rule as [`UserStore::ensure_user`]) if
    /// absent. The full updated record is persisted before returning.
    async fn add_or_update_credential(
        &self,
        user_id: &str,
        credential: CredentialRecord,
    ) -> AppResult<UserRecord>;
}
