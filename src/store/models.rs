//! # Store Models
//!
//! The records persisted by the credential store, plus the user-handle
//! helpers. These structs serialize camelCase to match the on-disk document
//! and the JSON returned to clients.
//!
//! ## User handles
//! A user handle is the identifier presented to authenticators in place of
//! the human-readable user id. It is a v4 UUID string (36 raw bytes) carried
//! base64url-encoded without padding, generated once per user and never
//! regenerated. Handles written by older deployments may be raw strings;
//! they are re-encoded on read (see [`normalize_user_handle`]).

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One registered authenticator for a user.
///
/// Only public material is stored; private keys never leave the
/// authenticator. `credential_id` and `public_key` are base64url, exactly as
/// they travel on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Authenticator-assigned identifier, unique within a user's credential
    /// set. Lookup key during authentication.
    pub credential_id: String,

    /// Public key material, immutable after creation.
    pub public_key: String,

    /// Authenticator-reported signature counter. Non-decreasing across
    /// successful authentications; a regression indicates a cloned
    /// authenticator.
    pub counter: u32,
}

/// A user and their registered credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Externally supplied identity, the store's primary key.
    pub id: String,

    /// Stable opaque identifier presented to authenticators. One handle per
    /// user, never reused across users.
    pub user_handle: String,

    /// Ordered credential list, unique by `credential_id`.
    pub credentials: Vec<CredentialRecord>,
}

impl UserRecord {
    /// Fresh record with a newly generated handle and no credentials.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            user_handle: new_user_handle(),
            credentials: Vec::new(),
        }
    }

    /// Upsert by credential id: replace the existing entry with the same id,
    /// else append. Last write wins on duplicates.
    pub fn upsert_credential(&mut self, credential: CredentialRecord) {
        self.credentials
            .retain(|existing| existing.credential_id != credential.credential_id);
        self.credentials.push(credential);
    }

    /// Find a credential by its transport-encoded id.
    pub fn find_credential(&self, credential_id: &str) -> Option<&CredentialRecord> {
        self.credentials
            .iter()
            .find(|credential| credential.credential_id == credential_id)
    }
}

/// Generate a new user handle: base64url of the UTF-8 bytes of a v4 UUID
/// string.
pub fn new_user_handle() -> String {
    BASE64_URL_SAFE_NO_PAD.encode(Uuid::new_v4().to_string().as_bytes())
}

/// Normalize a handle read from storage.
///
/// Empty handles get a fresh one. Handles that already decode as base64url
/// pass through unchanged; anything else is legacy raw data and gets its
/// UTF-8 bytes encoded. Idempotent, so healed records stay stable.
pub fn normalize_user_handle(handle: &str) -> String {
    if handle.is_empty() {
        return new_user_handle();
    }

    if BASE64_URL_SAFE_NO_PAD.decode(handle).is_ok() {
        handle.to_string()
    } else {
        BASE64_URL_SAFE_NO_PAD.encode(handle.as_bytes())
    }
}

/// Decode a handle into the raw bytes handed to authenticators.
pub fn decode_user_handle(handle: &str) -> AppResult<Vec<u8>> {
    BASE64_URL_SAFE_NO_PAD
        .decode(handle)
        .map_err(|_| AppError::Internal("stored user handle is not base64url".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_decodes_to_36_bytes() {
        let handle = new_user_handle();
        let raw = decode_user_handle(&handle).unwrap();

        assert_eq!(raw.len(), 36);
        // The raw bytes are a UUID string.
        let uuid_str = String::from_utf8(raw).unwrap();
        assert!(Uuid::parse_str(&uuid_str).is_ok());
    }

    #[test]
    fn normalize_keeps_valid_handles() {
        let handle = new_user_handle();
        assert_eq!(normalize_user_handle(&handle), handle);
    }

    #[test]
    fn normalize_reencodes_legacy_handles() {
        // '!' is outside the base64url alphabet, so this is raw legacy data.
        let legacy = "legacy-handle!";
        let normalized = normalize_user_handle(legacy);

        assert_ne!(normalized, legacy);
        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.decode(&normalized).unwrap(),
            legacy.as_bytes()
        );
        // Idempotent: a healed handle stays as it is.
        assert_eq!(normalize_user_handle(&normalized), normalized);
    }

    #[test]
    fn normalize_fills_empty_handles() {
        let normalized = normalize_user_handle("");
        assert_eq!(decode_user_handle(&normalized).unwrap().len(), 36);
    }

    #[test]
    fn upsert_replaces_by_credential_id() {
        let mut user = UserRecord::new("alice");
        user.upsert_credential(CredentialRecord {
            credential_id: "c1".into(),
            public_key: "pk".into(),
            counter: 0,
        });
        user.upsert_credential(CredentialRecord {
            credential_id: "c1".into(),
            public_key: "pk".into(),
            counter: 7,
        });

        assert_eq!(user.credentials.len(), 1);
        assert_eq!(user.credentials[0].counter, 7);
    }

    #[test]
    fn upsert_appends_new_credentials() {
        let mut user = UserRecord::new("alice");
        user.upsert_credential(CredentialRecord {
            credential_id: "c1".into(),
            public_key: "pk1".into(),
            counter: 0,
        });
        user.upsert_credential(CredentialRecord {
            credential_id: "c2".into(),
            public_key: "pk2".into(),
            counter: 0,
        });

        assert_eq!(user.credentials.len(), 2);
        assert!(user.find_credential("c2").is_some());
    }
}
