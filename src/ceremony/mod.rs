//! # Ceremony Orchestrator
//!
//! The registration and authentication flows that tie the credential store,
//! the challenge ledger and the verifier together. The orchestrator owns no
//! state of its own: a ceremony's only trace between options and
//! verification is its ledger entry, and the absence of that entry at verify
//! time is an error, never a silent rejection.
//!
//! ## Submodules
//! - `registration`: creating new passkey credentials
//! - `authentication`: proving possession of an existing one
//!
//! Each flow is two operations. Options generation binds a fresh challenge
//! to `(user id, rp id)` and hands the authenticator-facing payload back
//! verbatim; verification consumes that binding (single-use, even when the
//! verifier says no) before delegating the cryptography to the verifier and
//! committing the result to the store.

pub mod authentication;
pub mod registration;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::config::RelyingPartyConfig;
use crate::context::PasskeyContext;
use crate::error::{AppError, AppResult};
use crate::ledger::ChallengeLedger;
use crate::store::{UserRecord, UserStore};
use crate::verifier::Verifier;

/// Relying-party id used when neither configuration nor request context
/// provides one.
pub const DEFAULT_RP_ID: &str = "localhost";

/// Relying-party name shown to users when nothing else is configured.
pub const DEFAULT_RP_NAME: &str = "Passkey Demo";

static USER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]{3,64}$").expect("user id pattern is valid"));

/// Validate and normalize a raw user identity.
///
/// Trims surrounding whitespace, then requires 3 to 64 characters from
/// `[a-zA-Z0-9._-]`. Fails before any store access happens.
pub fn sanitize_user_id(input: &str) -> AppResult<String> {
    let trimmed = input.trim();
    if USER_ID_PATTERN.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::Validation(
            "user id must be 3-64 characters using only letters, digits, '.', '_' or '-'"
                .to_string(),
        ))
    }
}

/// Result of registration verification, returned to the client as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub verified: bool,
    /// The updated record, present only when verification succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

/// Result of authentication verification.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationOutcome {
    pub verified: bool,
}

/// Coordinates ceremonies across the injected collaborators.
pub struct CeremonyOrchestrator {
    store: Arc<dyn UserStore>,
    ledger: Arc<dyn ChallengeLedger>,
    verifier: Arc<dyn Verifier>,
    relying_party: RelyingPartyConfig,
}

impl CeremonyOrchestrator {
    pub fn new(
        store: Arc<dyn UserStore>,
        ledger: Arc<dyn ChallengeLedger>,
        verifier: Arc<dyn Verifier>,
        relying_party: RelyingPartyConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            verifier,
            relying_party,
        }
    }

    /// Context override, else configured value, else the built-in default.
    fn effective_rp_id(&self, context: &PasskeyContext) -> String {
        context
            .rp_id
            .clone()
            .or_else(|| self.relying_party.rp_id.clone())
            .unwrap_or_else(|| DEFAULT_RP_ID.to_string())
    }

    fn effective_rp_name(&self, context: &PasskeyContext) -> String {
        context
            .rp_name
            .clone()
            .or_else(|| self.relying_party.rp_name.clone())
            .unwrap_or_else(|| DEFAULT_RP_NAME.to_string())
    }

    /// The origin falls back to a development URL built from the effective
    /// rp id and the default server port.
    fn effective_origin(&self, context: &PasskeyContext, rp_id: &str) -> String {
        context
            .origin
            .clone()
            .or_else(|| self.relying_party.origin.clone())
            .unwrap_or_else(|| format!("http://{rp_id}:8080"))
    }
}
