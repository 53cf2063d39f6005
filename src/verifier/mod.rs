//! # Verifier Port
//!
//! The cryptographic attestation/assertion machinery is consumed as an
//! opaque capability behind this trait. The orchestrator supplies explicit
//! expectations (challenge, origin, rp id, user-verification requirement)
//! and, for authentication, the reference credential; the verifier answers
//! with an options payload or a verification result. Challenge bookkeeping
//! never happens here: the ledger decides which challenge is acceptable.
//!
//! [`webauthn::WebauthnRsVerifier`] adapts this port onto `webauthn-rs` for
//! production use; tests drive the orchestrator with a scripted
//! implementation.

pub mod webauthn;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::store::CredentialRecord;

pub use webauthn::WebauthnRsVerifier;

/// Ceremony timeout embedded in issued options, advisory to the
/// authenticator.
pub const CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// Preference strings carried in options payloads.
pub const ATTESTATION_NONE: &str = "none";
pub const PREFERENCE_PREFERRED: &str = "preferred";

/// An authenticator-facing options payload.
///
/// The document is returned to the client verbatim; the challenge is lifted
/// out so the orchestrator can record it in the ledger. Both flat documents
/// (`challenge` at top level) and webauthn-rs-shaped ones (nested under
/// `publicKey`) are accepted.
#[derive(Debug, Clone)]
pub struct CeremonyOptions {
    challenge: String,
    document: Value,
}

impl CeremonyOptions {
    pub fn from_document(document: Value) -> AppResult<Self> {
        let challenge = document
            .get("challenge")
            .and_then(Value::as_str)
            .or_else(|| {
                document
                    .get("publicKey")
                    .and_then(|options| options.get("challenge"))
                    .and_then(Value::as_str)
            })
            .ok_or_else(|| {
                AppError::Verifier("options payload is missing a challenge".to_string())
            })?
            .to_string();

        Ok(Self { challenge, document })
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Inputs for building registration options.
#[derive(Debug, Clone)]
pub struct RegistrationOptionsRequest {
    pub rp_id: String,
    pub rp_name: String,
    pub origin: String,
    pub user_name: String,
    pub user_display_name: String,
    /// Raw user handle bytes, as decoded from storage.
    pub user_handle: Vec<u8>,
    pub timeout_ms: u32,
    pub attestation: String,
    /// Transport-encoded ids of credentials the authenticator must not
    /// re-register.
    pub exclude_credentials: Vec<String>,
    pub resident_key: String,
    pub user_verification: String,
}

/// Inputs for building authentication options.
///
/// Carries the full credential records rather than bare ids: the allow-list
/// needs only the ids, but backends that reconstruct their own credential
/// state (webauthn-rs does) need the key material too.
#[derive(Debug, Clone)]
pub struct AuthenticationOptionsRequest {
    pub rp_id: String,
    pub origin: String,
    pub timeout_ms: u32,
    pub user_verification: String,
    pub allow_credentials: Vec<CredentialRecord>,
}

/// What a response is checked against.
#[derive(Debug, Clone)]
pub struct ExpectedCeremony {
    pub challenge: String,
    pub origin: String,
    pub rp_id: String,
    pub require_user_verification: bool,
}

/// The stored credential an assertion must match.
#[derive(Debug, Clone)]
pub struct AuthenticatorReference {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub counter: u32,
}

/// Outcome of registration verification.
#[derive(Debug, Clone)]
pub struct RegistrationVerification {
    pub verified: bool,
    /// Present only on success.
    pub registration_info: Option<RegisteredCredential>,
}

/// New credential material extracted from a verified attestation.
#[derive(Debug, Clone)]
pub struct RegisteredCredential {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub counter: u32,
}

/// Outcome of authentication verification.
#[derive(Debug, Clone)]
pub struct AuthenticationVerification {
    pub verified: bool,
    /// Counter reported by the authenticator for this assertion; present
    /// only on success.
    pub new_counter: Option<u32>,
}

/// The verifier capability.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Build a registration options payload containing a fresh challenge.
    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
    ) -> AppResult<CeremonyOptions>;

    /// Validate an attestation response against the expected ceremony.
    async fn verify_registration(
        &self,
        response: &Value,
        expected: &ExpectedCeremony,
    ) -> AppResult<RegistrationVerification>;

    /// Build an authentication options payload containing a fresh challenge.
    async fn authentication_options(
        &self,
        request: AuthenticationOptionsRequest,
    ) -> AppResult<CeremonyOptions>;

    /// Validate an assertion response against the expected ceremony and the
    /// reference credential.
    async fn verify_authentication(
        &self,
        response: &Value,
        expected: &ExpectedCeremony,
        authenticator: &AuthenticatorReference,
    ) -> AppResult<AuthenticationVerification>;
}
