//! # Registration Ceremony
//!
//! Two-step flow for creating a new passkey credential.
//!
//! 1. **Options**: ensure the user record exists, ask the verifier for an
//!    options payload (which mints the challenge), record the challenge in
//!    the registration namespace of the ledger.
//! 2. **Verify**: consume the recorded challenge, hand the attestation
//!    response and expectations to the verifier, and on success persist the
//!    new credential.

use base64::prelude::*;
use serde_json::Value;

use crate::ceremony::{sanitize_user_id, CeremonyOrchestrator, RegistrationOutcome};
use crate::context::PasskeyContext;
use crate::error::{AppError, AppResult};
use crate::ledger::CeremonyScope;
use crate::store::models::decode_user_handle;
use crate::store::CredentialRecord;
use crate::verifier::{
    ExpectedCeremony, RegistrationOptionsRequest, ATTESTATION_NONE, CEREMONY_TIMEOUT_MS,
    PREFERENCE_PREFERRED,
};

impl CeremonyOrchestrator {
    /// Generate registration options for a user, creating the user record if
    /// this is their first ceremony.
    ///
    /// The returned payload goes to the client verbatim; its challenge is
    /// bound to `(user id, rp id)` in the ledger until verified or
    /// overwritten. Credentials the user already registered are placed on
    /// the exclusion list so authenticators refuse to re-register.
    pub async fn registration_options(
        &self,
        user_id: &str,
        context: &PasskeyContext,
    ) -> AppResult<Value> {
        let user_id = sanitize_user_id(user_id)?;
        let user = self.store.ensure_user(&user_id).await?;

        let rp_id = self.effective_rp_id(context);
        let rp_name = self.effective_rp_name(context);
        let origin = self.effective_origin(context, &rp_id);

        let user_handle = decode_user_handle(&user.user_handle)?;
        let exclude_credentials: Vec<String> = user
            .credentials
            .iter()
            .map(|credential| credential.credential_id.clone())
            .collect();
        let exclude_count = exclude_credentials.len();

        let options = self
            .verifier
            .registration_options(RegistrationOptionsRequest {
                rp_id: rp_id.clone(),
                rp_name,
                origin,
                user_name: user_id.clone(),
                user_display_name: user_id.clone(),
                user_handle,
                timeout_ms: CEREMONY_TIMEOUT_MS,
                attestation: ATTESTATION_NONE.to_string(),
                exclude_credentials,
                resident_key: PREFERENCE_PREFERRED.to_string(),
                user_verification: PREFERENCE_PREFERRED.to_string(),
            })
            .await?;

        self.ledger
            .put(
                CeremonyScope::Registration,
                &user_id,
                &rp_id,
                options.challenge().to_string(),
            )
            .await;

        tracing::info!(
            user_id = %user_id,
            rp_id = %rp_id,
            exclude_count,
            challenge = %options.challenge(),
            "issued registration options"
        );
        Ok(options.into_document())
    }

    /// Verify an attestation response against the outstanding registration
    /// challenge.
    ///
    /// The challenge is consumed before the verifier runs: a response that
    /// fails verification still spends its challenge and the client must
    /// restart from options. A cryptographic rejection is reported as
    /// `{verified: false}` without touching the store.
    pub async fn verify_registration(
        &self,
        user_id: &str,
        response: &Value,
        context: &PasskeyContext,
    ) -> AppResult<RegistrationOutcome> {
        let user_id = sanitize_user_id(user_id)?;
        let rp_id = self.effective_rp_id(context);
        let origin = self.effective_origin(context, &rp_id);

        let Some(challenge) = self
            .ledger
            .take(CeremonyScope::Registration, &user_id, &rp_id)
            .await
        else {
            tracing::error!(user_id = %user_id, rp_id = %rp_id, "registration challenge not found");
            return Err(AppError::ChallengeNotFound(CeremonyScope::Registration));
        };

        let verification = self
            .verifier
            .verify_registration(
                response,
                &ExpectedCeremony {
                    challenge,
                    origin,
                    rp_id: rp_id.clone(),
                    require_user_verification: true,
                },
            )
            .await?;

        if !verification.verified {
            tracing::error!(user_id = %user_id, rp_id = %rp_id, "registration verification failed");
            return Ok(RegistrationOutcome {
                verified: false,
                user: None,
            });
        }
        let Some(info) = verification.registration_info else {
            tracing::error!(user_id = %user_id, rp_id = %rp_id, "verifier returned no registration detail");
            return Ok(RegistrationOutcome {
                verified: false,
                user: None,
            });
        };

        let credential = CredentialRecord {
            credential_id: BASE64_URL_SAFE_NO_PAD.encode(&info.credential_id),
            public_key: BASE64_URL_SAFE_NO_PAD.encode(&info.public_key),
            counter: info.counter,
        };
        let credential_id = credential.credential_id.clone();
        let user = self.store.add_or_update_credential(&user_id, credential).await?;

        tracing::info!(
            user_id = %user_id,
            rp_id = %rp_id,
            credential_id = %credential_id,
            "registration verified"
        );
        Ok(RegistrationOutcome {
            verified: true,
            user: Some(user),
        })
    }
}
