//! # Authentication Ceremony
//!
//! Two-step flow for proving possession of a registered passkey. Options
//! generation short-circuits for users without credentials before any
//! challenge is issued; verification consumes the challenge first, then
//! resolves the user and the referenced credential, and finally persists the
//! authenticator-reported counter.

use base64::prelude::*;
use serde_json::Value;

use crate::ceremony::{sanitize_user_id, AuthenticationOutcome, CeremonyOrchestrator};
use crate::context::PasskeyContext;
use crate::error::{AppError, AppResult};
use crate::ledger::CeremonyScope;
use crate::store::CredentialRecord;
use crate::verifier::{
    AuthenticationOptionsRequest, AuthenticatorReference, ExpectedCeremony, CEREMONY_TIMEOUT_MS,
    PREFERENCE_PREFERRED,
};

impl CeremonyOrchestrator {
    /// Generate authentication options for a user with at least one
    /// registered credential.
    ///
    /// All of the user's credentials go on the allow-list. A user that does
    /// not exist or has no credentials fails here, with no ledger entry
    /// created.
    pub async fn authentication_options(
        &self,
        user_id: &str,
        context: &PasskeyContext,
    ) -> AppResult<Value> {
        let user_id = sanitize_user_id(user_id)?;

        let user = match self.store.get_user(&user_id).await? {
            Some(user) if !user.credentials.is_empty() => user,
            _ => {
                tracing::error!(user_id = %user_id, "no passkey registered");
                return Err(AppError::NoCredentialsRegistered(user_id));
            }
        };

        let rp_id = self.effective_rp_id(context);
        let origin = self.effective_origin(context, &rp_id);
        let allow_count = user.credentials.len();

        let options = self
            .verifier
            .authentication_options(AuthenticationOptionsRequest {
                rp_id: rp_id.clone(),
                origin,
                timeout_ms: CEREMONY_TIMEOUT_MS,
                user_verification: PREFERENCE_PREFERRED.to_string(),
                allow_credentials: user.credentials,
            })
            .await?;

        self.ledger
            .put(
                CeremonyScope::Authentication,
                &user_id,
                &rp_id,
                options.challenge().to_string(),
            )
            .await;

        tracing::info!(
            user_id = %user_id,
            rp_id = %rp_id,
            allow_count,
            "issued authentication options"
        );
        Ok(options.into_document())
    }

    /// Verify an assertion response against the outstanding authentication
    /// challenge.
    ///
    /// Ordering matters here: the challenge is consumed first (so a replay
    /// is dead even if later steps fail), then the user and the credential
    /// named by the response are resolved, each with its own error kind. On
    /// success the stored credential's counter is replaced by the value the
    /// verifier reports.
    pub async fn verify_authentication(
        &self,
        user_id: &str,
        response: &Value,
        context: &PasskeyContext,
    ) -> AppResult<AuthenticationOutcome> {
        let user_id = sanitize_user_id(user_id)?;
        let rp_id = self.effective_rp_id(context);
        let origin = self.effective_origin(context, &rp_id);

        let Some(challenge) = self
            .ledger
            .take(CeremonyScope::Authentication, &user_id, &rp_id)
            .await
        else {
            tracing::error!(user_id = %user_id, rp_id = %rp_id, "authentication challenge not found");
            return Err(AppError::ChallengeNotFound(CeremonyScope::Authentication));
        };

        let Some(user) = self.store.get_user(&user_id).await? else {
            tracing::error!(user_id = %user_id, "user not found");
            return Err(AppError::UserNotFound(user_id));
        };

        let response_credential_id = response
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Validation("authentication response is missing a credential id".to_string())
            })?;

        let Some(credential) = user.find_credential(response_credential_id).cloned() else {
            tracing::error!(
                user_id = %user_id,
                credential_id = %response_credential_id,
                "no matching passkey"
            );
            return Err(AppError::CredentialMismatch(response_credential_id.to_string()));
        };

        let authenticator = AuthenticatorReference {
            credential_id: BASE64_URL_SAFE_NO_PAD
                .decode(&credential.credential_id)
                .map_err(|_| AppError::Internal("stored credential id is not base64url".to_string()))?,
            public_key: BASE64_URL_SAFE_NO_PAD
                .decode(&credential.public_key)
                .map_err(|_| AppError::Internal("stored public key is not base64url".to_string()))?,
            counter: credential.counter,
        };

        let verification = self
            .verifier
            .verify_authentication(
                response,
                &ExpectedCeremony {
                    challenge,
                    origin,
                    rp_id: rp_id.clone(),
                    require_user_verification: true,
                },
                &authenticator,
            )
            .await?;

        let Some(new_counter) = verification.new_counter.filter(|_| verification.verified) else {
            tracing::error!(user_id = %user_id, rp_id = %rp_id, "authentication verification failed");
            return Ok(AuthenticationOutcome { verified: false });
        };

        self.store
            .add_or_update_credential(
                &user_id,
                CredentialRecord {
                    counter: new_counter,
                    ..credential.clone()
                },
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            rp_id = %rp_id,
            credential_id = %credential.credential_id,
            counter = new_counter,
            "authentication verified"
        );
        Ok(AuthenticationOutcome { verified: true })
    }
}
