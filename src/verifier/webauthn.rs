//! # webauthn-rs Adapter
//!
//! Bridges the verifier port onto `webauthn-rs`. The library keeps its own
//! server-side ceremony state between start and finish; this adapter caches
//! that state keyed by the issued challenge string, so verification can be
//! driven by the challenge the ledger hands back. The ledger remains the
//! only authority on whether a challenge is still acceptable; an entry
//! here is inert until the orchestrator presents its challenge.
//!
//! Credential public-key material produced by this adapter is the serialized
//! passkey, treated as an opaque blob by the rest of the system and
//! deserialized back when building authentication options.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::prelude::*;
use parking_lot::Mutex;
use serde_json::Value;
use webauthn_rs::prelude::{
    CredentialID, Passkey, PasskeyAuthentication, PasskeyRegistration, PublicKeyCredential,
    RegisterPublicKeyCredential, Url, Uuid, Webauthn, WebauthnBuilder,
};

use crate::error::{AppError, AppResult};
use crate::verifier::{
    AuthenticationOptionsRequest, AuthenticationVerification, AuthenticatorReference,
    CeremonyOptions, ExpectedCeremony, RegisteredCredential, RegistrationOptionsRequest,
    RegistrationVerification, Verifier,
};

/// Production verifier backed by `webauthn-rs`.
///
/// Option knobs the port fixes (attestation "none", resident-key and
/// user-verification preferences) match the library's passkey policy, which
/// it applies internally.
#[derive(Default)]
pub struct WebauthnRsVerifier {
    registrations: Mutex<HashMap<String, PasskeyRegistration>>,
    authentications: Mutex<HashMap<String, PasskeyAuthentication>>,
}

impl WebauthnRsVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build a library instance for one call. Construction is cheap, and doing
/// it per call is what lets the rp id and origin vary with the request
/// context.
fn build_backend(rp_id: &str, rp_name: Option<&str>, origin: &str) -> AppResult<Webauthn> {
    let origin = Url::parse(origin)
        .map_err(|_| AppError::Verifier(format!("'{origin}' is not a valid origin URL")))?;
    let mut builder = WebauthnBuilder::new(rp_id, &origin)?;
    if let Some(name) = rp_name {
        builder = builder.rp_name(name);
    }
    Ok(builder.build()?)
}

/// The library wants a UUID for the authenticator-facing user id. Handles
/// generated by this server decode to a UUID string; anything else (legacy
/// raw handles) maps to a stable v5 UUID of the handle bytes.
fn handle_to_uuid(handle: &[u8]) -> Uuid {
    std::str::from_utf8(handle)
        .ok()
        .and_then(|text| Uuid::parse_str(text).ok())
        .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, handle))
}

#[async_trait]
impl Verifier for WebauthnRsVerifier {
    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
    ) -> AppResult<CeremonyOptions> {
        let backend = build_backend(&request.rp_id, Some(&request.rp_name), &request.origin)?;
        let user_id = handle_to_uuid(&request.user_handle);

        let exclude: Vec<CredentialID> = request
            .exclude_credentials
            .iter()
            .map(|id| BASE64_URL_SAFE_NO_PAD.decode(id).map(CredentialID::from))
            .collect::<Result<_, _>>()
            .map_err(|_| {
                AppError::Verifier("exclusion list contains a non-base64url credential id".into())
            })?;
        let exclude = (!exclude.is_empty()).then_some(exclude);

        let (creation_options, state) = backend.start_passkey_registration(
            user_id,
            &request.user_name,
            &request.user_display_name,
            exclude,
        )?;

        let options = CeremonyOptions::from_document(serde_json::to_value(&creation_options)?)?;
        self.registrations
            .lock()
            .insert(options.challenge().to_string(), state);
        Ok(options)
    }

    async fn verify_registration(
        &self,
        response: &Value,
        expected: &ExpectedCeremony,
    ) -> AppResult<RegistrationVerification> {
        let state = self
            .registrations
            .lock()
            .remove(&expected.challenge)
            .ok_or_else(|| {
                AppError::Verifier("no registration ceremony for this challenge".to_string())
            })?;

        let backend = build_backend(&expected.rp_id, None, &expected.origin)?;
        let credential: RegisterPublicKeyCredential = serde_json::from_value(response.clone())?;

        match backend.finish_passkey_registration(&credential, &state) {
            Ok(passkey) => {
                // The whole passkey is the stored key material; the initial
                // counter for a fresh credential is zero.
                let public_key = serde_json::to_vec(&passkey)?;
                Ok(RegistrationVerification {
                    verified: true,
                    registration_info: Some(RegisteredCredential {
                        credential_id: passkey.cred_id().as_ref().to_vec(),
                        public_key,
                        counter: 0,
                    }),
                })
            }
            Err(error) => {
                tracing::debug!(error = %error, "attestation rejected");
                Ok(RegistrationVerification {
                    verified: false,
                    registration_info: None,
                })
            }
        }
    }

    async fn authentication_options(
        &self,
        request: AuthenticationOptionsRequest,
    ) -> AppResult<CeremonyOptions> {
        let passkeys: Vec<Passkey> = request
            .allow_credentials
            .iter()
            .map(|record| {
                let raw = BASE64_URL_SAFE_NO_PAD.decode(&record.public_key).map_err(|_| {
                    AppError::Verifier("stored public key is not base64url".to_string())
                })?;
                serde_json::from_slice(&raw).map_err(|_| {
                    AppError::Verifier("stored credential is not usable by this backend".to_string())
                })
            })
            .collect::<AppResult<_>>()?;

        let backend = build_backend(&request.rp_id, None, &request.origin)?;
        let (request_options, state) = backend.start_passkey_authentication(&passkeys)?;

        let options = CeremonyOptions::from_document(serde_json::to_value(&request_options)?)?;
        self.authentications
            .lock()
            .insert(options.challenge().to_string(), state);
        Ok(options)
    }

    async fn verify_authentication(
        &self,
        response: &Value,
        expected: &ExpectedCeremony,
        authenticator: &AuthenticatorReference,
    ) -> AppResult<AuthenticationVerification> {
        let state = self
            .authentications
            .lock()
            .remove(&expected.challenge)
            .ok_or_else(|| {
                AppError::Verifier("no authentication ceremony for this challenge".to_string())
            })?;

        let backend = build_backend(&expected.rp_id, None, &expected.origin)?;
        let credential: PublicKeyCredential = serde_json::from_value(response.clone())?;

        match backend.finish_passkey_authentication(&credential, &state) {
            Ok(result) => {
                if result.cred_id().as_ref() != authenticator.credential_id.as_slice() {
                    return Err(AppError::Verifier(
                        "assertion credential does not match the reference credential".to_string(),
                    ));
                }
                Ok(AuthenticationVerification {
                    verified: true,
                    new_counter: Some(result.counter()),
                })
            }
            Err(error) => {
                tracing::debug!(error = %error, "assertion rejected");
                Ok(AuthenticationVerification {
                    verified: false,
                    new_counter: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_generated_handles_round_trip_to_uuid() {
        let uuid = Uuid::new_v4();
        let handle = uuid.to_string().into_bytes();
        assert_eq!(handle_to_uuid(&handle), uuid);
    }

    #[test]
    fn legacy_handles_map_to_a_stable_uuid() {
        let first = handle_to_uuid(b"not-a-uuid");
        let second = handle_to_uuid(b"not-a-uuid");
        assert_eq!(first, second);
        assert_ne!(first, handle_to_uuid(b"a-different-handle"));
    }
}
