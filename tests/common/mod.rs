//! Scripted verifier for driving the orchestrator without real
//! cryptography. Options payloads echo the requested fields around a preset
//! challenge; verification calls record what they were asked to check and
//! answer with whatever result the test staged.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use passkey_rp::error::AppResult;
use passkey_rp::verifier::{
    AuthenticationOptionsRequest, AuthenticationVerification, AuthenticatorReference,
    CeremonyOptions, ExpectedCeremony, RegisteredCredential, RegistrationOptionsRequest,
    RegistrationVerification, Verifier,
};

pub struct MockVerifier {
    pub registration_challenge: Mutex<String>,
    pub authentication_challenge: Mutex<String>,
    pub registration_result: Mutex<RegistrationVerification>,
    pub authentication_result: Mutex<AuthenticationVerification>,

    pub registration_requests: Mutex<Vec<RegistrationOptionsRequest>>,
    pub authentication_requests: Mutex<Vec<AuthenticationOptionsRequest>>,
    pub registration_expectations: Mutex<Vec<ExpectedCeremony>>,
    pub authentication_expectations: Mutex<Vec<ExpectedCeremony>>,
    pub authenticator_references: Mutex<Vec<AuthenticatorReference>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self {
            registration_challenge: Mutex::new("registration-challenge".to_string()),
            authentication_challenge: Mutex::new("authentication-challenge".to_string()),
            registration_result: Mutex::new(RegistrationVerification {
                verified: false,
                registration_info: None,
            }),
            authentication_result: Mutex::new(AuthenticationVerification {
                verified: false,
                new_counter: None,
            }),
            registration_requests: Mutex::new(Vec::new()),
            authentication_requests: Mutex::new(Vec::new()),
            registration_expectations: Mutex::new(Vec::new()),
            authentication_expectations: Mutex::new(Vec::new()),
            authenticator_references: Mutex::new(Vec::new()),
        }
    }

    /// Stage a successful registration verification producing the given
    /// credential material.
    pub fn accept_registration(&self, credential_id: &[u8], public_key: &[u8], counter: u32) {
        *self.registration_result.lock() = RegistrationVerification {
            verified: true,
            registration_info: Some(RegisteredCredential {
                credential_id: credential_id.to_vec(),
                public_key: public_key.to_vec(),
                counter,
            }),
        };
    }

    /// Stage a successful authentication verification reporting the given
    /// counter.
    pub fn accept_authentication(&self, new_counter: u32) {
        *self.authentication_result.lock() = AuthenticationVerification {
            verified: true,
            new_counter: Some(new_counter),
        };
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Verifier for MockVerifier {
    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
    ) -> AppResult<CeremonyOptions> {
        let document = json!({
            "challenge": self.registration_challenge.lock().clone(),
            "rp": {"id": request.rp_id, "name": request.rp_name},
            "user": {"name": request.user_name, "displayName": request.user_display_name},
            "timeout": request.timeout_ms,
            "attestation": request.attestation,
            "excludeCredentials": request
                .exclude_credentials
                .iter()
                .map(|id| json!({"id": id, "type": "public-key"}))
                .collect::<Vec<Value>>(),
            "authenticatorSelection": {
                "residentKey": request.resident_key,
                "userVerification": request.user_verification,
            },
        });
        self.registration_requests.lock().push(request);
        CeremonyOptions::from_document(document)
    }

    async fn verify_registration(
        &self,
        _response: &Value,
        expected: &ExpectedCeremony,
    ) -> AppResult<RegistrationVerification> {
        self.registration_expectations.lock().push(expected.clone());
        Ok(self.registration_result.lock().clone())
    }

    async fn authentication_options(
        &self,
        request: AuthenticationOptionsRequest,
    ) -> AppResult<CeremonyOptions> {
        let document = json!({
            "challenge": self.authentication_challenge.lock().clone(),
            "rpId": request.rp_id,
            "timeout": request.timeout_ms,
            "userVerification": request.user_verification,
            "allowCredentials": request
                .allow_credentials
                .iter()
                .map(|credential| json!({"id": credential.credential_id, "type": "public-key"}))
                .collect::<Vec<Value>>(),
        });
        self.authentication_requests.lock().push(request);
        CeremonyOptions::from_document(document)
    }

    async fn verify_authentication(
        &self,
        _response: &Value,
        expected: &ExpectedCeremony,
        authenticator: &AuthenticatorReference,
    ) -> AppResult<AuthenticationVerification> {
        self.authentication_expectations.lock().push(expected.clone());
        self.authenticator_references.lock().push(authenticator.clone());
        Ok(self.authentication_result.lock().clone())
    }
}
