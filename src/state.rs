//! # Application State
//!
//! The shared state handed to every request handler: the ceremony
//! orchestrator with its injected collaborators, plus the pieces the
//! boundary needs directly (the configured relying-party identity for
//! context resolution, the ledger for the background sweep).
//!
//! Axum clones the state per request; everything inside is behind `Arc`, so
//! clones are pointer bumps.

use std::sync::Arc;

use anyhow::Result;

use crate::ceremony::CeremonyOrchestrator;
use crate::config::{Config, RelyingPartyConfig};
use crate::ledger::{ChallengeLedger, InMemoryChallengeLedger};
use crate::store::JsonFileStore;
use crate::verifier::WebauthnRsVerifier;

#[derive(Clone)]
pub struct AppState {
    /// The ceremony orchestrator; owns no state, coordinates the rest.
    pub ceremonies: Arc<CeremonyOrchestrator>,

    /// Configured relying-party identity, used by the handlers to resolve
    /// a per-request context.
    pub relying_party: RelyingPartyConfig,

    /// The challenge ledger, exposed for the periodic expiry sweep.
    pub ledger: Arc<dyn ChallengeLedger>,
}

impl AppState {
    /// Wire up the production collaborators: file-backed store, in-process
    /// ledger with the configured expiry policy, webauthn-rs verifier.
    pub fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(&config.store_path));
        let ledger: Arc<dyn ChallengeLedger> =
            Arc::new(InMemoryChallengeLedger::new(config.challenge_ttl));
        let verifier = Arc::new(WebauthnRsVerifier::new());

        let ceremonies = Arc::new(CeremonyOrchestrator::new(
            store,
            ledger.clone(),
            verifier,
            config.relying_party.clone(),
        ));

        Ok(AppState {
            ceremonies,
            relying_party: config.relying_party.clone(),
            ledger,
        })
    }
}
