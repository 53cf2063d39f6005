//! # Challenge Ledger
//!
//! Short-lived mapping from `(scope, user id, rp id)` to the single
//! outstanding challenge for that key. The ledger owns ceremony-scoped
//! challenge lifetime: an entry is created when options are issued and
//! removed on first lookup, whatever the verifier later decides, so a
//! challenge can never be presented twice.
//!
//! Registration and authentication challenges live in separate namespaces,
//! letting a user keep one of each in flight. Entries are volatile: a
//! process restart clears the ledger and in-flight ceremonies fail with a
//! challenge-not-found error.

pub mod memory;

use std::fmt;

use async_trait::async_trait;

pub use memory::InMemoryChallengeLedger;

/// Which ceremony a challenge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CeremonyScope {
    Registration,
    Authentication,
}

impl CeremonyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CeremonyScope::Registration => "registration",
            CeremonyScope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for CeremonyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger port.
///
/// The in-memory implementation below covers a single process; a
/// distributed deployment swaps in one backed by a shared store without
/// touching the orchestrator.
#[async_trait]
pub trait ChallengeLedger: Send + Sync {
    /// Store the outstanding challenge for the key, overwriting any earlier
    /// one. Only the latest issued challenge per key is ever valid.
    async fn put(&self, scope: CeremonyScope, user_id: &str, rp_id: &str, challenge: String);

    /// Look up and remove the entry. Returns `None` if no challenge is
    /// outstanding for this exact key, including after a previous `take`.
    async fn take(&self, scope: CeremonyScope, user_id: &str, rp_id: &str) -> Option<String>;

    /// Drop entries past their lifetime; returns how many were removed.
    /// A no-op when no expiry policy is configured.
    async fn purge_expired(&self) -> usize;
}
