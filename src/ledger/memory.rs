//! In-memory ledger implementation: one slot per `(scope, user, rp id)`
//! key behind a process-wide mutex, with an explicit, optional expiry
//! policy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::ledger::{CeremonyScope, ChallengeLedger};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    scope: CeremonyScope,
    user_id: String,
    rp_id: String,
}

struct IssuedChallenge {
    challenge: String,
    issued_at: Instant,
}

/// Process-wide challenge ledger.
///
/// `ttl` of `None` keeps entries until they are consumed or overwritten;
/// with a lifetime set, expired entries read as absent and can be swept by
/// [`ChallengeLedger::purge_expired`].
pub struct InMemoryChallengeLedger {
    ttl: Option<Duration>,
    slots: Mutex<HashMap<SlotKey, IssuedChallenge>>,
}

impl InMemoryChallengeLedger {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn is_expired(&self, entry: &IssuedChallenge) -> bool {
        match self.ttl {
            Some(ttl) => entry.issued_at.elapsed() > ttl,
            None => false,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

#[async_trait]
impl ChallengeLedger for InMemoryChallengeLedger {
    async fn put(&self, scope: CeremonyScope, user_id: &str, rp_id: &str, challenge: String) {
        let key = SlotKey {
            scope,
            user_id: user_id.to_string(),
            rp_id: rp_id.to_string(),
        };
        self.slots.lock().insert(
            key,
            IssuedChallenge {
                challenge,
                issued_at: Instant::now(),
            },
        );
    }

    async fn take(&self, scope: CeremonyScope, user_id: &str, rp_id: &str) -> Option<String> {
        let key = SlotKey {
            scope,
            user_id: user_id.to_string(),
            rp_id: rp_id.to_string(),
        };
        let entry = self.slots.lock().remove(&key)?;
        if self.is_expired(&entry) {
            return None;
        }
        Some(entry.challenge)
    }

    async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, entry| !self.is_expired(entry));
        before - slots.len()
    }
}
