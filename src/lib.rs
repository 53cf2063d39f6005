//! # Passkey Relying-Party Server
//!
//! Registers and authenticates users with public-key credentials (passkeys)
//! instead of passwords. The heart of the crate is the ceremony
//! orchestrator: it binds a server-issued challenge to a user identity and
//! relying-party context, hands the challenge out inside an
//! authenticator-facing options payload, and later validates the signed
//! response against exactly that binding, keeping per-credential signature
//! counters to spot cloned authenticators.
//!
//! ## Layout
//! - `store`: durable user/credential records behind a storage port
//! - `ledger`: volatile single-use challenge slots per ceremony scope
//! - `context`: relying-party context resolution from config and headers
//! - `verifier`: the pluggable attestation/assertion capability
//! - `ceremony`: the registration and authentication flows
//! - `handlers`: the axum boundary mapping results and errors to JSON

pub mod ceremony;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod state;
pub mod store;
pub mod verifier;

pub use error::{AppError, AppResult};
