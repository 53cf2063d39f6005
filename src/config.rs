//! # Configuration Management
//!
//! Loads configuration from environment variables, 12-factor style.
//!
//! ## Environment Variables
//! - `HOST`: server bind address (default: 127.0.0.1)
//! - `PORT`: server port (default: 8080)
//! - `STORE_PATH`: path of the credential store document (default: data/webauthn.json)
//! - `RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `RP_NAME`: human-readable name for your service
//! - `RP_ORIGIN`: WebAuthn Relying Party origin (full URL)
//! - `CHALLENGE_TTL_SECS`: lifetime of an unconsumed challenge; unset means
//!   challenges live until overwritten or process restart

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Relying-party identity, as configured.
///
/// All fields are optional: a request-level context or the built-in defaults
/// fill the gaps (see the context resolver and the orchestrator). Keeping the
/// configured values separate from the resolved ones is what lets a single
/// process answer for whatever host it is reached on during development.
#[derive(Debug, Clone, Default)]
pub struct RelyingPartyConfig {
    /// Relying Party ID. For production, the domain without protocol or
    /// port: "example.com". Leave unset to derive it per request.
    pub rp_id: Option<String>,

    /// Name shown to users while creating a passkey.
    pub rp_name: Option<String>,

    /// Full URL the app is accessible at, including protocol.
    pub origin: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to.
    pub host: String,

    /// Server port number.
    pub port: u16,

    /// Where the credential store document lives.
    pub store_path: PathBuf,

    /// Configured relying-party identity, handed to the orchestrator at
    /// construction time.
    pub relying_party: RelyingPartyConfig,

    /// Explicit challenge-expiry policy. `None` keeps issued challenges
    /// until they are consumed or overwritten.
    pub challenge_ttl: Option<Duration>,
}

impl Config {
    /// Load configuration from the environment (and a `.env` file if one is
    /// present), falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            store_path: env::var("STORE_PATH")
                .unwrap_or_else(|_| "data/webauthn.json".to_string())
                .into(),

            relying_party: RelyingPartyConfig {
                rp_id: env::var("RP_ID").ok(),
                rp_name: env::var("RP_NAME").ok(),
                origin: env::var("RP_ORIGIN").ok(),
            },

            challenge_ttl: match env::var("CHALLENGE_TTL_SECS") {
                Ok(secs) => Some(Duration::from_secs(secs.parse()?)),
                Err(_) => None,
            },
        })
    }

    /// Socket address to bind the server to, e.g. "127.0.0.1:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
