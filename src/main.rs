//! Server entry point: logging, configuration, state wiring, the periodic
//! challenge sweep, and the HTTP listener.

use passkey_rp::config::Config;
use passkey_rp::handlers;
use passkey_rp::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, filterable via RUST_LOG.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_rp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("configuration loaded: {:?}", config);

    let app_state = AppState::new(&config)?;

    // With an expiry policy configured, sweep challenges that were issued
    // but never consumed; without one they live until overwritten.
    if config.challenge_ttl.is_some() {
        let ledger = app_state.ledger.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                let removed = ledger.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "purged expired challenges");
                }
            }
        });
    }

    let app = handlers::router(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
