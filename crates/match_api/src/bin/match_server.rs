//! Matchmaking and session lifecycle server.
//!
//! Serves the ticket/session/reward HTTP API over in-memory stores and an
//! in-memory matchmaking backend. The reward catalog is loaded from disk at
//! startup; a load failure is fatal and the listener is never bound.

use clap::Parser;
use match_api::{router, AppState};
use match_service::{
    CatalogHandle, CoordinatorConfig, InMemoryBackend, InMemoryBackendConfig,
    MatchmakingCoordinator, RewardLedger, SessionManager,
};
use match_store::{InMemoryLedger, InMemorySessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "match-server")]
#[command(about = "Matchmaking ticket, session, and reward lifecycle API")]
struct Args {
    /// Port for the HTTP API
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Reward catalog JSON file
    #[arg(long, default_value = "config/rewards_catalog.json")]
    catalog: PathBuf,

    /// Default region merged into tickets without one
    #[arg(long, default_value = "us-west-2")]
    region: String,

    /// Players per match
    #[arg(long, default_value = "2")]
    match_size: usize,

    /// Backend-side ticket timeout in seconds
    #[arg(long, default_value = "120")]
    ticket_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Catalog load failure is the one irrecoverable startup condition:
    // without it, reward semantics would be served degraded.
    let catalog = match CatalogHandle::load_from_file(&args.catalog) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("failed to load reward catalog from {:?}: {}", args.catalog, e);
            std::process::exit(1);
        }
    };

    let ledger = Arc::new(RewardLedger::new(
        catalog,
        Arc::new(InMemoryLedger::new()),
    ));
    let sessions = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        ledger.clone(),
    ));
    let backend = Arc::new(InMemoryBackend::new(InMemoryBackendConfig {
        match_size: args.match_size,
        ticket_timeout: Duration::from_secs(args.ticket_timeout_secs),
        ..Default::default()
    }));
    let coordinator = Arc::new(MatchmakingCoordinator::new(
        backend,
        sessions.clone(),
        CoordinatorConfig {
            default_region: args.region.clone(),
            ..Default::default()
        },
    ));

    let app = router(AppState {
        coordinator,
        sessions,
        ledger,
    });

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!("match server: http://0.0.0.0:{}", args.port);
    tracing::info!("reward catalog: {:?}", args.catalog);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
