use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookflow_api::auth::{SupabaseAuth, TokenVerifier};
use bookflow_api::config;
use bookflow_api::database::DatabaseManager;
use bookflow_api::openlibrary::OpenLibraryClient;
use bookflow_api::rate_limit::{RateLimiter, SWEEP_INTERVAL, SWEEP_RETENTION};
use bookflow_api::{build_router, AppState};

/// Bookflow API server
#[derive(Debug, Parser)]
#[command(name = "bookflow-api", version, about)]
struct Args {
    /// Port to listen on (overrides BOOKFLOW_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Log filter, e.g. "bookflow_api=debug" (RUST_LOG still wins)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(filter) = args.log {
        config.log_filter = filter;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("Starting Bookflow API in {:?} mode", config.environment);

    let missing = config.missing_required();
    if !missing.is_empty() {
        bail!("missing required configuration: {}", missing.join(", "));
    }

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let auth = SupabaseAuth::new(&config.supabase).context("invalid Supabase configuration")?;
    let catalog = OpenLibraryClient::new(&config.openlibrary).context("failed to build Open Library client")?;
    let verifier = TokenVerifier::new(&config.supabase.jwt_secret).context("invalid JWT secret")?;

    let rate_limiter = Arc::new(RateLimiter::with_system_clock());
    let mut sweeper = rate_limiter.start_sweeper(SWEEP_INTERVAL, SWEEP_RETENTION);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.server.host, config.server.port))?;

    let state = AppState {
        config: Arc::new(config),
        db: db.clone(),
        auth: Arc::new(auth),
        catalog: Arc::new(catalog),
        rate_limiter,
        verifier,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Bookflow API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.stop();
    db.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
