use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cashflow_api::auth::SupabaseAuth;
use cashflow_api::config::{self, Environment};
use cashflow_api::database::{DatabaseManager, PgStore};
use cashflow_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "cashflow-api", version, about = "Wallet, referral commission and cashflow API server")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides CASHFLOW_API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = config::config().clone();

    let default_filter = match config.environment {
        Environment::Development => "info,cashflow_api=debug,tower_http=debug",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting Cashflow API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to configure database pool")?;
    let identity = SupabaseAuth::new(&config.auth).context("failed to configure identity provider")?;
    if config.auth.jwt_secret.is_none() {
        tracing::info!("SUPABASE_JWT_SECRET not set; bearer tokens are verified remotely");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(PgStore::new(pool)), Arc::new(identity));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Cashflow API listening on http://{}", bind_addr);

    axum::serve(listener, cashflow_api::app(state)).await.context("server error")?;
    Ok(())
}
