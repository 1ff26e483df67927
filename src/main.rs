//! Ordergate server binary.

use std::sync::Arc;

use clap::Parser;

use ordergate::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use ordergate::stripe::StripeClient;
use ordergate::{app_router, AppConfig, AppState, Error};

/// Ordergate checkout server
#[derive(Parser, Debug)]
#[command(name = "ordergate")]
#[command(version)]
#[command(about = "Hosted-checkout order gateway")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run with an in-memory order store instead of Postgres (local dev)
    #[arg(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    let base_url = format!("http://{}:{}", args.host, args.port);
    let config = AppConfig::from_env(&base_url)?;

    let store: Arc<dyn OrderStore> = if args.memory_store {
        tracing::warn!("using in-memory order store; orders will not survive restarts");
        Arc::new(InMemoryOrderStore::new())
    } else {
        let database_url = config.database_url.clone().ok_or_else(|| {
            Error::Config("DATABASE_URL is required unless --memory-store is set".to_string())
        })?;
        let store = PgOrderStore::connect(&database_url).await?;
        tracing::info!("connected to Postgres");
        Arc::new(store)
    };

    let processor = Arc::new(StripeClient::new(&config)?);
    let state = Arc::new(AppState::new(config, store, processor));
    let app = app_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("ordergate listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
