//! `marketplace-api serve` runs the HTTP server; `marketplace-api seed` loads
//! the bundled fixtures once.

use clap::{Parser, Subcommand};
use marketplace_api::{app, seed, AppState, Config, Fixtures, PgStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "marketplace-api", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API (default)
    Serve,
    /// Insert the bundled users, orders and offers in one transaction
    Seed,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketplace_api=info,tower_http=info")),
        )
        .init();

    let store = PgStore::connect(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Seed => {
            let report = seed(&store, Fixtures::bundled()?).await?;
            tracing::info!(?report, "seed complete");
        }
        Command::Serve => {
            let bind_addr = config.bind_addr;
            let state = AppState::new(Arc::new(store), config);
            let listener = TcpListener::bind(bind_addr).await?;
            tracing::info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, app(state)).await?;
        }
    }
    Ok(())
}
