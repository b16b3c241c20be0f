use std::sync::Arc;

use clap::Parser;
use relay_core::{DescriptionClient, PgJournalStore, RelayConfig};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use relay_server::subsystems::describe::Relay;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional config file layered under the environment
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<String>,

    /// Check database connectivity and exit
    #[arg(long)]
    health: bool,

    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match RelayConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = relay_core::db::create_pool(&config.database);

    if args.health {
        match relay_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if !args.skip_migrations {
        // Requests fail with 500 until the database is reachable; don't refuse to start.
        match relay_core::db::run_migrations(&pool).await {
            Ok(()) => tracing::info!("Database migrations applied"),
            Err(e) => tracing::warn!("Skipping migrations, database unavailable: {}", e),
        }
    }

    let describer = DescriptionClient::new(&config.upstream)?;
    tracing::info!(endpoint = %describer.endpoint(), "Description service configured");
    let relay = Relay::new(Arc::new(PgJournalStore::new(pool)), describer);

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    relay_server::http::start_http_server(relay, config.http, tx.subscribe()).await?;

    Ok(())
}
