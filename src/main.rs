//! bingopool server binary.
//!
//! Wires the in-memory token ledger, a manual tick counter and the game
//! engine behind the HTTP API. A real deployment replaces the bundled
//! ledger with an adapter for its token service behind the same trait.

use bingopool::api::ApiServer;
use bingopool::config::{self, BingoConfig, ConfigLoader};
use bingopool::engine::{BingoEngine, ManualTicker};
use bingopool::token::InMemoryLedger;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "bingopool")]
#[command(about = "Pooled-stake bingo game server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// API server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Allowed CORS origins, comma-separated; * for all (overrides config)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Write a sample configuration file to this path and exit
    #[arg(long)]
    generate_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bingopool=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.generate_config {
        ConfigLoader::new().save(&BingoConfig::default(), path)?;
        println!("sample configuration written to {}", path);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let mut cfg = loader.load()?;

    if let Some(host) = args.host {
        cfg.api.host = host;
    }
    if let Some(port) = args.port {
        cfg.api.port = port;
    }
    if let Some(origins) = args.cors_origins {
        cfg.api.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
    }
    config::validate(&cfg)?;

    tracing::info!(
        entry_fee = cfg.game.entry_fee,
        board_size = cfg.game.board_size,
        universe = cfg.game.universe,
        allow_late_join = cfg.game.allow_late_join,
        "engine configured"
    );

    let ledger = Arc::new(InMemoryLedger::new());
    let ticker = Arc::new(ManualTicker::new(0));
    let engine = Arc::new(BingoEngine::new(
        cfg.game.clone(),
        ledger.clone(),
        ticker.clone(),
    ));

    ApiServer::new(cfg.api.clone(), engine, ledger, ticker)
        .run()
        .await
}
