#![forbid(unsafe_code)]
//! HTTP node for the attendance ledger

use attendance_ledger::api::{run_api_server, AppState};
use attendance_ledger::config::load_config;
use attendance_ledger::ledger::LedgerService;
use attendance_ledger::logging::{init_logging, LogFormat};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ledger-node", about = "Serve the attendance ledger over HTTP")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    init_logging(&config.logging.level, LogFormat::from_str_lossy(&config.logging.format));

    // A corrupt chain file aborts start-up here.
    let ledger = Arc::new(LedgerService::open(&config.ledger)?);
    info!(
        blocks = ledger.chain().len(),
        valid = ledger.validate(),
        "Ledger ready"
    );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.api.port);
    let host: IpAddr = config.api.host.parse()?;
    let addr = SocketAddr::new(host, port);

    let state = Arc::new(AppState::new(ledger.clone(), config.attendance));
    run_api_server(state, addr, shutdown_signal()).await?;

    ledger.shutdown()?;
    Ok(())
}
