//! flip-bot - Entry Point
//!
//! Listens for long/short webhook signals and trades the configured
//! instrument pair through SignalStack.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Webhook-driven quantity-discovery trader
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FLIP_CONFIG env var)
    #[arg(short, long, env = "FLIP_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the default log level.
    let config = flip_bot::AppConfig::load(args.config.as_deref())?;

    flip_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting flip-bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = args.config.as_deref().unwrap_or(flip_bot::config::DEFAULT_CONFIG_PATH),
        "Configuration loaded"
    );

    let app = flip_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
