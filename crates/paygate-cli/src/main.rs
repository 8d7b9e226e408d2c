//! The `paygate` binary: loads configuration, initializes tracing, and
//! serves the gateway.

use clap::{Parser, Subcommand};
use paygate_core::GatewayConfig;
use paygate_gateway::GatewayServer;
use paygate_store::FileReceiptStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paygate", about = "Paygate — edge access gateway with a pay-to-bypass paywall")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "paygate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the config file and print a summary
    Check,
}

async fn load_config(path: &PathBuf) -> anyhow::Result<GatewayConfig> {
    let config_str = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
    let mut config: GatewayConfig = toml::from_str(&config_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {e}", path.display()))?;

    // Secrets may come from the environment instead of the file.
    if let Ok(secret) = std::env::var("PAYGATE_SECRET") {
        config.signing_secret = secret;
    }
    if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
        config.stripe.secret_key = key;
    }

    if config.signing_secret.is_empty() {
        anyhow::bail!("signing_secret must be set (config file or PAYGATE_SECRET)");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let receipts = Arc::new(FileReceiptStore::new(config.data_dir.join("receipts")).await?);
            info!(
                origin = %config.origin_base(),
                options = config.options.len(),
                "Starting Paygate"
            );

            let app = GatewayServer::build(config, receipts);
            let listener = TcpListener::bind(format!("{host}:{port}")).await?;
            info!(%host, port, "Paygate listening");
            axum::serve(listener, app).await?;
        }
        Commands::Check => {
            println!("config ok");
            println!("  origin:      {}", config.origin_base());
            println!("  threshold:   {}", config.bot_score_threshold);
            println!("  premium:     {:?}", config.premium_prefixes);
            println!(
                "  options:     {}",
                config
                    .options
                    .iter()
                    .map(|o| o.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!(
                "  explain:     {}",
                if config.explain.is_some() {
                    "configured"
                } else {
                    "fallback only"
                }
            );
        }
    }

    Ok(())
}
