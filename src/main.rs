use anyhow::Result;
use clap::Parser;
use gs1200_exporter::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Switch address, hostname or IP (overrides config)
    #[arg(long, env = "GS1200_ADDRESS")]
    address: Option<String>,

    /// Switch web UI password (overrides config)
    #[arg(long, env = "GS1200_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "GS1200_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "GS1200_LISTEN_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting GS1200 Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(address) = args.address {
        config.device.address = address;
    }
    if let Some(password) = args.password {
        config.device.password = secrecy::SecretString::new(password.into());
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Switch address: {}", config.device.address);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
