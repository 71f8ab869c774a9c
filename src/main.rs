use anyhow::Result;
use clap::Parser;
use cx_lab::config::{Config, log_filter};
use cx_lab::http::start_http_server;
use tracing::info;

#[derive(Parser)]
#[command(name = "cx-lab")]
#[command(about = "Automation business case analysis API", long_about = None)]
struct Cli {
    /// Listen address, overrides server.bind
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,
    /// Path to a TOML config file (defaults to CX_LAB_CONFIG or cx_lab.toml)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subscriber first so config warnings are not dropped
    tracing_subscriber::fmt()
        .with_env_filter(log_filter().as_str())
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load_from(cli.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    info!(
        "Configuration loaded: bind={}, stages delay={}ms, session capacity={}",
        config.server.bind, config.pipeline.stage_delay_ms, config.sessions.capacity
    );

    start_http_server(config).await?;
    Ok(())
}
