#![cfg(not(tarpaulin_include))]

use clap::Parser;
use std::path::PathBuf;

use sheet_dashboard::app;
use sheet_dashboard::config::AppConfig;

/// Job-application dashboard backed by a Google Sheets tab.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!(
        "Starting dashboard for sheet '{}' ({})",
        config.dashboard.sheet_name,
        config.dashboard.read_range()
    );
    app::run(config).await
}
