use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use platform_detector::api::config::DetectorConfig;
use platform_detector::api::start_server;
use platform_detector::utils::logger::init_logger;

/// Detects which e-commerce platform a batch of websites runs on
#[derive(Parser, Debug)]
#[command(name = "platform_detector", version)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Optional configuration file (TOML, YAML, JSON...); DETECTOR_* env vars override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to a timestamped file in this directory instead of stdout
    #[arg(long)]
    log_dir: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_dir.as_deref())?;

    let config = DetectorConfig::load(cli.config.as_deref())?;
    start_server(&cli.host, cli.port, config).await?;

    Ok(())
}
