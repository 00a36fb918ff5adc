// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vulnscan::config::{load_config, AppConfig, ConfigValidator};
use vulnscan::reporting::ScanReport;
use vulnscan::types::ScanStatus;
use vulnscan::ScanService;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Baseline web security scanner
#[derive(Parser)]
#[command(name = "vulnscan")]
#[command(version)]
#[command(about = "Non-intrusive web security baseline scanner", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true, env = "VULNSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address, overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scan one target and print its report
    Scan {
        /// Target URL, e.g. http://localhost:8080
        target: String,

        /// Run probes back to back
        #[arg(long)]
        no_pacing: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    init_tracing(&config, cli.debug);

    match &cli.config {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("Using default configuration with environment overrides"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("vulnscan")
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            ConfigValidator::generate_validation_report(&config).log();
            runtime.block_on(serve(config))
        }
        Commands::Scan {
            target,
            no_pacing,
            format,
        } => {
            if no_pacing {
                config.scanner.pacing_delay_ms = 0;
            }
            ConfigValidator::generate_validation_report(&config).log();
            runtime.block_on(scan_once(config, &target, format))
        }
    }
}

/// Logs go to stderr so `scan` output on stdout stays machine-readable
fn init_tracing(config: &AppConfig, debug: bool) {
    let default_level = if debug {
        "debug"
    } else {
        config.observability.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if config.observability.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let service = Arc::new(ScanService::from_config(&config)?);
    let router = vulnscan::api::create_router(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("vulnscan {} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn scan_once(config: AppConfig, target: &str, format: OutputFormat) -> Result<()> {
    let service = ScanService::from_config(&config)?;

    let receipt = service.admit(target).await?;
    info!("Scan {} queued for {}", receipt.scan_id, target);

    let scan = service.wait_for_terminal(&receipt.scan_id, POLL_INTERVAL).await?;

    if scan.status == ScanStatus::Failed {
        return Err(anyhow::anyhow!(
            "Scan {} failed after {} findings: {}",
            scan.id,
            scan.findings.len(),
            scan.error.unwrap_or_default()
        ));
    }

    let report = ScanReport::from_scan(&scan)
        .ok_or_else(|| anyhow::anyhow!("Scan {} finished without a report", scan.id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.to_text()),
    }

    Ok(())
}
