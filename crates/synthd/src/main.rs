//! synthd — the synthetic image publication monitor daemon.
//!
//! Periodically publishes a synthetic image to the ingestion endpoint,
//! reads it back from storage after a settle window, and exposes the
//! result as health, good-to-go and history endpoints.
//!
//! # Usage
//!
//! ```text
//! synthd run --ingest-host cms-notifier:8080 --storage-host s3.local --port 8080
//! synthd sample
//! ```

mod settings;

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use synth_core::MonitorConfig;
use synth_payload::PayloadGenerator;
use synth_pipeline::{Kubectl, Monitor, kubectl_hook};

use crate::settings::MonitorArgs;

#[derive(Parser)]
#[command(name = "synthd", about = "Synthetic image publication monitor")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitor and its HTTP endpoints.
    Run(MonitorArgs),

    /// Print one generated synthetic record as JSON and exit.
    Sample(MonitorArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => {
            let config = args.resolve().context("invalid configuration")?;
            run(config).await
        }
        Command::Sample(args) => {
            let config = args.resolve().context("invalid configuration")?;
            let record = PayloadGenerator::new().generate(&config.test_uuid)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,synthd=debug,synth_pipeline=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: MonitorConfig) -> anyhow::Result<()> {
    info!(
        ingest_host = %config.ingest_host,
        storage_host = %config.storage_host,
        test_uuid = %config.test_uuid,
        tick = config.tick,
        "synthetic publication monitor starting"
    );

    // ── Pipeline ───────────────────────────────────────────────

    let mut builder = Monitor::builder(config.clone());
    if config.remediate {
        builder = builder.remediation(kubectl_hook(Kubectl::default()));
        info!("kubectl remediation enabled");
    }
    let (monitor, workers) = builder.start();

    // ── Periodic publishing ────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = if config.tick {
        Some(monitor.spawn_ticker(config.publish_interval, shutdown_rx))
    } else {
        info!("periodic publishing disabled; use /forcePublish");
        None
    };

    // ── HTTP surface ───────────────────────────────────────────

    let router = synth_api::build_router(monitor.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(ticker) = ticker {
        let _ = ticker.await;
    }
    workers.abort();

    info!("synthetic publication monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
}
