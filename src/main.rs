//! # Monitoring Event ETL Entry Point
//!
//! Runs the warehouse load once and prints the per-batch results (or the failure
//! report) as JSON on stdout. `--schedule` keeps running it on the configured interval.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use monitoring_event_etl::{
    config::ConfigLoader, db, pipeline::MonitoringEventPipeline, scheduler::RunScheduler,
    telemetry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Loads monitoring events from the production databases into the warehouse.
#[derive(Parser, Debug)]
#[command(name = "monitoring-event-etl")]
struct Args {
    /// Keep running on the configured interval instead of running once
    #[arg(long)]
    schedule: bool,

    /// Only check that every database answers, then exit
    #[arg(long, conflicts_with = "schedule")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;
    info!(
        profile = %config.profile,
        config = %config.redacted_json().unwrap_or_default(),
        "Loaded configuration"
    );

    let connections = db::connect_all(&config)
        .await
        .context("connecting to databases")?;

    if args.check {
        for (name, conn) in [
            ("finishing-printing", &connections.sources.finishing_printing),
            ("core", &connections.sources.core),
            ("sales", &connections.sources.sales),
            ("warehouse", &connections.warehouse),
        ] {
            db::health_check(conn)
                .await
                .with_context(|| format!("{name} database is unreachable"))?;
        }
        info!("All databases reachable");
        return Ok(ExitCode::SUCCESS);
    }

    let pipeline = MonitoringEventPipeline::new(connections, config.pipeline.clone());

    if args.schedule {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to listen for shutdown signal");
                return;
            }
            signal_token.cancel();
        });

        RunScheduler::new(pipeline, &config.scheduler)
            .run(shutdown)
            .await;
        return Ok(ExitCode::SUCCESS);
    }

    match pipeline.run_reported().await {
        Ok(results) => {
            println!("{}", serde_json::to_string(&results)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            println!("{}", serde_json::to_string(&report)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
