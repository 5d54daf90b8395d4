//! # Pipeline Driver
//!
//! Runs extract → enrich → format → load strictly in sequence. Each stage finishes
//! before the next one starts; the warehouse transaction is opened only once every
//! row is formatted. The first failure aborts the run.

use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{Instrument, error, info, info_span};

use crate::config::PipelineConfig;
use crate::db::Connections;
use crate::enrichment::Enricher;
use crate::error::{EtlError, FailureReport};
use crate::formatter;
use crate::loader::{BatchLoader, BatchResult};
use crate::repositories::FinishingPrintingRepository;
use crate::telemetry::{RunContext, current_run_id, with_run_context};

/// The monitoring event warehouse load.
#[derive(Clone, Debug)]
pub struct MonitoringEventPipeline {
    extractor: FinishingPrintingRepository,
    enricher: Enricher,
    loader: BatchLoader,
    config: PipelineConfig,
}

impl MonitoringEventPipeline {
    pub fn new(connections: Connections, config: PipelineConfig) -> Self {
        let Connections { sources, warehouse } = connections;
        Self {
            extractor: FinishingPrintingRepository::new(sources.finishing_printing.clone()),
            enricher: Enricher::new(&sources),
            loader: BatchLoader::new(warehouse, config.warehouse_schema.clone())
                .with_batch_size(config.load_batch_size),
            config,
        }
    }

    /// Execute one run under a fresh run id.
    pub async fn run(&self) -> Result<Vec<BatchResult>, EtlError> {
        with_run_context(RunContext::new(), self.run_in_context()).await
    }

    /// Like [`Self::run`], with a failure rendered as a [`FailureReport`] that carries
    /// the run id.
    pub async fn run_reported(&self) -> Result<Vec<BatchResult>, FailureReport> {
        with_run_context(RunContext::new(), async {
            self.run_in_context().await.map_err(|err| err.report())
        })
        .await
    }

    async fn run_in_context(&self) -> Result<Vec<BatchResult>, EtlError> {
        let run_id = current_run_id().unwrap_or_default();
        let span = info_span!("monitoring_event_run", run_id = %run_id);
        let started = Instant::now();

        let outcome = self.run_stages().instrument(span).await;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        histogram!("monitoring_event_run_duration_ms").record(elapsed_ms);
        match &outcome {
            Ok(batches) => {
                counter!("monitoring_event_runs_total", "outcome" => "success").increment(1);
                info!(
                    run_id = %run_id,
                    batches = batches.len(),
                    elapsed_ms,
                    "Monitoring event run completed"
                );
            }
            Err(err) => {
                counter!("monitoring_event_runs_total", "outcome" => "failure").increment(1);
                error!(
                    run_id = %run_id,
                    error = %err,
                    stage = ?err.stage(),
                    code = err.code(),
                    elapsed_ms,
                    "Monitoring event run failed"
                );
            }
        }
        outcome
    }

    async fn run_stages(&self) -> Result<Vec<BatchResult>, EtlError> {
        let stage_started = Instant::now();
        let events = self
            .extractor
            .extract_monitoring_events(self.config.extract_limit)
            .await
            .map_err(EtlError::Extraction)?;
        counter!("monitoring_event_rows_extracted_total").increment(events.len() as u64);
        info!(
            rows = events.len(),
            elapsed_ms = stage_started.elapsed().as_millis() as u64,
            "Extracted monitoring events"
        );

        let stage_started = Instant::now();
        let enriched = self
            .enricher
            .enrich_all(events, self.config.enrich_concurrency)
            .await?;
        info!(
            rows = enriched.len(),
            elapsed_ms = stage_started.elapsed().as_millis() as u64,
            "Enriched monitoring events"
        );

        let stage_started = Instant::now();
        let rows = formatter::format_all(&enriched)?;
        info!(
            rows = rows.len(),
            elapsed_ms = stage_started.elapsed().as_millis() as u64,
            "Formatted warehouse rows"
        );

        let stage_started = Instant::now();
        let results = self.loader.load(&rows).await?;
        info!(
            batches = results.len(),
            elapsed_ms = stage_started.elapsed().as_millis() as u64,
            "Loaded warehouse rows"
        );

        Ok(results)
    }
}
