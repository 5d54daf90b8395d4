//! # Run Scheduler
//!
//! Background loop that triggers the monitoring event pipeline on a fixed interval.
//! Runs never overlap: the next interval starts counting once the current run has
//! finished. Shutdown is observed between runs only.

use metrics::histogram;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::SchedulerConfig;
use crate::pipeline::MonitoringEventPipeline;

/// Fixed-interval driver for [`MonitoringEventPipeline`].
pub struct RunScheduler {
    pipeline: MonitoringEventPipeline,
    interval: Duration,
}

impl RunScheduler {
    pub fn new(pipeline: MonitoringEventPipeline, config: &SchedulerConfig) -> Self {
        Self {
            pipeline,
            interval: Duration::from_secs(config.interval_seconds),
        }
    }

    /// Override the interval between runs (primarily for tests).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the loop until `shutdown` fires. Returns the number of runs that succeeded.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        info!(interval_seconds = self.interval.as_secs(), "Starting run scheduler");
        let mut succeeded = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Run scheduler shutdown requested");
                    break;
                }
                _ = sleep(self.interval) => {
                    let tick_started = Instant::now();
                    match self.pipeline.run_reported().await {
                        Ok(batches) => {
                            succeeded += 1;
                            info!(batches = batches.len(), "Scheduled run succeeded");
                        }
                        Err(report) => {
                            error!(
                                stage = ?report.stage,
                                code = report.code,
                                message = %report.message,
                                "Scheduled run failed"
                            );
                        }
                    }
                    histogram!("monitoring_event_scheduler_tick_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!(succeeded, "Run scheduler stopped");
        succeeded
    }
}
