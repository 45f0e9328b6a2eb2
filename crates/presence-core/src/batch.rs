use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{AggregatedRecord, Locator};
use crate::traits::{ItemProcessor, ResultSink};

/// Events emitted by the scheduler for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    RunStarted {
        total: usize,
        batches: usize,
    },
    BatchStarted {
        index: usize,
        size: usize,
    },
    ItemFailed {
        url: &'a str,
        error: &'a str,
    },
    BatchCompleted {
        index: usize,
        records: usize,
        failed: usize,
    },
    SinkFailed {
        index: usize,
        error: &'a str,
    },
    Pausing {
        delay: Duration,
    },
    RunFinished {
        records: usize,
        failed: usize,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl PipelineReporter for TracingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::RunStarted { total, batches } => {
                tracing::info!(%total, %batches, "Run started");
            }
            PipelineEvent::BatchStarted { index, size } => {
                tracing::info!(batch = index + 1, %size, "Processing batch");
            }
            PipelineEvent::ItemFailed { url, error } => {
                tracing::warn!(%url, %error, "Item failed");
            }
            PipelineEvent::BatchCompleted {
                index,
                records,
                failed,
            } => {
                tracing::info!(batch = index + 1, %records, %failed, "Batch completed");
            }
            PipelineEvent::SinkFailed { index, error } => {
                tracing::error!(batch = index + 1, %error, "Failed to persist batch");
            }
            PipelineEvent::Pausing { delay } => {
                tracing::debug!(delay_ms = %delay.as_millis(), "Pausing before next batch");
            }
            PipelineEvent::RunFinished { records, failed } => {
                tracing::info!(%records, %failed, "Run finished");
            }
        }
    }
}

/// Totals for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub records: usize,
    pub failed: usize,
    pub sink_failures: usize,
}

/// Runs items in fixed-size concurrent groups, one group at a time.
///
/// Within a group every item runs concurrently and the group completes as a
/// unit; groups are separated by the configured pause. Output order always
/// equals input order.
pub struct BatchScheduler<P: ItemProcessor> {
    processor: P,
    config: PipelineConfig,
}

impl<P: ItemProcessor> BatchScheduler<P> {
    pub fn new(processor: P, config: PipelineConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { processor, config })
    }

    /// Partition `inputs` into the groups [`run`](Self::run) will execute.
    pub fn partition<'a>(&self, inputs: &'a [Locator]) -> Vec<&'a [Locator]> {
        inputs.chunks(self.config.batch_size).collect()
    }

    /// Process every input, appending each finished batch to `sink`.
    ///
    /// A sink failure is reported and the run continues; records are never
    /// held back waiting for later batches.
    pub async fn run<S, R>(
        &self,
        inputs: &[Locator],
        sink: &mut S,
        reporter: &R,
    ) -> Result<RunSummary, AppError>
    where
        S: ResultSink,
        R: PipelineReporter,
    {
        if inputs.is_empty() {
            return Err(AppError::InvalidInput("No valid URLs provided".into()));
        }

        let groups = self.partition(inputs);
        let mut summary = RunSummary::default();

        reporter.report(PipelineEvent::RunStarted {
            total: inputs.len(),
            batches: groups.len(),
        });

        for (index, group) in groups.iter().enumerate() {
            reporter.report(PipelineEvent::BatchStarted {
                index,
                size: group.len(),
            });

            let records = self.run_batch(group).await;
            let mut failed = 0;
            for record in records.iter().filter(|r| r.is_failed()) {
                failed += 1;
                reporter.report(PipelineEvent::ItemFailed {
                    url: record.url.as_str(),
                    error: record.error.as_deref().unwrap_or_default(),
                });
            }

            summary.batches += 1;
            summary.records += records.len();
            summary.failed += failed;

            reporter.report(PipelineEvent::BatchCompleted {
                index,
                records: records.len(),
                failed,
            });

            if let Err(e) = sink.append(&records) {
                summary.sink_failures += 1;
                reporter.report(PipelineEvent::SinkFailed {
                    index,
                    error: &e.to_string(),
                });
            }

            if index + 1 < groups.len() {
                reporter.report(PipelineEvent::Pausing {
                    delay: self.config.inter_batch_delay,
                });
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        reporter.report(PipelineEvent::RunFinished {
            records: summary.records,
            failed: summary.failed,
        });

        Ok(summary)
    }

    /// Run one group concurrently; results come back in group order.
    async fn run_batch(&self, group: &[Locator]) -> Vec<AggregatedRecord> {
        let outcomes = join_all(
            group
                .iter()
                .map(|locator| AssertUnwindSafe(self.processor.process(locator)).catch_unwind()),
        )
        .await;

        outcomes
            .into_iter()
            .zip(group)
            .map(|(outcome, locator)| match outcome {
                Ok(record) => record,
                Err(payload) => AggregatedRecord::failed(
                    locator.clone(),
                    format!("Unexpected failure: {}", panic_message(payload.as_ref())),
                ),
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
