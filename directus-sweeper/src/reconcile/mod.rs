//! Bounded-concurrency batch reconciliation.
//!
//! The inventory is cut into contiguous batches of at most `batch_size`
//! records. All probes of a batch run concurrently and the loop waits for
//! every one of them to settle before pausing and starting the next batch.
//! Outcomes are attributed by inventory index, never by completion order,
//! so the summary is reproducible regardless of network timing.

pub mod observer;
pub mod outcome;
pub mod record;
pub mod retry;

pub use observer::{ConsoleObserver, NoopObserver, ReconcileObserver};
pub use outcome::{BatchOutcome, ProbeFailure, RunSummary};
pub use record::RemoteRecord;
pub use retry::RetryPolicy;

use crate::utils::errors::{Result, SweeperError};
use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A per-record operation driven by the reconciler.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short label used in logs (e.g. `"existence"`).
    fn name(&self) -> &'static str;

    async fn probe(&self, record: &RemoteRecord) -> std::result::Result<(), ProbeFailure>;
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Maximum simultaneous in-flight probes
    pub batch_size: usize,

    /// Fixed pause between consecutive batches
    pub inter_batch_delay: Duration,

    /// Bound applied to every probe invocation
    pub probe_timeout: Option<Duration>,

    pub retry: RetryPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(100),
            probe_timeout: None,
            retry: RetryPolicy::none(),
        }
    }
}

pub struct BatchReconciler {
    options: ReconcileOptions,
    observer: Arc<dyn ReconcileObserver>,
}

impl BatchReconciler {
    pub fn new(options: ReconcileOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(SweeperError::InvalidOptions(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            options,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReconcileObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Probe every record once (plus retry rounds) and summarize.
    ///
    /// Individual probe failures never abort the run; each record yields
    /// exactly one final outcome.
    pub async fn reconcile<P>(&self, records: &[RemoteRecord], probe: &P) -> RunSummary
    where
        P: Probe + ?Sized,
    {
        let total = records.len();
        self.observer.run_started(probe.name(), total);

        let mut slots: Vec<Option<BatchOutcome>> = vec![None; total];
        let everything: Vec<usize> = (0..total).collect();
        self.run_pass(records, &everything, probe, &mut slots).await;

        for round in 0..self.options.retry.max_retries {
            let pending: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| match slot {
                    Some(outcome) if outcome.is_retryable() => Some(index),
                    _ => None,
                })
                .collect();
            if pending.is_empty() {
                break;
            }

            let backoff = self.options.retry.backoff_for(round);
            info!(
                "{} retry round {}: {} record(s) after {:?}",
                probe.name(),
                round + 1,
                pending.len(),
                backoff
            );
            self.observer.retry_round(round + 1, pending.len());
            tokio::time::sleep(backoff).await;
            self.run_pass(records, &pending, probe, &mut slots).await;
        }

        let summary = RunSummary::from_outcomes(slots.into_iter().flatten());
        debug!(
            "{} run finished: {} ok, {} failed of {}",
            probe.name(),
            summary.succeeded,
            summary.failed,
            summary.total
        );
        self.observer.run_finished(&summary);
        summary
    }

    async fn run_pass<P>(
        &self,
        records: &[RemoteRecord],
        indices: &[usize],
        probe: &P,
        slots: &mut [Option<BatchOutcome>],
    ) where
        P: Probe + ?Sized,
    {
        let batch_size = self.options.batch_size;
        let batches = indices.len().div_ceil(batch_size);
        let mut processed = 0;

        for (batch, chunk) in indices.chunks(batch_size).enumerate() {
            debug!(
                "{} batch {}/{} ({} records)",
                probe.name(),
                batch + 1,
                batches,
                chunk.len()
            );
            self.observer.batch_started(batch, batches, chunk.len());

            let settled =
                join_all(chunk.iter().map(|&index| self.probe_one(&records[index], probe))).await;

            for (&index, result) in chunk.iter().zip(settled) {
                let attempts = slots[index].as_ref().map_or(0, |o| o.attempts) + 1;
                let outcome = BatchOutcome::new(index, records[index].id.clone(), result, attempts);
                self.observer.record_settled(&outcome);
                slots[index] = Some(outcome);
            }

            processed += chunk.len();
            self.observer.batch_finished(batch, processed, indices.len());

            if batch + 1 < batches && !self.options.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.options.inter_batch_delay).await;
            }
        }
    }

    async fn probe_one<P>(
        &self,
        record: &RemoteRecord,
        probe: &P,
    ) -> std::result::Result<(), ProbeFailure>
    where
        P: Probe + ?Sized,
    {
        let guarded = AssertUnwindSafe(probe.probe(record)).catch_unwind();

        let settled = match self.options.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(settled) => settled,
                Err(_) => return Err(ProbeFailure::TimedOut(limit)),
            },
            None => guarded.await,
        };

        settled.unwrap_or_else(|panic| Err(ProbeFailure::Panicked(panic_message(&*panic))))
    }
}

/// Reconcile with a fixed batch size and delay; no timeout, no retries.
pub async fn reconcile<P>(
    records: &[RemoteRecord],
    probe: &P,
    batch_size: usize,
    inter_batch_delay: Duration,
) -> Result<RunSummary>
where
    P: Probe + ?Sized,
{
    let reconciler = BatchReconciler::new(ReconcileOptions {
        batch_size,
        inter_batch_delay,
        ..ReconcileOptions::default()
    })?;
    Ok(reconciler.reconcile(records, probe).await)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
