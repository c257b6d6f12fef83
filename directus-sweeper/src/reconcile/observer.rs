//! Event hooks emitted by the reconcile loop.
//!
//! Observers are purely informational; nothing they do feeds back into
//! control flow.

use super::outcome::{BatchOutcome, RunSummary};
use std::io::Write;

pub trait ReconcileObserver: Send + Sync {
    fn run_started(&self, _probe: &str, _total: usize) {}

    /// `batch` is 0-based within the current pass.
    fn batch_started(&self, _batch: usize, _batches: usize, _size: usize) {}

    /// Fires in inventory order once the whole batch has settled.
    fn record_settled(&self, _outcome: &BatchOutcome) {}

    fn batch_finished(&self, _batch: usize, _processed: usize, _total: usize) {}

    fn retry_round(&self, _round: u32, _pending: usize) {}

    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReconcileObserver for NoopObserver {}

/// Prints one glyph per record and a `done/total` line per batch to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl ReconcileObserver for ConsoleObserver {
    fn record_settled(&self, outcome: &BatchOutcome) {
        let glyph = if outcome.success { "✅" } else { "❌" };
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(glyph.as_bytes());
        let _ = out.flush();
    }

    fn batch_finished(&self, _batch: usize, processed: usize, total: usize) {
        println!(" {}/{}", processed, total);
    }

    fn retry_round(&self, round: u32, pending: usize) {
        println!("Retry round {}: {} record(s)", round, pending);
    }
}
