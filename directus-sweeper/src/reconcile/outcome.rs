//! Per-record outcomes and the run summary they aggregate into.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a single probe did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    #[error("timed out after {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("probe panicked: {0}")]
    Panicked(String),

    #[error("invalid file id {0:?}")]
    InvalidId(String),
}

impl ProbeFailure {
    /// Failures worth another attempt within the same run.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProbeFailure::Status(code) => *code == 408 || *code == 429 || *code >= 500,
            ProbeFailure::Transport(_) | ProbeFailure::TimedOut(_) | ProbeFailure::Panicked(_) => {
                true
            }
            ProbeFailure::InvalidId(_) => false,
        }
    }

    /// A considered answer from the server about the record itself.
    ///
    /// 401 means the credential was refused, which says nothing about the record.
    pub fn is_definitive(&self) -> bool {
        matches!(self, ProbeFailure::Status(code) if *code != 401) && !self.is_retryable()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeFailure::Status(404))
    }
}

/// Result of probing one record. Created once per record per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Position of the record in the inventory
    pub index: usize,

    pub id: String,

    pub success: bool,

    /// Rendered failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Probe invocations spent on this record
    pub attempts: u32,

    #[serde(skip)]
    pub failure: Option<ProbeFailure>,
}

impl BatchOutcome {
    pub fn new(
        index: usize,
        id: impl Into<String>,
        result: Result<(), ProbeFailure>,
        attempts: u32,
    ) -> Self {
        let failure = result.err();
        Self {
            index,
            id: id.into(),
            success: failure.is_none(),
            error: failure.as_ref().map(ToString::to_string),
            attempts,
            failure,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.failure.as_ref().is_some_and(ProbeFailure::is_retryable)
    }
}

/// Totals for one reconcile run plus the failed outcomes in inventory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchOutcome>,
}

impl RunSummary {
    /// Fold outcomes, which must already be in inventory order.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = BatchOutcome>) -> Self {
        let mut summary = RunSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    pub fn record(&mut self, outcome: BatchOutcome) {
        self.total += 1;
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(outcome);
        }
    }

    /// Failures that report the record as already absent (HTTP 404).
    pub fn already_gone(&self) -> usize {
        self.failures
            .iter()
            .filter(|o| o.failure.as_ref().is_some_and(ProbeFailure::is_not_found))
            .count()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|o| o.id.as_str()).collect()
    }
}
