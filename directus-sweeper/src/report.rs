//! Human-readable rendering of plans and summaries, plus the JSON run report.

use crate::reconcile::{RemoteRecord, RunSummary};
use crate::sweep::{RunMode, SweepOutcome, Targets, Unverified};
use crate::utils::errors::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

fn format_size(size: Option<u64>) -> String {
    size.map(format_bytes).unwrap_or_else(|| "unknown".to_string())
}

fn record_line(position: usize, record: &RemoteRecord) -> String {
    format!(
        "  {:>3}. {} ({}) [{}]",
        position,
        record.name,
        record.id,
        format_size(record.size)
    )
}

/// Render the deletion targets, listing at most `cap` records.
pub fn render_targets(targets: &Targets, cap: usize) -> String {
    let mut out = String::new();

    if let Some(plan) = &targets.plan {
        let _ = writeln!(
            out,
            "Checked {} records: {} present, {} orphaned, {} unverified",
            plan.inventory,
            plan.check.succeeded,
            plan.orphans.len(),
            plan.unverified.len()
        );
        out.push_str(&render_unverified(&plan.unverified, cap));
    }

    for name in &targets.not_found {
        let _ = writeln!(out, "Not found in inventory: {}", name);
    }

    if targets.records.is_empty() {
        out.push_str("Nothing to delete.\n");
        return out;
    }

    let total_bytes: u64 = targets.records.iter().filter_map(|r| r.size).sum();
    let _ = writeln!(
        out,
        "{} record(s) targeted for deletion ({} known size):",
        targets.records.len(),
        format_bytes(total_bytes)
    );
    for (i, record) in targets.records.iter().take(cap).enumerate() {
        let _ = writeln!(out, "{}", record_line(i + 1, record));
    }
    if targets.records.len() > cap {
        let _ = writeln!(out, "  ...and {} more", targets.records.len() - cap);
    }
    out
}

fn render_unverified(unverified: &[Unverified], cap: usize) -> String {
    let mut out = String::new();
    if unverified.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Left alone (existence unknown):");
    for entry in unverified.iter().take(cap) {
        let _ = writeln!(
            out,
            "  - {} ({}): {}",
            entry.record.name, entry.record.id, entry.error
        );
    }
    if unverified.len() > cap {
        let _ = writeln!(out, "  ...and {} more", unverified.len() - cap);
    }
    out
}

/// Render a deletion summary, listing at most `cap` failures.
pub fn render_summary(summary: &RunSummary, cap: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Processed {}: {} deleted, {} failed",
        summary.total, summary.succeeded, summary.failed
    );

    if summary.failures.is_empty() {
        return out;
    }

    let gone = summary.already_gone();
    if gone > 0 {
        let _ = writeln!(out, "{} of the failures were already gone (HTTP 404)", gone);
    }
    let _ = writeln!(out, "Failures:");
    for (i, failure) in summary.failures.iter().take(cap).enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {}: {}",
            i + 1,
            failure.id,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    if summary.failures.len() > cap {
        let _ = writeln!(out, "  ...and {} more", summary.failures.len() - cap);
    }
    out
}

/// Machine-readable record of one invocation.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub mode: RunMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<usize>,
    pub targets: Vec<&'a str>,
    pub unverified: Vec<&'a Unverified>,
    pub not_found: &'a [String],
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion: Option<&'a RunSummary>,
}

impl<'a> RunReport<'a> {
    pub fn new(mode: RunMode, targets: &'a Targets, outcome: &'a SweepOutcome) -> Self {
        let (label, deletion) = match outcome {
            SweepOutcome::NothingToDo => ("nothing-to-do", None),
            SweepOutcome::DryRun { .. } => ("dry-run", None),
            SweepOutcome::Aborted => ("aborted", None),
            SweepOutcome::Deleted(summary) => ("deleted", Some(summary)),
        };

        Self {
            generated_at: Utc::now(),
            mode,
            inventory: targets.plan.as_ref().map(|p| p.inventory),
            targets: targets.records.iter().map(|r| r.id.as_str()).collect(),
            unverified: targets
                .plan
                .as_ref()
                .map(|p| p.unverified.iter().collect())
                .unwrap_or_default(),
            not_found: &targets.not_found,
            outcome: label,
            deletion,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
