//! Orphan sweep: a read-only plan phase followed by an optional delete phase.
//!
//! The plan phase fetches the inventory and probes each asset; the delete
//! phase is a separate reconcile run over the planned targets and is only
//! entered in execute mode after the deletion gate agrees.

pub mod targets;

pub use targets::{parse_list, resolve_filenames, FilenameResolution, TargetSelection};

use crate::directus::FileStore;
use crate::probe::{DeleteProbe, ExistenceProbe};
use crate::reconcile::{BatchReconciler, RemoteRecord, RunSummary};
use crate::utils::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How a failed existence check is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckErrorPolicy {
    /// Only a definitive HTTP answer marks a record orphaned; transport
    /// errors leave it unverified and untouched.
    #[default]
    Skip,
    /// Every failed check marks the record orphaned.
    Orphan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    DryRun,
    Execute,
}

impl RunMode {
    pub fn from_execute_flag(execute: bool) -> Self {
        if execute {
            RunMode::Execute
        } else {
            RunMode::DryRun
        }
    }
}

/// A record whose existence could not be established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unverified {
    pub record: RemoteRecord,
    pub error: String,
}

/// Result of the existence pass over the full inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    pub inventory: usize,
    pub check: RunSummary,
    pub orphans: Vec<RemoteRecord>,
    pub unverified: Vec<Unverified>,
}

/// Split failed existence checks into orphans and unverified records.
pub fn classify(
    inventory: &[RemoteRecord],
    check: RunSummary,
    policy: CheckErrorPolicy,
) -> SweepPlan {
    let mut orphans = Vec::new();
    let mut unverified = Vec::new();

    for outcome in &check.failures {
        let record = inventory[outcome.index].clone();
        let definitive = outcome.failure.as_ref().is_some_and(|f| f.is_definitive());
        if definitive || policy == CheckErrorPolicy::Orphan {
            orphans.push(record);
        } else {
            unverified.push(Unverified {
                record,
                error: outcome.error.clone().unwrap_or_default(),
            });
        }
    }

    SweepPlan {
        inventory: inventory.len(),
        check,
        orphans,
        unverified,
    }
}

/// Records selected for deletion, with how they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub records: Vec<RemoteRecord>,
    /// Present in scan mode
    pub plan: Option<SweepPlan>,
    /// `--filenames` entries absent from the inventory
    pub not_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    NothingToDo,
    DryRun { planned: usize },
    Aborted,
    Deleted(RunSummary),
}

/// Last chance to stop a live deletion.
#[async_trait]
pub trait DeletionGate: Send + Sync {
    async fn confirm(&self, count: usize) -> bool;
}

pub struct Sweeper {
    store: Arc<dyn FileStore>,
    check: BatchReconciler,
    delete: BatchReconciler,
    policy: CheckErrorPolicy,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn FileStore>,
        check: BatchReconciler,
        delete: BatchReconciler,
        policy: CheckErrorPolicy,
    ) -> Self {
        Self {
            store,
            check,
            delete,
            policy,
        }
    }

    /// Fetch the inventory and probe every asset. Never mutates.
    pub async fn plan(&self) -> Result<SweepPlan> {
        let inventory = self.store.list_files().await?;
        if inventory.is_empty() {
            info!("Inventory is empty, nothing to check");
        } else {
            info!(
                "Checking {} assets ({} at a time)",
                inventory.len(),
                self.check.options().batch_size
            );
        }

        let probe = ExistenceProbe::new(self.store.clone());
        let check = self.check.reconcile(&inventory, &probe).await;
        let plan = classify(&inventory, check, self.policy);

        info!(
            "{} orphaned, {} unverified of {} records",
            plan.orphans.len(),
            plan.unverified.len(),
            plan.inventory
        );
        if !plan.unverified.is_empty() {
            warn!(
                "{} record(s) could not be checked and will be left alone",
                plan.unverified.len()
            );
        }
        Ok(plan)
    }

    /// Resolve a selection into deletion targets.
    pub async fn collect_targets(&self, selection: &TargetSelection) -> Result<Targets> {
        match selection {
            TargetSelection::Scan => {
                let plan = self.plan().await?;
                Ok(Targets {
                    records: plan.orphans.clone(),
                    plan: Some(plan),
                    not_found: Vec::new(),
                })
            }
            TargetSelection::Ids(ids) => Ok(Targets {
                records: ids.iter().map(RemoteRecord::from_id).collect(),
                plan: None,
                not_found: Vec::new(),
            }),
            TargetSelection::Filenames(names) => {
                let inventory = self.store.list_files().await?;
                let resolution = resolve_filenames(&inventory, names);
                if !resolution.not_found.is_empty() {
                    warn!(
                        "{} file name(s) not found in inventory",
                        resolution.not_found.len()
                    );
                }
                Ok(Targets {
                    records: resolution.records,
                    plan: None,
                    not_found: resolution.not_found,
                })
            }
        }
    }

    /// Delete the targets in execute mode, once the gate agrees.
    pub async fn apply(
        &self,
        targets: &Targets,
        mode: RunMode,
        gate: &dyn DeletionGate,
    ) -> SweepOutcome {
        if targets.records.is_empty() {
            return SweepOutcome::NothingToDo;
        }
        if mode == RunMode::DryRun {
            info!(
                "Dry run: {} record(s) would be deleted",
                targets.records.len()
            );
            return SweepOutcome::DryRun {
                planned: targets.records.len(),
            };
        }
        if !gate.confirm(targets.records.len()).await {
            info!("Deletion aborted by operator");
            return SweepOutcome::Aborted;
        }

        info!(
            "Deleting {} record(s) ({} at a time)",
            targets.records.len(),
            self.delete.options().batch_size
        );
        let probe = DeleteProbe::new(self.store.clone());
        let summary = self.delete.reconcile(&targets.records, &probe).await;
        info!(
            "Deleted {}, failed {} (already gone: {})",
            summary.succeeded,
            summary.failed,
            summary.already_gone()
        );
        SweepOutcome::Deleted(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directus::memory::MemoryStore;
    use crate::reconcile::{BatchOutcome, ProbeFailure, ReconcileOptions};
    use crate::utils::errors::SweeperError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct AlwaysConfirm;

    #[async_trait]
    impl DeletionGate for AlwaysConfirm {
        async fn confirm(&self, _count: usize) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct Refuse {
        asked: AtomicUsize,
    }

    #[async_trait]
    impl DeletionGate for Refuse {
        async fn confirm(&self, _count: usize) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    fn inventory(count: usize) -> Vec<RemoteRecord> {
        (0..count)
            .map(|i| {
                let mut record = RemoteRecord::from_id(format!("f{i}"));
                record.disk_name = Some(format!("f{i}.png"));
                record
            })
            .collect()
    }

    fn sweeper(store: Arc<MemoryStore>, policy: CheckErrorPolicy) -> Sweeper {
        let options = |batch_size| ReconcileOptions {
            batch_size,
            inter_batch_delay: Duration::ZERO,
            ..ReconcileOptions::default()
        };
        Sweeper::new(
            store,
            BatchReconciler::new(options(3)).unwrap(),
            BatchReconciler::new(options(2)).unwrap(),
            policy,
        )
    }

    fn ids(records: &[RemoteRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_deleting() {
        let store = Arc::new(MemoryStore::new(inventory(8)).with_missing(&["f1", "f4", "f6"]));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);

        let targets = sweeper.collect_targets(&TargetSelection::Scan).await.unwrap();
        let outcome = sweeper.apply(&targets, RunMode::DryRun, &AlwaysConfirm).await;

        assert_eq!(ids(&targets.records), vec!["f1", "f4", "f6"]);
        assert_eq!(outcome, SweepOutcome::DryRun { planned: 3 });
        assert_eq!(store.head_calls.load(Ordering::SeqCst), 8);
        assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_deletes_same_orphan_set() {
        let store = Arc::new(MemoryStore::new(inventory(8)).with_missing(&["f1", "f4", "f6"]));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);

        let dry = sweeper.collect_targets(&TargetSelection::Scan).await.unwrap();
        let live = sweeper.collect_targets(&TargetSelection::Scan).await.unwrap();
        assert_eq!(dry.records, live.records);

        let outcome = sweeper.apply(&live, RunMode::Execute, &AlwaysConfirm).await;

        match outcome {
            SweepOutcome::Deleted(summary) => {
                assert_eq!(summary.total, 3);
                assert_eq!(summary.succeeded, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.deleted(), vec!["f1", "f4", "f6"]);
    }

    #[tokio::test]
    async fn test_skip_policy_leaves_unreachable_records() {
        let store = Arc::new(
            MemoryStore::new(inventory(5))
                .with_missing(&["f0"])
                .with_unreachable(&["f3"]),
        );
        let plan = sweeper(store, CheckErrorPolicy::Skip).plan().await.unwrap();

        assert_eq!(plan.inventory, 5);
        assert_eq!(plan.check.failed, 2);
        assert_eq!(ids(&plan.orphans), vec!["f0"]);
        assert_eq!(plan.unverified.len(), 1);
        assert_eq!(plan.unverified[0].record.id, "f3");
        assert_eq!(plan.unverified[0].error, "connection reset");
    }

    #[test]
    fn test_classify_only_record_level_statuses_are_orphans() {
        let records = inventory(4);
        let check = || {
            RunSummary::from_outcomes(vec![
                BatchOutcome::new(0, "f0", Err(ProbeFailure::Status(401)), 1),
                BatchOutcome::new(1, "f1", Err(ProbeFailure::Status(500)), 1),
                BatchOutcome::new(2, "f2", Err(ProbeFailure::Status(403)), 1),
                BatchOutcome::new(3, "f3", Err(ProbeFailure::Status(404)), 1),
            ])
        };

        let plan = classify(&records, check(), CheckErrorPolicy::Skip);
        assert_eq!(ids(&plan.orphans), vec!["f2", "f3"]);
        let unverified: Vec<_> = plan.unverified.iter().map(|u| u.error.as_str()).collect();
        assert_eq!(unverified, vec!["HTTP 401", "HTTP 500"]);

        let plan = classify(&records, check(), CheckErrorPolicy::Orphan);
        assert_eq!(ids(&plan.orphans), vec!["f0", "f1", "f2", "f3"]);
        assert!(plan.unverified.is_empty());
    }

    #[tokio::test]
    async fn test_orphan_policy_treats_errors_as_missing() {
        let store = Arc::new(
            MemoryStore::new(inventory(5))
                .with_missing(&["f0"])
                .with_unreachable(&["f3"]),
        );
        let plan = sweeper(store, CheckErrorPolicy::Orphan).plan().await.unwrap();

        assert_eq!(ids(&plan.orphans), vec!["f0", "f3"]);
        assert!(plan.unverified.is_empty());
    }

    #[tokio::test]
    async fn test_inventory_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new(inventory(3)).failing_listing());
        let result = sweeper(store.clone(), CheckErrorPolicy::Skip)
            .collect_targets(&TargetSelection::Scan)
            .await;

        assert!(matches!(result, Err(SweeperError::Api { status: 503, .. })));
        assert_eq!(store.head_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ids_bypass_existence_checks() {
        let store = Arc::new(MemoryStore::new(inventory(4)));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);

        let selection = TargetSelection::Ids(vec!["f2".into(), "ghost".into()]);
        let targets = sweeper.collect_targets(&selection).await.unwrap();
        let outcome = sweeper.apply(&targets, RunMode::Execute, &AlwaysConfirm).await;

        assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.head_calls.load(Ordering::SeqCst), 0);
        let SweepOutcome::Deleted(summary) = outcome else {
            panic!("expected deletion");
        };
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].id, "ghost");
        assert_eq!(summary.already_gone(), 1);
    }

    #[tokio::test]
    async fn test_filenames_resolve_against_inventory() {
        let store = Arc::new(MemoryStore::new(inventory(4)));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);

        let selection = TargetSelection::Filenames(vec!["f3.png".into(), "zzz.png".into()]);
        let targets = sweeper.collect_targets(&selection).await.unwrap();

        assert_eq!(ids(&targets.records), vec!["f3"]);
        assert_eq!(targets.not_found, vec!["zzz.png".to_string()]);
        assert_eq!(store.head_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerun_reports_already_gone() {
        let store = Arc::new(MemoryStore::new(inventory(3)));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);
        let targets = sweeper
            .collect_targets(&TargetSelection::Ids(vec!["f0".into(), "f1".into()]))
            .await
            .unwrap();

        let first = sweeper.apply(&targets, RunMode::Execute, &AlwaysConfirm).await;
        let second = sweeper.apply(&targets, RunMode::Execute, &AlwaysConfirm).await;

        let (SweepOutcome::Deleted(first), SweepOutcome::Deleted(second)) = (first, second) else {
            panic!("expected two deletions");
        };
        assert_eq!(first.succeeded, 2);
        assert_eq!(second.failed, 2);
        assert_eq!(second.already_gone(), 2);
    }

    #[tokio::test]
    async fn test_refused_gate_aborts() {
        let store = Arc::new(MemoryStore::new(inventory(2)));
        let sweeper = sweeper(store.clone(), CheckErrorPolicy::Skip);
        let gate = Refuse::default();
        let targets = sweeper
            .collect_targets(&TargetSelection::Ids(vec!["f0".into()]))
            .await
            .unwrap();

        let outcome = sweeper.apply(&targets, RunMode::Execute, &gate).await;

        assert_eq!(outcome, SweepOutcome::Aborted);
        assert_eq!(gate.asked.load(Ordering::SeqCst), 1);
        assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_to_do_skips_gate() {
        let store = Arc::new(MemoryStore::new(inventory(3)));
        let sweeper = sweeper(store, CheckErrorPolicy::Skip);
        let gate = Refuse::default();

        let targets = sweeper.collect_targets(&TargetSelection::Scan).await.unwrap();
        let outcome = sweeper.apply(&targets, RunMode::Execute, &gate).await;

        assert_eq!(outcome, SweepOutcome::NothingToDo);
        assert_eq!(gate.asked.load(Ordering::SeqCst), 0);
    }
}
