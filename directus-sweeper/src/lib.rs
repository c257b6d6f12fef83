//! Directus Sweeper Library
//!
//! Finds Directus file records whose stored asset is gone and removes them,
//! driving existence checks and deletes through a bounded-concurrency batch
//! reconciler.

pub mod config;
pub mod confirm;
pub mod directus;
pub mod extract;
pub mod probe;
pub mod reconcile;
pub mod report;
pub mod sweep;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::reconcile::{BatchReconciler, ReconcileOptions, RemoteRecord, RunSummary};
pub use crate::utils::errors::SweeperError;
pub type Result<T> = std::result::Result<T, SweeperError>;
