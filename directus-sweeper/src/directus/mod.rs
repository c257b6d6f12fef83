//! Directus REST collaborators: inventory listing, asset existence, deletion.

pub mod client;
#[cfg(test)]
pub mod memory;
pub mod models;

pub use client::DirectusClient;

use crate::reconcile::{ProbeFailure, RemoteRecord};
use crate::utils::errors::Result;
use async_trait::async_trait;

/// Remote file store the sweeper works against.
///
/// `list_files` errors are fatal for a run; the per-record calls report
/// failures as [`ProbeFailure`] so they can be folded into a summary.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch the complete inventory in one unpaginated call.
    async fn list_files(&self) -> Result<Vec<RemoteRecord>>;

    /// `Ok(())` when the backing asset can be retrieved.
    async fn asset_exists(&self, id: &str) -> std::result::Result<(), ProbeFailure>;

    async fn delete_file(&self, id: &str) -> std::result::Result<(), ProbeFailure>;
}
