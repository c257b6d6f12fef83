//! In-memory file store for tests.

use super::FileStore;
use crate::reconcile::{ProbeFailure, RemoteRecord};
use crate::utils::errors::{Result, SweeperError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records whose asset is missing answer `HTTP 403`, as Directus does for a
/// file row without a stored blob. Unreachable ids fail at the transport.
pub struct MemoryStore {
    records: Vec<RemoteRecord>,
    missing_assets: HashSet<String>,
    unreachable: HashSet<String>,
    deleted: Mutex<Vec<String>>,
    pub head_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    fail_listing: bool,
}

impl MemoryStore {
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self {
            records,
            missing_assets: HashSet::new(),
            unreachable: HashSet::new(),
            deleted: Mutex::new(Vec::new()),
            head_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            fail_listing: false,
        }
    }

    pub fn with_missing(mut self, ids: &[&str]) -> Self {
        self.missing_assets.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_unreachable(mut self, ids: &[&str]) -> Self {
        self.unreachable.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn is_deleted(&self, id: &str) -> bool {
        self.deleted.lock().unwrap().iter().any(|d| d == id)
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list_files(&self) -> Result<Vec<RemoteRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(SweeperError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self
            .records
            .iter()
            .filter(|r| !self.is_deleted(&r.id))
            .cloned()
            .collect())
    }

    async fn asset_exists(&self, id: &str) -> std::result::Result<(), ProbeFailure> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(id) {
            return Err(ProbeFailure::Transport("connection reset".into()));
        }
        if self.missing_assets.contains(id) || self.is_deleted(id) {
            return Err(ProbeFailure::Status(403));
        }
        Ok(())
    }

    async fn delete_file(&self, id: &str) -> std::result::Result<(), ProbeFailure> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(id) {
            return Err(ProbeFailure::Transport("connection reset".into()));
        }
        let known = self.records.iter().any(|r| r.id == id);
        if !known || self.is_deleted(id) {
            return Err(ProbeFailure::Status(404));
        }
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
