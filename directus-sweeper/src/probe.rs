//! Existence and delete probes over a [`FileStore`].

use crate::directus::FileStore;
use crate::reconcile::{Probe, ProbeFailure, RemoteRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Succeeds when the record's backing asset can be retrieved.
pub struct ExistenceProbe {
    store: Arc<dyn FileStore>,
}

impl ExistenceProbe {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Probe for ExistenceProbe {
    fn name(&self) -> &'static str {
        "existence"
    }

    async fn probe(&self, record: &RemoteRecord) -> Result<(), ProbeFailure> {
        self.store.asset_exists(&record.id).await
    }
}

/// Deletes the record. An already-deleted record reports `HTTP 404`.
pub struct DeleteProbe {
    store: Arc<dyn FileStore>,
}

impl DeleteProbe {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Probe for DeleteProbe {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn probe(&self, record: &RemoteRecord) -> Result<(), ProbeFailure> {
        self.store.delete_file(&record.id).await
    }
}
