//! Inventory snapshot of a remote file record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote record as fetched at run start. Never updated during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Opaque identifier (UUID or numeric)
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Storage-side file name, when known
    pub disk_name: Option<String>,

    /// Size in bytes
    pub size: Option<u64>,

    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,

    /// Parent folder identifier
    pub folder: Option<String>,
}

impl RemoteRecord {
    /// A record known only by its identifier, e.g. from `--ids`.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            disk_name: None,
            size: None,
            created_at: None,
            folder: None,
        }
    }
}
