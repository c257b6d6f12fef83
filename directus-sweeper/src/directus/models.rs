//! Wire types for the Directus `/files` collection.

use crate::reconcile::RemoteRecord;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Fields requested from `/files`.
pub const FILE_FIELDS: &str =
    "id,filename_disk,filename_download,title,filesize,uploaded_on,folder";

/// Directus wraps every collection response in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Directus serializes big integers as strings on some databases.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Text(text) => text.trim().parse().ok(),
            Scalar::Number(number) => number.as_u64(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectusFile {
    pub id: Scalar,
    #[serde(default)]
    pub filename_disk: Option<String>,
    #[serde(default)]
    pub filename_download: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filesize: Option<Scalar>,
    #[serde(default)]
    pub uploaded_on: Option<String>,
    #[serde(default)]
    pub folder: Option<Scalar>,
}

impl From<DirectusFile> for RemoteRecord {
    fn from(file: DirectusFile) -> Self {
        let id = file.id.into_text();
        let name = file
            .filename_download
            .clone()
            .or_else(|| file.title.clone())
            .or_else(|| file.filename_disk.clone())
            .unwrap_or_else(|| id.clone());

        RemoteRecord {
            id,
            name,
            disk_name: file.filename_disk,
            size: file.filesize.as_ref().and_then(Scalar::as_u64),
            created_at: file
                .uploaded_on
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|ts| ts.with_timezone(&Utc)),
            folder: file.folder.map(Scalar::into_text),
        }
    }
}
