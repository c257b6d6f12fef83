//! Explicit deletion targets from `--ids` and `--filenames`.

use crate::reconcile::RemoteRecord;
use crate::utils::errors::{Result, SweeperError};
use std::collections::{HashMap, HashSet};

/// Where the deletion targets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// Check every inventory record and target the orphans.
    Scan,
    /// Identifiers given on the command line; no existence checks.
    Ids(Vec<String>),
    /// Storage file names resolved against the inventory.
    Filenames(Vec<String>),
}

impl TargetSelection {
    pub fn from_flags(ids: Option<&str>, filenames: Option<&str>) -> Result<Self> {
        match (ids, filenames) {
            (Some(_), Some(_)) => Err(SweeperError::Usage(
                "--ids and --filenames are mutually exclusive".into(),
            )),
            (Some(raw), None) => {
                let ids = parse_list(raw);
                if ids.is_empty() {
                    return Err(SweeperError::Usage("--ids needs at least one id".into()));
                }
                Ok(TargetSelection::Ids(ids))
            }
            (None, Some(raw)) => {
                let names = parse_list(raw);
                if names.is_empty() {
                    return Err(SweeperError::Usage(
                        "--filenames needs at least one file name".into(),
                    ));
                }
                Ok(TargetSelection::Filenames(names))
            }
            (None, None) => Ok(TargetSelection::Scan),
        }
    }
}

/// Split a comma-separated list; trims, drops blanks, keeps first occurrence.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameResolution {
    pub records: Vec<RemoteRecord>,
    pub not_found: Vec<String>,
}

/// Map storage file names onto inventory records, in the order given.
pub fn resolve_filenames(inventory: &[RemoteRecord], names: &[String]) -> FilenameResolution {
    let by_disk_name: HashMap<&str, &RemoteRecord> = inventory
        .iter()
        .filter_map(|r| r.disk_name.as_deref().map(|name| (name, r)))
        .collect();

    let mut resolution = FilenameResolution::default();
    for name in names {
        match by_disk_name.get(name.as_str()) {
            Some(record) => resolution.records.push((*record).clone()),
            None => resolution.not_found.push(name.clone()),
        }
    }
    resolution
}
