//! Generation manifest
//!
//! An audit log of what each container resolved to during one run. It is
//! written once, at the end of the run, to a file named after the Unix
//! timestamp so successive runs never overwrite each other's logs.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub handler_path: PathBuf,
    pub package_name: Option<String>,
    pub initial_query: Option<String>,
    pub route_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a container; a repeated container replaces its earlier entry
    pub fn insert(&mut self, container: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(container.into(), entry);
    }

    pub fn get(&self, container: &str) -> Option<&ManifestEntry> {
        self.entries.get(container)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries
            .iter()
            .map(|(container, entry)| (container.as_str(), entry))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write `manifest-<timestamp>.json` into `dir`, creating it if needed
    pub fn write_snapshot(&self, dir: &Path, timestamp: u64) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let path = dir.join(format!("manifest-{timestamp}.json"));
        let json = self.to_json().context("Failed to serialize manifest")?;
        fs::write(&path, json + "\n")
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

/// Seconds since the Unix epoch, for naming manifest snapshots
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
