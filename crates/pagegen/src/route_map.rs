//! Handler identifier -> route pattern map built from routing-table modules
//!
//! Routing files are scanned in the configured order and their registrations
//! accumulate into one map. A handler registered again later replaces the
//! earlier pattern; each such replacement is recorded as a [`RouteConflict`]
//! so callers can report it or refuse to continue.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, error, warn};
use ruff_python_parser::parse_module;

use crate::{
    errors::RouteMapError,
    util::line_number,
    visitors::{RouteCall, RouteCollector, RouteSyntax},
};

/// A mapped route and the file that registered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub pattern: String,
    pub file: PathBuf,
}

/// A handler whose pattern was replaced by a later registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub handler: String,
    pub previous: RouteEntry,
    pub replacement: RouteEntry,
}

impl From<&RouteConflict> for RouteMapError {
    fn from(conflict: &RouteConflict) -> Self {
        Self::Conflict {
            handler: conflict.handler.clone(),
            previous: conflict.previous.pattern.clone(),
            previous_file: conflict.previous.file.clone(),
            replacement: conflict.replacement.pattern.clone(),
            file: conflict.replacement.file.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteMap {
    routes: IndexMap<String, RouteEntry>,
    conflicts: Vec<RouteConflict>,
    skipped: usize,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from routing files, in order
    pub fn build(files: &[PathBuf], syntax: &RouteSyntax) -> Result<Self, RouteMapError> {
        let mut map = Self::new();
        for file in files {
            map.add_file(file, syntax)?;
        }
        debug!(
            "Route map holds {} handlers ({} registrations skipped, {} conflicts)",
            map.len(),
            map.skipped,
            map.conflicts.len()
        );
        Ok(map)
    }

    /// Read and scan one routing file
    pub fn add_file(&mut self, path: &Path, syntax: &RouteSyntax) -> Result<(), RouteMapError> {
        let result = fs::read_to_string(path)
            .map_err(|source| RouteMapError::Read {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|source| self.add_source(path, &source, syntax));

        if let Err(err) = &result {
            error!("Failed to build route map from {}: {err}", path.display());
        }
        result.map(|_| ())
    }

    /// Scan routing source text, returning how many routes it mapped
    pub fn add_source(
        &mut self,
        path: &Path,
        source: &str,
        syntax: &RouteSyntax,
    ) -> Result<usize, RouteMapError> {
        let parsed = parse_module(source).map_err(|err| RouteMapError::Syntax {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let module = parsed.into_syntax();

        let mut mapped = 0;
        for call in RouteCollector::collect(&module, syntax) {
            match call {
                RouteCall::Mapped {
                    handler, pattern, ..
                } => {
                    self.insert(
                        handler,
                        RouteEntry {
                            pattern,
                            file: path.to_path_buf(),
                        },
                    );
                    mapped += 1;
                }
                RouteCall::Skipped { reason, offset } => {
                    debug!(
                        "{}:{}: {}",
                        path.display(),
                        line_number(source, offset),
                        reason.describe()
                    );
                    self.skipped += 1;
                }
                RouteCall::UnsupportedPath { found, offset } => {
                    return Err(RouteMapError::UnsupportedPath {
                        path: path.to_path_buf(),
                        line: line_number(source, offset),
                        found,
                    });
                }
                RouteCall::UnsupportedHandler { found, offset } => {
                    return Err(RouteMapError::UnsupportedHandler {
                        path: path.to_path_buf(),
                        line: line_number(source, offset),
                        found,
                    });
                }
            }
        }

        debug!("Mapped {mapped} routes from {}", path.display());
        Ok(mapped)
    }

    fn insert(&mut self, handler: String, entry: RouteEntry) {
        if let Some(previous) = self.routes.get(&handler)
            && previous.pattern != entry.pattern
        {
            warn!(
                "Handler {handler} remapped from {:?} ({}) to {:?} ({})",
                previous.pattern,
                previous.file.display(),
                entry.pattern,
                entry.file.display()
            );
            self.conflicts.push(RouteConflict {
                handler: handler.clone(),
                previous: previous.clone(),
                replacement: entry.clone(),
            });
        }
        self.routes.insert(handler, entry);
    }

    /// Route pattern registered for a handler identifier
    pub fn get(&self, handler: &str) -> Option<&str> {
        self.routes.get(handler).map(|entry| entry.pattern.as_str())
    }

    pub fn entry(&self, handler: &str) -> Option<&RouteEntry> {
        self.routes.get(handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Handler -> pattern pairs in first-registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|(handler, entry)| (handler.as_str(), entry.pattern.as_str()))
    }

    pub fn conflicts(&self) -> &[RouteConflict] {
        &self.conflicts
    }

    /// Number of registrations that were recognized but not mapped
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Fail on the first recorded conflict
    pub fn ensure_unambiguous(&self) -> Result<(), RouteMapError> {
        match self.conflicts.first() {
            Some(conflict) => Err(conflict.into()),
            None => Ok(()),
        }
    }

    /// Pretty JSON object of handler -> pattern
    pub fn to_json(&self) -> serde_json::Result<String> {
        let routes: IndexMap<&str, &str> = self.iter().collect();
        serde_json::to_string_pretty(&routes)
    }
}
