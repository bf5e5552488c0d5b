//! Handler source resolution
//!
//! Locates the handler module for a container by a raw text search of the
//! handler tree for the container name as a quoted literal. The search is a
//! heuristic: it relies on registrations naming the container as a unique
//! string literal, and it requires exactly one file to match.

use std::{
    fs,
    path::{Path, PathBuf},
};

use cow_utils::CowUtils;
use log::{debug, trace, warn};
use memchr::memmem::Finder;
use walkdir::WalkDir;

use crate::errors::HandlerPathError;

#[derive(Debug, Clone)]
pub struct HandlerResolver {
    root: PathBuf,
    /// Lower-cased extensions without the leading dot; empty means every file
    extensions: Vec<String>,
}

impl HandlerResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
        }
    }

    /// Restrict the search to files with one of these extensions
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref();
                ext.strip_prefix('.')
                    .unwrap_or(ext)
                    .cow_to_ascii_lowercase()
                    .into_owned()
            })
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the single file that mentions `container` as a quoted literal
    pub fn resolve(&self, container: &str) -> Result<PathBuf, HandlerPathError> {
        let mut candidates = self.candidates(container)?;
        match candidates.len() {
            0 => Err(HandlerPathError::NotFound {
                container: container.to_string(),
            }),
            1 => {
                let path = candidates.remove(0);
                debug!("Resolved {container} to {}", path.display());
                Ok(path)
            }
            _ => Err(HandlerPathError::Ambiguous {
                container: container.to_string(),
                candidates,
            }),
        }
    }

    /// Every file under the root that mentions `container` as a quoted literal
    ///
    /// Symlinks are followed. Entries below the root that cannot be walked or
    /// read are skipped with a warning; only an unwalkable root is an error.
    pub fn candidates(&self, container: &str) -> Result<Vec<PathBuf>, HandlerPathError> {
        let double_quoted = format!("\"{container}\"");
        let single_quoted = format!("'{container}'");
        let finders = [
            Finder::new(double_quoted.as_bytes()),
            Finder::new(single_quoted.as_bytes()),
        ];
        let mut matches = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(HandlerPathError::Io {
                        container: container.to_string(),
                        root: self.root.clone(),
                        source: err.into(),
                    });
                }
                Err(err) => {
                    warn!("Skipping unwalkable entry under {}: {err}", self.root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            let contents = match fs::read(entry.path()) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!("Skipping unreadable file {}: {err}", entry.path().display());
                    continue;
                }
            };

            if finders.iter().any(|finder| finder.find(&contents).is_some()) {
                trace!("{container} referenced in {}", entry.path().display());
                matches.push(entry.into_path());
            }
        }

        Ok(matches)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.cow_to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == *ext)
            })
    }
}
