//! Container index reader
//!
//! The index is a TypeScript barrel file whose declarations follow the
//! convention
//!
//! ```text
//! export { default as TaxReportsContainer } from "./tax/TaxReportsContainer";
//! ```
//!
//! Only the token count is checked: the fifth space-separated token of any line
//! with at least five tokens is taken as the container identifier.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};

/// Position of the identifier among the space-separated tokens of a line
const IDENTIFIER_TOKEN: usize = 4;

/// Read container identifiers from an index file, in file order
pub fn read_container_index(path: &Path) -> Result<Vec<String>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read container index {}", path.display()))?;
    let containers = parse_container_index(&source);
    debug!(
        "Read {} container declarations from {}",
        containers.len(),
        path.display()
    );
    Ok(containers)
}

/// Extract container identifiers from index source text
///
/// Duplicates are preserved.
pub fn parse_container_index(source: &str) -> Vec<String> {
    let mut containers = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            debug!("Skipping empty index line {}", index + 1);
            continue;
        }

        match line.split(' ').nth(IDENTIFIER_TOKEN) {
            Some(identifier) => containers.push(identifier.to_string()),
            None => warn!("Skipping index line {}: {line:?}", index + 1),
        }
    }

    containers
}
