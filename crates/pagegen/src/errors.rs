//! Error types for the page generation pipeline
//!
//! Per-container failures ([`HandlerPathError`], [`ParsingError`] and the
//! unmapped-handler case of [`GenerateError`]) are recoverable: the generator
//! logs them and moves on to the next container. Route map failures
//! ([`RouteMapError`]) are fatal for the whole run.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failure to locate the single handler source file for a container
#[derive(Debug, Error)]
pub enum HandlerPathError {
    #[error("{container}: no files identified")]
    NotFound { container: String },

    #[error("{container}: more than one file identified: {}", display_paths(.candidates))]
    Ambiguous {
        container: String,
        candidates: Vec<PathBuf>,
    },

    #[error("{container}: failed to search {}: {source}", .root.display())]
    Io {
        container: String,
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HandlerPathError {
    pub fn container(&self) -> &str {
        match self {
            Self::NotFound { container }
            | Self::Ambiguous { container, .. }
            | Self::Io { container, .. } => container,
        }
    }
}

/// Failure to extract a registration from a located handler file
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("{container}: failed to read {}: {source}", .path.display())]
    Read {
        container: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{container}: failed to parse {}: {message}", .path.display())]
    Syntax {
        container: String,
        path: PathBuf,
        message: String,
    },

    #[error("{container}: package name improperly formatted at {}:{line}", .path.display())]
    PackageFormat {
        container: String,
        path: PathBuf,
        line: usize,
    },

    #[error("{container}: initial query improperly formatted at {}:{line}", .path.display())]
    InitialQueryFormat {
        container: String,
        path: PathBuf,
        line: usize,
    },

    #[error("{container}: handler name improperly formatted at {}:{line}", .path.display())]
    HandlerNameFormat {
        container: String,
        path: PathBuf,
        line: usize,
    },

    #[error("{container}: no registration found in {}", .path.display())]
    NoRegistration { container: String, path: PathBuf },

    #[error(
        "{container}: {} registrations found in {} (lines {})",
        .lines.len(),
        .path.display(),
        display_lines(.lines)
    )]
    DuplicateRegistration {
        container: String,
        path: PathBuf,
        lines: Vec<usize>,
    },
}

impl ParsingError {
    pub fn container(&self) -> &str {
        match self {
            Self::Read { container, .. }
            | Self::Syntax { container, .. }
            | Self::PackageFormat { container, .. }
            | Self::InitialQueryFormat { container, .. }
            | Self::HandlerNameFormat { container, .. }
            | Self::NoRegistration { container, .. }
            | Self::DuplicateRegistration { container, .. } => container,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Syntax { path, .. }
            | Self::PackageFormat { path, .. }
            | Self::InitialQueryFormat { path, .. }
            | Self::HandlerNameFormat { path, .. }
            | Self::NoRegistration { path, .. }
            | Self::DuplicateRegistration { path, .. } => path,
        }
    }
}

/// Failure while building the handler -> route map. Always fatal.
#[derive(Debug, Error)]
pub enum RouteMapError {
    #[error("failed to read routing file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse routing file {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("{}:{line}: route path must be a string literal, found {found}", .path.display())]
    UnsupportedPath {
        path: PathBuf,
        line: usize,
        found: &'static str,
    },

    #[error("{}:{line}: unsupported route handler expression {found}", .path.display())]
    UnsupportedHandler {
        path: PathBuf,
        line: usize,
        found: &'static str,
    },

    #[error(
        "handler {handler} is registered for both {previous:?} ({}) and {replacement:?} ({})",
        .previous_file.display(),
        .file.display()
    )]
    Conflict {
        handler: String,
        previous: String,
        previous_file: PathBuf,
        replacement: String,
        file: PathBuf,
    },
}

/// Per-container generation failure
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    HandlerPath(#[from] HandlerPathError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error(
        "{container}: handler {} not mapped to a route name",
        .handler.as_deref().unwrap_or("<unbound>")
    )]
    UnmappedHandler {
        container: String,
        handler: Option<String>,
    },

    #[error("{container}: failed to write {}: {source}", .path.display())]
    Write {
        container: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    /// Whether the run may continue with the next container
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Write { .. })
    }

    pub fn container(&self) -> &str {
        match self {
            Self::HandlerPath(err) => err.container(),
            Self::Parsing(err) => err.container(),
            Self::UnmappedHandler { container, .. } | Self::Write { container, .. } => container,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
