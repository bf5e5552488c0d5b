//! Handler registration analysis
//!
//! Parses a located handler module and extracts the registration of one
//! container: its package name, its initial data query, and the identifier
//! the handler is bound to.

use std::{fs, path::Path};

use log::debug;
use ruff_python_parser::parse_module;

use crate::{
    errors::ParsingError,
    util::line_number,
    visitors::{CallShape, RegistrationCandidate, RegistrationCollector},
};

/// Which call shape the registration used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationForm {
    /// `Handler = register(...)`
    Assigned,
    /// `register(...)` with no binding
    Bare,
}

/// Normalized registration of one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRegistration {
    pub container: String,
    pub package_name: Option<String>,
    /// Initial data query; an empty literal counts as absent
    pub initial_query: Option<String>,
    pub handler_name: Option<String>,
    pub form: RegistrationForm,
}

/// Read and analyze the handler module at `path`
pub fn analyze_handler(container: &str, path: &Path) -> Result<HandlerRegistration, ParsingError> {
    let source = fs::read_to_string(path).map_err(|source| ParsingError::Read {
        container: container.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    analyze_source(container, path, &source)
}

/// Analyze handler source text; `path` is only used for diagnostics
pub fn analyze_source(
    container: &str,
    path: &Path,
    source: &str,
) -> Result<HandlerRegistration, ParsingError> {
    let parsed = parse_module(source).map_err(|err| ParsingError::Syntax {
        container: container.to_string(),
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let module = parsed.into_syntax();

    let mut candidates = RegistrationCollector::collect(&module, container);
    let candidate = match candidates.len() {
        0 => {
            return Err(ParsingError::NoRegistration {
                container: container.to_string(),
                path: path.to_path_buf(),
            });
        }
        1 => candidates.remove(0),
        _ => {
            return Err(ParsingError::DuplicateRegistration {
                container: container.to_string(),
                path: path.to_path_buf(),
                lines: candidates
                    .iter()
                    .map(|candidate| line_number(source, candidate.offset))
                    .collect(),
            });
        }
    };

    let registration = normalize(container, path, source, candidate)?;
    debug!(
        "{container}: handler={:?} package={:?} initial_query={}",
        registration.handler_name,
        registration.package_name,
        registration.initial_query.is_some()
    );
    Ok(registration)
}

fn normalize(
    container: &str,
    path: &Path,
    source: &str,
    candidate: RegistrationCandidate,
) -> Result<HandlerRegistration, ParsingError> {
    let line = line_number(source, candidate.offset);

    let (handler_name, form) = match candidate.shape {
        CallShape::Assigned {
            target: Some(target),
        } => (Some(target), RegistrationForm::Assigned),
        CallShape::Assigned { target: None } => {
            return Err(ParsingError::HandlerNameFormat {
                container: container.to_string(),
                path: path.to_path_buf(),
                line,
            });
        }
        CallShape::Bare => (None, RegistrationForm::Bare),
    };

    if candidate.package.is_non_literal() {
        return Err(ParsingError::PackageFormat {
            container: container.to_string(),
            path: path.to_path_buf(),
            line,
        });
    }
    if candidate.initial_query.is_non_literal() {
        return Err(ParsingError::InitialQueryFormat {
            container: container.to_string(),
            path: path.to_path_buf(),
            line,
        });
    }

    Ok(HandlerRegistration {
        container: container.to_string(),
        package_name: candidate.package.into_option(),
        initial_query: candidate
            .initial_query
            .into_option()
            .filter(|query| !query.is_empty()),
        handler_name,
        form,
    })
}
