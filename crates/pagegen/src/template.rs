//! Page templates and placeholder substitution
//!
//! Templates name their placeholders `$packageName`, `$containerName` and
//! `$initialQuery` (or the braced `${containerName}` form when the placeholder
//! runs into other identifier characters). `$$` renders a literal `$`. Any
//! other `$name` is left untouched so TypeScript template literals pass
//! through unchanged.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(\$)|\{([_A-Za-z][_A-Za-z0-9]*)\}|([_A-Za-z][_A-Za-z0-9]*))")
        .expect("placeholder pattern is valid")
});

const BUILTIN_WITH_DATA: &str = include_str!("../templates/page-with-data.tsx");
const BUILTIN_WITHOUT_DATA: &str = include_str!("../templates/page-without-data.tsx");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    WithData,
    WithoutData,
}

impl TemplateKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::WithData => "page-with-data",
            Self::WithoutData => "page-without-data",
        }
    }
}

/// Values substituted into a page template
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub package_name: &'a str,
    pub container_name: &'a str,
    pub initial_query: &'a str,
}

impl PageContext<'_> {
    fn lookup(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "packageName" => Some(self.package_name),
            "containerName" => Some(self.container_name),
            "initialQuery" => Some(self.initial_query),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageTemplates {
    with_data: String,
    without_data: String,
}

impl Default for PageTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PageTemplates {
    pub fn new(with_data: impl Into<String>, without_data: impl Into<String>) -> Self {
        Self {
            with_data: with_data.into(),
            without_data: without_data.into(),
        }
    }

    /// Templates compiled into the binary
    pub fn builtin() -> Self {
        Self::new(BUILTIN_WITH_DATA, BUILTIN_WITHOUT_DATA)
    }

    /// Load templates from disk, falling back to the built-in ones
    pub fn load(with_data: Option<&Path>, without_data: Option<&Path>) -> Result<Self> {
        let read = |path: Option<&Path>, kind: TemplateKind, builtin: &str| -> Result<String> {
            match path {
                Some(path) => fs::read_to_string(path).with_context(|| {
                    format!("Failed to read {} template {}", kind.name(), path.display())
                }),
                None => Ok(builtin.to_string()),
            }
        };

        Ok(Self::new(
            read(with_data, TemplateKind::WithData, BUILTIN_WITH_DATA)?,
            read(without_data, TemplateKind::WithoutData, BUILTIN_WITHOUT_DATA)?,
        ))
    }

    /// Pick the template for a registration's initial query
    pub fn select(&self, initial_query: Option<&str>) -> (TemplateKind, &str) {
        match initial_query {
            Some(_) => (TemplateKind::WithData, &self.with_data),
            None => (TemplateKind::WithoutData, &self.without_data),
        }
    }
}

/// Substitute the page placeholders into `template`
pub fn render(template: &str, context: &PageContext<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            context
                .lookup(name)
                .map_or_else(|| caps[0].to_string(), ToString::to_string)
        })
        .into_owned()
}
