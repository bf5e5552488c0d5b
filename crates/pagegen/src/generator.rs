//! Page generation orchestrator
//!
//! Drives each declared container through resolution, analysis and route
//! lookup, renders its page and records it in the manifest. Per-container
//! failures are logged and skipped; anything that makes the rest of the run
//! untrustworthy (route map errors, failed writes) aborts it.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rustc_hash::FxHashSet;

use crate::{
    analyzer::{HandlerRegistration, analyze_handler},
    config::Config,
    errors::GenerateError,
    manifest::{Manifest, ManifestEntry, unix_timestamp},
    resolver::HandlerResolver,
    route_map::RouteMap,
    template::{PageContext, PageTemplates, render},
    util::camel_to_kebab,
};

/// Marker of regex routes that match many URLs and have no single page file
const WILDCARD_MARKER: &str = ".*";

/// How route names are derived for resolved handlers
#[derive(Debug, Clone)]
pub enum RouteSource {
    /// Look the handler identifier up in a route map
    Mapped(RouteMap),
    /// Derive the route from the kebab-cased container name
    Legacy,
}

impl RouteSource {
    /// Build the route map from the configured routing files, or select
    /// legacy mode when there are none
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.route_files.is_empty() {
            info!("No routing files configured, deriving routes from container names");
            return Ok(Self::Legacy);
        }

        let map = RouteMap::build(&config.route_files, &config.route_syntax())
            .context("Failed to build route map")?;
        if config.strict_routes {
            map.ensure_unambiguous()
                .context("Conflicting route registrations")?;
        }
        info!(
            "Route map built from {} files: {} handlers",
            config.route_files.len(),
            map.len()
        );
        Ok(Self::Mapped(map))
    }

    /// Handler -> route map as JSON; empty in legacy mode
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Mapped(map) => map.to_json(),
            Self::Legacy => Ok("{}".to_string()),
        }
    }
}

/// Result of generating one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Written(PathBuf),
    /// Would have been written, but the run is a dry run
    Planned(PathBuf),
    WildcardSkipped { route: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFailure {
    pub container: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub total: usize,
    pub generated: usize,
    pub pages: Vec<PathBuf>,
    pub wildcard_skipped: Vec<String>,
    pub failures: Vec<ContainerFailure>,
    pub manifest: Manifest,
    pub manifest_path: Option<PathBuf>,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.generated, self.total)
    }
}

#[derive(Debug)]
pub struct PageGenerator {
    resolver: HandlerResolver,
    routes: RouteSource,
    templates: PageTemplates,
    pages_root: PathBuf,
    log_dir: PathBuf,
    extension: String,
    dry_run: bool,
}

impl PageGenerator {
    pub fn new(
        resolver: HandlerResolver,
        routes: RouteSource,
        templates: PageTemplates,
        pages_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            routes,
            templates,
            pages_root: pages_root.into(),
            log_dir: PathBuf::from("logs"),
            extension: "tsx".to_string(),
            dry_run: false,
        }
    }

    /// Build a generator from configuration, including the route map
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = HandlerResolver::new(config.handler_root_path()?)
            .with_extensions(&config.handler_extensions);

        let routes = RouteSource::from_config(config)?;

        let templates = PageTemplates::load(
            config.templates.with_data.as_deref(),
            config.templates.without_data.as_deref(),
        )?;

        Ok(Self::new(resolver, routes, templates, &config.pages_root)
            .with_log_dir(&config.log_dir)
            .with_extension(&config.page_extension))
    }

    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Render and plan pages without writing pages or the manifest
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub const fn routes(&self) -> &RouteSource {
        &self.routes
    }

    /// Generate pages for every container, in order
    pub fn run(&self, containers: &[String]) -> Result<GenerationReport> {
        let mut report = GenerationReport {
            total: containers.len(),
            ..GenerationReport::default()
        };

        let mut seen = FxHashSet::default();
        for container in containers {
            if !seen.insert(container.as_str()) {
                warn!("{container}: declared more than once in the index, last result wins");
            }
            debug!("Processing container {container}");
            match self.generate_container(container, &mut report.manifest) {
                Ok(PageOutcome::Written(path) | PageOutcome::Planned(path)) => {
                    report.generated += 1;
                    report.pages.push(path);
                }
                Ok(PageOutcome::WildcardSkipped { route }) => {
                    info!("{container}: skipping wildcard route {route:?}");
                    report.wildcard_skipped.push(container.clone());
                }
                Err(err) if err.is_recoverable() => {
                    error!("{err}");
                    report.failures.push(ContainerFailure {
                        container: container.clone(),
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err).context("Page generation aborted"),
            }
        }

        if self.dry_run {
            debug!("Dry run, manifest not written");
        } else {
            let path = report
                .manifest
                .write_snapshot(&self.log_dir, unix_timestamp())?;
            info!("Wrote manifest to {}", path.display());
            report.manifest_path = Some(path);
        }

        info!("Generated {report} pages");
        if !report.failures.is_empty() {
            warn!("{} containers failed", report.failures.len());
        }
        Ok(report)
    }

    /// Resolve, analyze and render one container
    pub fn generate_container(
        &self,
        container: &str,
        manifest: &mut Manifest,
    ) -> Result<PageOutcome, GenerateError> {
        let handler_path = self.resolver.resolve(container)?;
        let registration = analyze_handler(container, &handler_path)?;
        let route_name = self.route_name(&registration)?;

        manifest.insert(
            container,
            ManifestEntry {
                handler_path,
                package_name: registration.package_name.clone(),
                initial_query: registration.initial_query.clone(),
                route_name: route_name.clone(),
            },
        );

        if route_name.contains(WILDCARD_MARKER) {
            return Ok(PageOutcome::WildcardSkipped { route: route_name });
        }

        let (kind, template) = self.templates.select(registration.initial_query.as_deref());
        let rendered = render(
            template,
            &PageContext {
                package_name: registration.package_name.as_deref().unwrap_or_default(),
                container_name: container,
                initial_query: registration.initial_query.as_deref().unwrap_or_default(),
            },
        );

        let path = self
            .pages_root
            .join(route_to_page_path(&route_name, &self.extension));
        if self.dry_run {
            debug!("{container}: would write {} from {}", path.display(), kind.name());
            return Ok(PageOutcome::Planned(path));
        }

        write_page(&path, &rendered).map_err(|source| GenerateError::Write {
            container: container.to_string(),
            path: path.clone(),
            source,
        })?;
        debug!("{container}: wrote {} from {}", path.display(), kind.name());
        Ok(PageOutcome::Written(path))
    }

    fn route_name(&self, registration: &HandlerRegistration) -> Result<String, GenerateError> {
        match &self.routes {
            RouteSource::Legacy => Ok(format!("/{}", camel_to_kebab(&registration.container))),
            RouteSource::Mapped(map) => registration
                .handler_name
                .as_deref()
                .and_then(|handler| map.get(handler))
                .map(ToString::to_string)
                .ok_or_else(|| {
                    warn!(
                        "{}: handler not mapped to a route name",
                        registration.container
                    );
                    GenerateError::UnmappedHandler {
                        container: registration.container.clone(),
                        handler: registration.handler_name.clone(),
                    }
                }),
        }
    }
}

/// Relative page file for a route pattern
///
/// Regex anchors and an optional trailing slash are dropped, `.` and `..`
/// segments are ignored, and the root route becomes `index`.
pub fn route_to_page_path(route: &str, extension: &str) -> PathBuf {
    let route = route.strip_prefix('^').unwrap_or(route);
    let route = route.strip_suffix('$').unwrap_or(route);
    let route = route.strip_suffix("/?").unwrap_or(route);

    let segments: Vec<&str> = route
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect();

    let mut path = PathBuf::new();
    match segments.split_last() {
        Some((last, parents)) => {
            path.extend(parents);
            path.push(format!("{last}.{extension}"));
        }
        None => path.push(format!("index.{extension}")),
    }
    path
}

fn write_page(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
