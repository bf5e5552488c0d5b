//! Configuration loading
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. user configuration, `<config dir>/pagegen/pagegen.toml`
//! 3. project configuration, `./pagegen.toml` or the file passed with `--config`
//! 4. `PAGEGEN_*` environment variables
//! 5. command-line flags (applied by the binary as one more [`ConfigLayer`])
//!
//! Relative paths in a configuration file are resolved against the directory
//! containing that file.

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use etcetera::{BaseStrategy, choose_base_strategy};
use log::debug;
use serde::Deserialize;

use crate::visitors::RouteSyntax;

pub const CONFIG_FILE_NAME: &str = "pagegen.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Container index file (TypeScript barrel)
    pub index: Option<PathBuf>,
    /// Root of the legacy handler sources
    pub handler_root: Option<PathBuf>,
    /// Routing-table modules, scanned in order; empty selects legacy mode
    pub route_files: Vec<PathBuf>,
    pub pages_root: PathBuf,
    pub log_dir: PathBuf,
    pub page_extension: String,
    pub route_marker: String,
    pub redirect_marker: String,
    /// Extensions searched for handler registrations; empty searches every file
    pub handler_extensions: Vec<String>,
    /// Fail the run when two registrations map one handler to different routes
    pub strict_routes: bool,
    pub templates: TemplatePaths,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatePaths {
    pub with_data: Option<PathBuf>,
    pub without_data: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: None,
            handler_root: None,
            route_files: Vec::new(),
            pages_root: PathBuf::from("src/pages"),
            log_dir: PathBuf::from("logs"),
            page_extension: "tsx".to_string(),
            route_marker: RouteSyntax::default().route_marker,
            redirect_marker: RouteSyntax::default().redirect_marker,
            handler_extensions: Vec::new(),
            strict_routes: false,
            templates: TemplatePaths::default(),
        }
    }
}

/// One partial source of settings; unset fields leave lower layers intact
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub index: Option<PathBuf>,
    pub handler_root: Option<PathBuf>,
    pub route_files: Option<Vec<PathBuf>>,
    pub pages_root: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub page_extension: Option<String>,
    pub route_marker: Option<String>,
    pub redirect_marker: Option<String>,
    pub handler_extensions: Option<Vec<String>>,
    pub strict_routes: Option<bool>,
    pub templates: TemplatePaths,
}

impl ConfigLayer {
    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let layer: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(layer.rebase(base))
    }

    /// Read `PAGEGEN_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var_os(key))
    }

    /// Read `PAGEGEN_*` variables through `var`
    pub fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let path = |key: &str| var(key).filter(|value| !value.is_empty()).map(PathBuf::from);

        let strict_routes = match var("PAGEGEN_STRICT_ROUTES") {
            Some(value) => Some(parse_bool(&value).ok_or_else(|| {
                anyhow!("PAGEGEN_STRICT_ROUTES must be true or false, got {value:?}")
            })?),
            None => None,
        };

        Ok(Self {
            index: path("PAGEGEN_INDEX"),
            handler_root: path("PAGEGEN_HANDLER_ROOT"),
            route_files: var("PAGEGEN_ROUTE_FILES")
                .filter(|value| !value.is_empty())
                .map(|value| env::split_paths(&value).collect()),
            pages_root: path("PAGEGEN_PAGES_ROOT"),
            log_dir: path("PAGEGEN_LOG_DIR"),
            strict_routes,
            ..Self::default()
        })
    }

    /// Resolve relative paths against `base`
    #[must_use]
    pub fn rebase(mut self, base: &Path) -> Self {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        for path in [
            self.index.as_mut(),
            self.handler_root.as_mut(),
            self.pages_root.as_mut(),
            self.log_dir.as_mut(),
            self.templates.with_data.as_mut(),
            self.templates.without_data.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            join(path);
        }
        for path in self.route_files.iter_mut().flatten() {
            join(path);
        }
        self
    }
}

fn parse_bool(value: &OsString) -> Option<bool> {
    match value.to_str()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load every layer except the command line
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let project = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|path| path.is_file()),
        };
        Self::load_layers(
            user_config_path().as_deref(),
            project.as_deref(),
            ConfigLayer::from_env()?,
        )
    }

    /// Load from explicit user and project files plus an environment layer
    pub fn load_layers(
        user: Option<&Path>,
        project: Option<&Path>,
        env_layer: ConfigLayer,
    ) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = user.filter(|path| path.is_file()) {
            debug!("Loading user config from {}", path.display());
            config.merge(ConfigLayer::from_file(path)?);
        }
        if let Some(path) = project {
            debug!("Loading project config from {}", path.display());
            config.merge(ConfigLayer::from_file(path)?);
        }
        config.merge(env_layer);

        Ok(config)
    }

    /// Apply a higher-precedence layer
    pub fn merge(&mut self, layer: ConfigLayer) {
        let ConfigLayer {
            index,
            handler_root,
            route_files,
            pages_root,
            log_dir,
            page_extension,
            route_marker,
            redirect_marker,
            handler_extensions,
            strict_routes,
            templates,
        } = layer;

        if index.is_some() {
            self.index = index;
        }
        if handler_root.is_some() {
            self.handler_root = handler_root;
        }
        if let Some(route_files) = route_files {
            self.route_files = route_files;
        }
        if let Some(pages_root) = pages_root {
            self.pages_root = pages_root;
        }
        if let Some(log_dir) = log_dir {
            self.log_dir = log_dir;
        }
        if let Some(page_extension) = page_extension {
            self.page_extension = page_extension;
        }
        if let Some(route_marker) = route_marker {
            self.route_marker = route_marker;
        }
        if let Some(redirect_marker) = redirect_marker {
            self.redirect_marker = redirect_marker;
        }
        if let Some(handler_extensions) = handler_extensions {
            self.handler_extensions = handler_extensions;
        }
        if let Some(strict_routes) = strict_routes {
            self.strict_routes = strict_routes;
        }
        if templates.with_data.is_some() {
            self.templates.with_data = templates.with_data;
        }
        if templates.without_data.is_some() {
            self.templates.without_data = templates.without_data;
        }
    }

    pub fn index_path(&self) -> Result<&Path> {
        match &self.index {
            Some(path) => Ok(path),
            None => bail!("No container index configured; pass --index or set `index` in {CONFIG_FILE_NAME}"),
        }
    }

    pub fn handler_root_path(&self) -> Result<&Path> {
        match &self.handler_root {
            Some(path) => Ok(path),
            None => bail!(
                "No handler root configured; pass --handler-root or set `handler_root` in {CONFIG_FILE_NAME}"
            ),
        }
    }

    pub fn route_syntax(&self) -> RouteSyntax {
        RouteSyntax {
            route_marker: self.route_marker.clone(),
            redirect_marker: self.redirect_marker.clone(),
        }
    }
}

/// `<config dir>/pagegen/pagegen.toml` for the current user, if determinable
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("pagegen").join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_extension, "tsx");
        assert_eq!(config.route_syntax(), RouteSyntax::default());
        assert!(config.index_path().is_err());
    }

    #[test]
    fn test_project_file_paths_are_rebased() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            CONFIG_FILE_NAME,
            r#"
index = "web/container/index.ts"
handler_root = "/srv/legacy"
route_files = ["legacy/urls.py", "legacy/api_urls.py"]
strict_routes = true

[templates]
with_data = "templates/with.tsx"
"#,
        );

        let config = Config::load_layers(None, Some(&path), ConfigLayer::default()).unwrap();
        assert_eq!(config.index_path().unwrap(), dir.path().join("web/container/index.ts"));
        assert_eq!(config.handler_root_path().unwrap(), Path::new("/srv/legacy"));
        assert_eq!(
            config.route_files,
            vec![
                dir.path().join("legacy/urls.py"),
                dir.path().join("legacy/api_urls.py")
            ]
        );
        assert!(config.strict_routes);
        assert_eq!(config.templates.with_data, Some(dir.path().join("templates/with.tsx")));
        assert_eq!(config.templates.without_data, None);
        assert_eq!(config.pages_root, PathBuf::from("src/pages"));
    }

    #[test]
    fn test_layer_precedence() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.toml", "page_extension = \"jsx\"\nlog_dir = \"/var/log/pagegen\"\n");
        let project = write(&dir, "project.toml", "page_extension = \"tsx\"\n");
        let env_layer = ConfigLayer {
            log_dir: Some(PathBuf::from("/tmp/logs")),
            ..ConfigLayer::default()
        };

        let config = Config::load_layers(Some(&user), Some(&project), env_layer).unwrap();
        assert_eq!(config.page_extension, "tsx");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CONFIG_FILE_NAME, "pages_dir = \"pages\"\n");
        let err = Config::load_layers(None, Some(&path), ConfigLayer::default()).unwrap_err();
        assert!(format!("{err:#}").contains("pages_dir"));
    }

    #[test]
    fn test_env_vars() {
        let layer = ConfigLayer::from_vars(|key| match key {
            "PAGEGEN_INDEX" => Some(OsString::from("index.ts")),
            "PAGEGEN_ROUTE_FILES" => env::join_paths(["a.py", "b.py"]).ok(),
            "PAGEGEN_STRICT_ROUTES" => Some(OsString::from("yes")),
            _ => None,
        })
        .unwrap();
        assert_eq!(layer.index, Some(PathBuf::from("index.ts")));
        assert_eq!(
            layer.route_files,
            Some(vec![PathBuf::from("a.py"), PathBuf::from("b.py")])
        );
        assert_eq!(layer.strict_routes, Some(true));
        assert_eq!(layer.pages_root, None);

        let err = ConfigLayer::from_vars(|key| {
            (key == "PAGEGEN_STRICT_ROUTES").then(|| OsString::from("maybe"))
        })
        .unwrap_err();
        assert!(err.to_string().contains("PAGEGEN_STRICT_ROUTES"));
    }

    #[test]
    #[serial]
    fn test_from_process_env() {
        // SAFETY: serialized with other environment-mutating tests
        unsafe {
            env::set_var("PAGEGEN_PAGES_ROOT", "out/pages");
        }
        let layer = ConfigLayer::from_env();
        unsafe {
            env::remove_var("PAGEGEN_PAGES_ROOT");
        }
        assert_eq!(layer.unwrap().pages_root, Some(PathBuf::from("out/pages")));
    }
}
