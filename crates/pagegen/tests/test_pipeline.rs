#![allow(clippy::disallowed_methods)]

use std::{fs, path::PathBuf};

use pagegen::{
    config::Config,
    errors::GenerateError,
    generator::{PageGenerator, PageOutcome, RouteSource},
    manifest::Manifest,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A throwaway project with handler sources, one routing file and an index
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write(
            "urls.py",
            r#"from merchant import views

urlpatterns = [
    url("/profile", views.UserProfileHandler),
    url("/orders/.*", views.OrdersHandler),
    url("/tax/reports", TaxReportsHandler),
    url("/old-profile", redirect("/profile")),
]
"#,
        );
        project.write(
            "handlers/profile.py",
            r#"UserProfileHandler = register(container="UserProfile", package="merchant.profile")
"#,
        );
        project.write(
            "handlers/orders.py",
            r#"OrdersHandler = register(
    container="Orders",
    package="merchant.orders",
    initial_query="{ orders { id } }",
)
"#,
        );
        project.write(
            "handlers/tax.py",
            r#"TaxReportsHandler = register(
    container='TaxReports',
    package='merchant.tax',
    initial_query='{ taxReports { year } }',
)
"#,
        );
        project
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(&self) -> Config {
        Config {
            index: Some(self.path("index.ts")),
            handler_root: Some(self.path("handlers")),
            route_files: vec![self.path("urls.py")],
            pages_root: self.path("pages"),
            log_dir: self.path("logs"),
            ..Config::default()
        }
    }

    fn containers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }
}

#[test]
fn test_generates_page_and_manifest_entry() {
    let project = Project::new();
    let generator = PageGenerator::from_config(&project.config()).unwrap();

    let report = generator.run(&Project::containers(&["UserProfile"])).unwrap();

    let page = project.path("pages/profile.tsx");
    assert_eq!(report.pages, vec![page.clone()]);
    assert_eq!(report.to_string(), "1/1");

    let contents = fs::read_to_string(&page).unwrap();
    assert!(contents.contains("import { UserProfile } from \"@legacy/merchant.profile\";"));
    assert!(contents.contains("const UserProfilePage"));
    assert!(!contents.contains("useQuery"));

    let entry = report.manifest.get("UserProfile").unwrap();
    assert_eq!(entry.route_name, "/profile");
    assert_eq!(entry.package_name.as_deref(), Some("merchant.profile"));
    assert_eq!(entry.initial_query, None);
    assert_eq!(entry.handler_path, project.path("handlers/profile.py"));

    let manifest_path = report.manifest_path.unwrap();
    assert!(manifest_path.starts_with(project.path("logs")));
    let written: Manifest =
        serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(written, report.manifest);
}

#[test]
fn test_initial_query_selects_data_template() {
    let project = Project::new();
    let generator = PageGenerator::from_config(&project.config()).unwrap();

    generator.run(&Project::containers(&["TaxReports"])).unwrap();

    let contents = fs::read_to_string(project.path("pages/tax/reports.tsx")).unwrap();
    assert!(contents.contains("{ taxReports { year } }"));
    assert!(contents.contains("import { TaxReports } from \"@legacy/merchant.tax\";"));
}

#[test]
fn test_regeneration_is_byte_identical() {
    let project = Project::new();
    let generator = PageGenerator::from_config(&project.config()).unwrap();
    let containers = Project::containers(&["UserProfile", "TaxReports"]);

    generator.run(&containers).unwrap();
    let first: Vec<Vec<u8>> = ["pages/profile.tsx", "pages/tax/reports.tsx"]
        .iter()
        .map(|page| fs::read(project.path(page)).unwrap())
        .collect();

    generator.run(&containers).unwrap();
    let second: Vec<Vec<u8>> = ["pages/profile.tsx", "pages/tax/reports.tsx"]
        .iter()
        .map(|page| fs::read(project.path(page)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_wildcard_route_is_recorded_but_not_written() {
    let project = Project::new();
    let generator = PageGenerator::from_config(&project.config()).unwrap();
    let mut manifest = Manifest::new();

    let outcome = generator.generate_container("Orders", &mut manifest).unwrap();

    assert_eq!(
        outcome,
        PageOutcome::WildcardSkipped {
            route: "/orders/.*".to_string()
        }
    );
    assert_eq!(manifest.get("Orders").unwrap().route_name, "/orders/.*");
    assert!(!project.path("pages").exists());
}

#[test]
fn test_failures_do_not_stop_the_run() {
    let project = Project::new();
    project.write(
        "handlers/dupe.py",
        "LABEL = \"UserProfile\"\n",
    );
    let generator = PageGenerator::from_config(&project.config()).unwrap();

    let report = generator
        .run(&Project::containers(&["Missing", "UserProfile", "TaxReports"]))
        .unwrap();

    assert_eq!(report.to_string(), "1/3");
    let failed: Vec<&str> = report
        .failures
        .iter()
        .map(|failure| failure.container.as_str())
        .collect();
    assert_eq!(failed, vec!["Missing", "UserProfile"]);
    assert!(report.failures[0].message.contains("no files identified"));
    assert!(report.failures[1].message.contains("more than one file identified"));
    assert!(project.path("pages/tax/reports.tsx").exists());
}

#[test]
fn test_unmapped_handler_is_per_container() {
    let project = Project::new();
    project.write(
        "handlers/settings.py",
        "SettingsHandler = register(container=\"Settings\")\n",
    );
    let generator = PageGenerator::from_config(&project.config()).unwrap();

    let err = generator
        .generate_container("Settings", &mut Manifest::new())
        .unwrap_err();
    assert!(matches!(
        &err,
        GenerateError::UnmappedHandler { handler: Some(handler), .. } if handler == "SettingsHandler"
    ));
    assert!(err.is_recoverable());

    let report = generator
        .run(&Project::containers(&["Settings", "UserProfile"]))
        .unwrap();
    assert_eq!(report.to_string(), "1/2");
    assert!(report.manifest.get("Settings").is_none());
}

#[test]
fn test_route_source_ignores_generation_settings() {
    let project = Project::new();
    let config = Config {
        handler_root: None,
        route_files: vec![project.path("urls.py")],
        ..Config::default()
    };

    let RouteSource::Mapped(map) = RouteSource::from_config(&config).unwrap() else {
        panic!("expected a route map");
    };
    assert_eq!(map.get("UserProfileHandler"), Some("/profile"));
    assert!(PageGenerator::from_config(&config).is_err());

    let legacy = RouteSource::from_config(&Config::default()).unwrap();
    assert_eq!(legacy.to_json().unwrap(), "{}");
}

#[test]
fn test_legacy_mode_derives_routes_from_container_names() {
    let project = Project::new();
    let config = Config {
        route_files: Vec::new(),
        ..project.config()
    };
    let generator = PageGenerator::from_config(&config).unwrap();

    let report = generator.run(&Project::containers(&["TaxReports"])).unwrap();

    assert_eq!(report.pages, vec![project.path("pages/tax-reports.tsx")]);
    assert_eq!(
        report.manifest.get("TaxReports").unwrap().route_name,
        "/tax-reports"
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let project = Project::new();
    let generator = PageGenerator::from_config(&project.config())
        .unwrap()
        .dry_run(true);

    let report = generator.run(&Project::containers(&["UserProfile"])).unwrap();

    assert_eq!(report.pages, vec![project.path("pages/profile.tsx")]);
    assert_eq!(report.manifest_path, None);
    assert!(!project.path("pages").exists());
    assert!(!project.path("logs").exists());
}

#[test]
fn test_strict_routes_rejects_conflicts() {
    let project = Project::new();
    project.write("more_urls.py", "url(\"/me\", views.UserProfileHandler)\n");
    let mut config = project.config();
    config.route_files.push(project.path("more_urls.py"));

    let generator = PageGenerator::from_config(&config).unwrap();
    let report = generator.run(&Project::containers(&["UserProfile"])).unwrap();
    assert_eq!(report.pages, vec![project.path("pages/me.tsx")]);

    config.strict_routes = true;
    let err = PageGenerator::from_config(&config).unwrap_err();
    assert!(format!("{err:#}").contains("UserProfileHandler"));
}

#[test]
fn test_unparseable_route_file_is_fatal() {
    let project = Project::new();
    project.write("urls.py", "print \"legacy\"\n");

    let err = PageGenerator::from_config(&project.config()).unwrap_err();
    assert!(format!("{err:#}").contains("urls.py"));
}
