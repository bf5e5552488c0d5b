use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, error};
use pagegen::{
    config::{Config, ConfigLayer, TemplatePaths},
    container_index::read_container_index,
    generator::{PageGenerator, RouteSource},
};

#[derive(Parser, Debug)]
#[command(name = "pagegen")]
#[command(about = "Generate Next.js pages for legacy Python-routed containers")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./pagegen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Container index file
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Root of the legacy handler sources
    #[arg(long)]
    handler_root: Option<PathBuf>,

    /// Routing-table module; repeat to scan several, in order
    #[arg(long = "route-file", value_name = "FILE")]
    route_files: Vec<PathBuf>,

    /// Directory the pages are written under
    #[arg(long)]
    pages_root: Option<PathBuf>,

    /// Directory for manifest snapshots
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Template for containers with an initial data query
    #[arg(long, value_name = "FILE")]
    with_data_template: Option<PathBuf>,

    /// Template for containers without an initial data query
    #[arg(long, value_name = "FILE")]
    without_data_template: Option<PathBuf>,

    /// Fail when routing files map one handler to different routes
    #[arg(long)]
    strict_routes: bool,

    /// Report what would be written without touching pages or the manifest
    #[arg(long)]
    dry_run: bool,

    /// Print the handler to route map as JSON and exit
    #[arg(long)]
    list_routes: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags as the highest-precedence configuration layer
    fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            index: self.index.clone(),
            handler_root: self.handler_root.clone(),
            route_files: (!self.route_files.is_empty()).then(|| self.route_files.clone()),
            pages_root: self.pages_root.clone(),
            log_dir: self.log_dir.clone(),
            strict_routes: self.strict_routes.then_some(true),
            templates: TemplatePaths {
                with_data: self.with_data_template.clone(),
                without_data: self.without_data_template.clone(),
            },
            ..ConfigLayer::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.merge(cli.to_layer());
    debug!("Effective configuration: {config:?}");

    if cli.list_routes {
        let routes = RouteSource::from_config(&config)?;
        let json = routes.to_json().context("Failed to serialize route map")?;
        writeln!(io::stdout(), "{json}")?;
        return Ok(());
    }

    let generator = PageGenerator::from_config(&config)?.dry_run(cli.dry_run);
    let containers = read_container_index(config.index_path()?)?;
    let report = generator.run(&containers)?;

    let mut stdout = io::stdout().lock();
    if cli.dry_run {
        for page in &report.pages {
            writeln!(stdout, "would write {}", page.display())?;
        }
    }
    writeln!(stdout, "Generated {report} pages")?;
    if let Some(path) = &report.manifest_path {
        writeln!(stdout, "Manifest: {}", path.display())?;
    }
    Ok(())
}
