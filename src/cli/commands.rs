use crate::config::{parse_arg_pair, Action, BuildArgs, BuildConfig, Platform, Settings};
use crate::dummy_value::SchemaMockData;
use crate::generator::{BuildReport, Builder};
use crate::providers::{HttpDownloader, SnapshotDiff};
use crate::spec::load_data_source;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for stubsmith
///
/// Materializes an exported project (document tree plus interfaces, data
/// types, templates and pages) into files on disk.
#[derive(Parser, Debug)]
#[command(name = "stubsmith")]
#[command(about = "Project generator driven by an exported document tree", long_about = None)]
pub struct Cli {
    /// Log at debug level regardless of STUBSMITH_LOG_LEVEL
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available stubsmith commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a project from scratch
    Build(RunArgs),
    /// Regenerate an existing project, leaving hand-edited documents alone
    Update(RunArgs),
}

impl Commands {
    pub fn action(&self) -> Action {
        match self {
            Commands::Build(_) => Action::Build,
            Commands::Update(_) => Action::Update,
        }
    }

    pub fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Build(args) | Commands::Update(args) => args,
        }
    }
}

/// Flags shared by `build` and `update`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Exported project file (JSON or YAML)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the project is generated into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Project key; enables mock data, routing rules and run config
    #[arg(long)]
    pub key: Option<String>,

    /// Regenerate plain documents on update
    #[arg(long, default_value_t = false)]
    pub spec: bool,

    #[arg(long)]
    pub spec_key: Option<String>,

    /// Target platform: web, ios, android or any custom name
    #[arg(long)]
    pub spec_type: Option<String>,

    /// Overwrite existing files unless a `!!nw` directive says otherwise
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    #[arg(long)]
    pub pid: Option<i64>,

    /// Directory holding the Xcode project, relative to the output
    #[arg(long)]
    pub ios_project_path: Option<PathBuf>,

    /// Update the Xcode project even when nothing changed
    #[arg(long, default_value_t = false)]
    pub pbx_force: bool,

    /// Export of the previous run, used to detect changes
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Where run configuration is written (default: <output>/.stubsmith)
    #[arg(long)]
    pub config_root: Option<PathBuf>,

    /// YAML settings file providing defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Extra template argument, reachable as `args.<name>` (repeatable)
    #[arg(long = "arg", value_name = "NAME=VALUE", value_parser = parse_arg_pair)]
    pub args: Vec<(String, Value)>,
}

impl RunArgs {
    /// Resolve the run configuration. Flags win over settings.
    pub fn build_config(&self, action: Action, settings: &Settings) -> BuildConfig {
        let mut args = BuildArgs::new(action);
        args.key = self.key.clone();
        args.spec = self.spec;
        args.spec_key = self.spec_key.clone();
        args.overwrite = self.overwrite;
        args.pid = self.pid;
        args.ios_project_path = self.ios_project_path.clone();
        args.pbx_force = self.pbx_force;
        for (name, value) in &self.args {
            args.extra.insert(name.clone(), value.clone());
        }
        args.apply_settings(settings);
        if let Some(spec_type) = &self.spec_type {
            args.spec_type = Platform::parse(spec_type);
        }

        let config = BuildConfig::new(args, &self.output);
        match self.config_root.as_ref().or(settings.config_root.as_ref()) {
            Some(root) => config.with_config_root(root),
            None => config,
        }
    }
}

/// Execute the command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - The settings file or export cannot be read or parsed
/// - The output root or run configuration cannot be written
/// - The project file update fails
pub fn run_cli(cli: &Cli) -> Result<BuildReport> {
    let run = cli.command.run_args();
    let settings = match &run.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = run.build_config(cli.command.action(), &settings);
    info!(input = ?run.input, output = ?config.output_root, "Loading export");

    let spec = load_data_source(&run.input)?;
    let diff = SnapshotDiff::from_path(run.previous.as_deref())?;
    let downloader = HttpDownloader::new();
    let mock = SchemaMockData::new();

    let report = Builder::new(&config, &downloader, &mock)
        .with_diff(&diff)
        .run(&spec);
    downloader.join_all();
    report
}
