//! Run orchestration.
//!
//! 1. Register helpers and build the render context
//! 2. Locate the structural roots and expose them as `config`
//! 3. On incremental runs: diff, mock data and routing rules
//! 4. Walk the document tree
//! 5. On incremental runs: persist run config and update the project file

use super::context::RenderContext;
use super::mock::{view_rules, MockRule, MockWriter, ViewRule};
use super::paths::StructuralRoots;
use super::sandbox::Sandbox;
use super::server_config::{
    engine_config, read_existing, render_config, server_config, sorted_rules,
    ENGINE_CONFIG_FILE, SERVER_CONFIG_FILE,
};
use super::walker::{DocTreeWalker, RegenerationPolicy, WalkReport};
use super::writer::OutputWriter;
use crate::config::{Action, BuildConfig, Platform};
use crate::dummy_value::MockDataProvider;
use crate::providers::{
    DiffProvider, DiffResult, Downloader, FileSystem, LocalFs, LoggingProjectUpdater,
    ProjectFileUpdater, ProjectManifest,
};
use crate::spec::NormalizedSpec;
use anyhow::{Context, Result};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span};

/// Outcome of a [`Builder::run`].
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Files of the tree walk and the mock data together.
    pub files: WalkReport,
    pub diff: Option<DiffResult>,
    pub roots: StructuralRoots,
    pub helpers: usize,
    pub interface_rules: usize,
    pub view_rules: usize,
    pub config_files: Vec<PathBuf>,
    pub project_updated: bool,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = &self.files;
        writeln!(f, "written:   {}", files.written.len())?;
        writeln!(f, "kept:      {}", files.skipped_existing.len())?;
        writeln!(f, "empty:     {}", files.suppressed)?;
        writeln!(f, "failed:    {}", files.failed)?;
        writeln!(f, "downloads: {}", files.downloads.len())?;
        if !files.purged_dirs.is_empty() {
            writeln!(f, "purged:    {}", files.purged_dirs.len())?;
        }
        if !self.config_files.is_empty() {
            writeln!(
                f,
                "rules:     {} interface, {} view",
                self.interface_rules, self.view_rules
            )?;
        }
        if self.project_updated {
            writeln!(f, "project file updated")?;
        }
        Ok(())
    }
}

/// Runs one generation against a normalized spec.
pub struct Builder<'a> {
    config: &'a BuildConfig,
    downloader: &'a dyn Downloader,
    mock: &'a dyn MockDataProvider,
    fs: &'a dyn FileSystem,
    diff: &'a dyn DiffProvider,
    project: &'a dyn ProjectFileUpdater,
}

impl<'a> Builder<'a> {
    /// A builder on the local disk that treats everything as changed and only
    /// logs project-file updates.
    pub fn new(
        config: &'a BuildConfig,
        downloader: &'a dyn Downloader,
        mock: &'a dyn MockDataProvider,
    ) -> Self {
        Self {
            config,
            downloader,
            mock,
            fs: &LocalFs,
            diff: &DiffResult::ALL,
            project: &LoggingProjectUpdater,
        }
    }

    pub fn with_fs(mut self, fs: &'a dyn FileSystem) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_diff(mut self, diff: &'a dyn DiffProvider) -> Self {
        self.diff = diff;
        self
    }

    pub fn with_project_updater(mut self, project: &'a dyn ProjectFileUpdater) -> Self {
        self.project = project;
        self
    }

    pub fn run(&self, spec: &NormalizedSpec) -> Result<BuildReport> {
        let config = self.config;
        let args = &config.args;
        let output_root = &config.output_root;
        let span = info_span!("build", action = ?args.action, output = ?output_root);
        let _enter = span.enter();

        let sandbox = Sandbox::with_helpers(&spec.docs);
        let mut context = RenderContext::new(spec, args)?;
        let roots = StructuralRoots::discover(
            &spec.docs,
            spec.spec.attributes.as_ref(),
            output_root,
            &sandbox,
            &context,
        );
        context.insert("config", roots.config_value(output_root));

        self.fs
            .create_dir_all(output_root)
            .with_context(|| format!("Failed to create output root {output_root:?}"))?;

        let mut report = BuildReport {
            helpers: sandbox.script_helpers().len(),
            ..Default::default()
        };
        let diff = if args.is_incremental() {
            let diff = self.diff.diff(spec);
            info!(
                interface_changed = diff.interface_changed,
                datatype_changed = diff.datatype_changed,
                "Computed diff"
            );
            report.diff = Some(diff);
            diff
        } else {
            DiffResult::default()
        };

        let writer = OutputWriter::new(self.fs, args.overwrite);
        let mut interface_rules = Vec::new();
        let mut views = Vec::new();
        if args.is_incremental() {
            let mut mocks = MockWriter::new(self.fs, &writer, self.mock);
            if let Some(root) = &roots.mock_api_root {
                interface_rules = mocks.interface_mocks(spec, root);
            }
            if let Some(root) = &roots.mock_view_root {
                mocks.template_mocks(spec, root);
            }
            views = view_rules(&spec.pages);
            report.files.merge(mocks.into_report());
            context.insert("interfaceMockRules", json!(interface_rules));
            context.insert("templateMockRules", json!(views));
        }

        let policy = RegenerationPolicy::new(args, diff);
        let mut walker = DocTreeWalker::new(
            &sandbox,
            &mut context,
            self.fs,
            self.downloader,
            args.overwrite,
            policy,
        );
        walker.walk(&spec.docs, output_root);
        report.files.merge(walker.into_report());

        if args.is_incremental() {
            report.config_files = self.write_run_config(spec, &roots, &views, &interface_rules)?;
            report.interface_rules = interface_rules.len();
            report.view_rules = views.len();
            if args.spec_type == Platform::Ios {
                report.project_updated = self.update_project(diff, &report.files.tracked_dirs)?;
            }
        }
        report.roots = roots;

        info!(
            written = report.files.written.len(),
            kept = report.files.skipped_existing.len(),
            failed = report.files.failed,
            "Generation finished"
        );
        Ok(report)
    }

    fn write_run_config(
        &self,
        spec: &NormalizedSpec,
        roots: &StructuralRoots,
        views: &[ViewRule],
        interface_rules: &[MockRule],
    ) -> Result<Vec<PathBuf>> {
        let config_root = &self.config.config_root;
        self.fs
            .create_dir_all(config_root)
            .with_context(|| format!("Failed to create config root {config_root:?}"))?;
        let writer = OutputWriter::new(self.fs, true);

        let engine_path = config_root.join(ENGINE_CONFIG_FILE);
        let engine = render_config(&engine_config(self.config))?;
        writer
            .write(&engine_path, &engine, true)
            .with_context(|| format!("Failed to write {engine_path:?}"))?;

        let server_path = config_root.join(SERVER_CONFIG_FILE);
        let existing = read_existing(self.fs, &server_path);
        let rules = sorted_rules(views, interface_rules);
        let server = server_config(self.config, roots, spec, &rules, existing.as_ref());
        writer
            .write(&server_path, &render_config(&server)?, true)
            .with_context(|| format!("Failed to write {server_path:?}"))?;

        info!(dir = ?config_root, "Wrote run configuration");
        Ok(vec![engine_path, server_path])
    }

    fn update_project(&self, diff: DiffResult, tracked_dirs: &[PathBuf]) -> Result<bool> {
        let args = &self.config.args;
        let wanted = args.is_build()
            || (args.action == Action::Update && (diff.any_changed() || args.pbx_force));
        if !wanted {
            info!("Interfaces and data types unchanged, project file left alone");
            return Ok(false);
        }
        let project_dir = self.config.ios_project_dir();
        let Some(manifest) = ProjectManifest::locate(self.fs, &project_dir) else {
            info!(dir = ?project_dir, "No Xcode project to update");
            return Ok(false);
        };
        self.project
            .update(&manifest, tracked_dirs)
            .with_context(|| format!("Failed to update {:?}", manifest.pbxproj))?;
        Ok(true)
    }
}
