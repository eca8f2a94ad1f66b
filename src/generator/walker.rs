//! Document tree walker.
//!
//! Interprets the document tree depth-first, expanding each node into zero,
//! one or many files. Every failure is contained at the node (or entity)
//! where it happens; siblings keep generating.

use super::context::RenderContext;
use super::paths::join_rendered;
use super::sandbox::Sandbox;
use super::writer::{OutputWriter, WriteDirective, WriteOutcome};
use crate::config::BuildArgs;
use crate::providers::{DiffResult, Downloader, FileSystem};
use crate::spec::{DataSource, DocFile, DocNode};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span, error, info};

/// Marker in a DataType node name selecting enum data types.
pub const ENUM_FLAG: &str = "!!enum";

/// What a run regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegenerationPolicy {
    /// Plain documents and binaries are (re)generated.
    pub normal_docs: bool,
    /// Interface and DataType output directories are purged before the
    /// first expansion into them.
    pub purge_generated_dirs: bool,
}

impl RegenerationPolicy {
    pub fn new(args: &BuildArgs, diff: DiffResult) -> Self {
        Self {
            normal_docs: args.normal_docs(),
            purge_generated_dirs: args.is_incremental()
                && args.spec_type.tracks_generated_files()
                && diff.any_changed(),
        }
    }
}

/// What a walk produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub written: Vec<PathBuf>,
    pub skipped_existing: Vec<PathBuf>,
    /// Files whose name rendered empty.
    pub suppressed: usize,
    /// Units that produced nothing because of an error.
    pub failed: usize,
    pub downloads: Vec<PathBuf>,
    pub purged_dirs: Vec<PathBuf>,
    /// Output directories of Interface and DataType nodes, unique, in visit order.
    pub tracked_dirs: Vec<PathBuf>,
}

impl WalkReport {
    /// Record the result of a write attempted for `path`.
    pub fn record(&mut self, path: &Path, result: io::Result<WriteOutcome>) {
        match result {
            Ok(WriteOutcome::Written(p)) => self.written.push(p),
            Ok(WriteOutcome::SkippedExisting(p)) => self.skipped_existing.push(p),
            Err(err) => {
                error!(path = ?path, error = %err, "Failed to write file");
                self.failed += 1;
            }
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: WalkReport) {
        self.written.extend(other.written);
        self.skipped_existing.extend(other.skipped_existing);
        self.suppressed += other.suppressed;
        self.failed += other.failed;
        self.downloads.extend(other.downloads);
        self.purged_dirs.extend(other.purged_dirs);
        for dir in other.tracked_dirs {
            if !self.tracked_dirs.contains(&dir) {
                self.tracked_dirs.push(dir);
            }
        }
    }
}

/// Create the parent directory of `path` (directive markers stripped).
pub(crate) fn ensure_parent(fs: &dyn FileSystem, path: &Path) -> io::Result<()> {
    let (_, target) = WriteDirective::resolve(path);
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs.create_dir_all(parent),
        _ => Ok(()),
    }
}

pub struct DocTreeWalker<'a> {
    sandbox: &'a Sandbox,
    context: &'a mut RenderContext,
    fs: &'a dyn FileSystem,
    downloader: &'a dyn Downloader,
    writer: OutputWriter<'a>,
    policy: RegenerationPolicy,
    purged: HashSet<PathBuf>,
    report: WalkReport,
}

impl<'a> DocTreeWalker<'a> {
    pub fn new(
        sandbox: &'a Sandbox,
        context: &'a mut RenderContext,
        fs: &'a dyn FileSystem,
        downloader: &'a dyn Downloader,
        overwrite: bool,
        policy: RegenerationPolicy,
    ) -> Self {
        Self {
            sandbox,
            context,
            fs,
            downloader,
            writer: OutputWriter::new(fs, overwrite),
            policy,
            purged: HashSet::new(),
            report: WalkReport::default(),
        }
    }

    /// Walk `nodes` into `dir`.
    pub fn walk(&mut self, nodes: &[DocNode], dir: &Path) {
        for node in nodes {
            let span = debug_span!("doc_node", id = node.id(), name = %node.name());
            let _enter = span.enter();
            match node {
                DocNode::Directory(d) => self.walk_directory(&d.name, &d.children, dir),
                DocNode::File(file) => self.walk_file(file, dir),
            }
        }
    }

    pub fn report(&self) -> &WalkReport {
        &self.report
    }

    pub fn into_report(self) -> WalkReport {
        self.report
    }

    fn walk_directory(&mut self, name: &str, children: &[DocNode], dir: &Path) {
        let Some(rendered) = self.sandbox.render(name, self.context) else {
            self.report.failed += 1;
            return;
        };
        let path = join_rendered(dir, &rendered);
        if let Err(err) = self.fs.create_dir_all(&path) {
            error!(dir = ?path, error = %err, "Failed to create directory, subtree skipped");
            self.report.failed += 1;
            return;
        }
        self.walk(children, &path);
    }

    fn walk_file(&mut self, file: &DocFile, dir: &Path) {
        if !file.is_text() && self.policy.normal_docs {
            self.fetch_binary(file, dir);
            return;
        }
        match file.data_source {
            DataSource::HandlebarHelper => {}
            DataSource::None => {
                if self.policy.normal_docs {
                    self.emit(file, &file.name, dir);
                }
            }
            DataSource::Interface => {
                self.prepare_generated_dir(dir);
                self.expand(file, &file.name, DataSource::Interface, false, dir);
            }
            DataSource::DataType => {
                self.prepare_generated_dir(dir);
                if file.name.contains(ENUM_FLAG) {
                    let name = file.name.replace(ENUM_FLAG, "");
                    self.expand(file, &name, DataSource::DataType, true, dir);
                } else {
                    self.expand(file, &file.name, DataSource::DataType, false, dir);
                }
            }
            DataSource::Template => {
                self.expand(file, &file.name, DataSource::Template, false, dir);
            }
            DataSource::WebView => {
                self.expand(file, &file.name, DataSource::WebView, false, dir);
            }
        }
    }

    fn fetch_binary(&mut self, file: &DocFile, dir: &Path) {
        let Some(name) = self.rendered_name(&file.name) else {
            return;
        };
        let path = join_rendered(dir, &name);
        if self.fs.exists(&path) {
            debug!(path = ?path, "Binary exists, not downloaded");
            self.report.skipped_existing.push(path);
            return;
        }
        if let Err(err) = ensure_parent(self.fs, &path) {
            error!(path = ?path, error = %err, "Failed to create directory for download");
        }
        self.downloader.download(&file.content, &path);
        self.report.downloads.push(path);
    }

    /// Remove and recreate `dir` once per run when the policy asks for it, and
    /// track it for the project-file update.
    fn prepare_generated_dir(&mut self, dir: &Path) {
        if self.policy.purge_generated_dirs && self.purged.insert(dir.to_path_buf()) {
            let purged = self
                .fs
                .remove_dir_all(dir)
                .and_then(|()| self.fs.create_dir_all(dir));
            match purged {
                Ok(()) => {
                    info!(dir = ?dir, "Purged generated directory");
                    self.report.purged_dirs.push(dir.to_path_buf());
                }
                Err(err) => error!(dir = ?dir, error = %err, "Failed to purge generated directory"),
            }
        }
        if !self.report.tracked_dirs.iter().any(|d| d == dir) {
            self.report.tracked_dirs.push(dir.to_path_buf());
        }
    }

    fn expand(
        &mut self,
        file: &DocFile,
        name: &str,
        source: DataSource,
        enums_only: bool,
        dir: &Path,
    ) {
        let Some(key) = source.binding_key() else {
            return;
        };
        for entity in self.context.entities(source, enums_only) {
            let previous = self.context.bind(key, entity);
            self.emit(file, name, dir);
            self.context.unbind(key, previous);
        }
    }

    fn rendered_name(&mut self, name: &str) -> Option<String> {
        let rendered = match self.sandbox.render(name, self.context) {
            Some(rendered) if !rendered.trim().is_empty() => rendered,
            _ => {
                debug!(name = %name, "File name rendered empty, skipped");
                self.report.suppressed += 1;
                return None;
            }
        };
        Some(rendered)
    }

    /// Render one file against the current context and write it.
    fn emit(&mut self, file: &DocFile, name: &str, dir: &Path) {
        let Some(rendered) = self.rendered_name(name) else {
            return;
        };
        let Some(content) = self.sandbox.render(&file.content, self.context) else {
            self.report.failed += 1;
            return;
        };
        let path = join_rendered(dir, &rendered);
        if let Err(err) = ensure_parent(self.fs, &path) {
            error!(path = ?path, error = %err, "Failed to create parent directory");
            self.report.failed += 1;
            return;
        }
        let result = self.writer.write(&path, &content, false);
        self.report.record(&path, result);
    }
}
