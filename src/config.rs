//! # Run Configuration
//!
//! Everything a generation run is parameterized by: the action (`build` or
//! `update`), the target platform, the arguments exposed to templates as
//! `args`, and where output and persisted run configuration live.
//!
//! An optional YAML settings file supplies defaults; command-line flags win.
//!
//! ```yaml
//! spec_type: ios
//! overwrite: false
//! config_root: .stubsmith
//! pid: 42
//! args:
//!   prefix: NE
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory under the output root holding persisted run configuration.
pub const DEFAULT_CONFIG_DIR: &str = ".stubsmith";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Full generation of a fresh project
    Build,
    /// Incremental regeneration of an existing project
    Update,
}

/// Target platform of the generated project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Web,
    Ios,
    Android,
    Other(String),
}

impl Platform {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "web" => Platform::Web,
            "ios" => Platform::Ios,
            "android" => Platform::Android,
            _ => Platform::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Web => "web",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Other(s) => s,
        }
    }

    /// Platforms whose project manifests list generated files one by one.
    /// Their generated directories are purged and rebuilt on change.
    pub fn tracks_generated_files(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Arguments of a run. Serialized as the `args` object of the render context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArgs {
    pub action: Action,
    /// Project key; its presence marks an incremental run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Re-target the run at a spec, regenerating normal documents on update.
    pub spec: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_key: Option<String>,
    pub spec_type: Platform,
    pub overwrite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_project_path: Option<PathBuf>,
    pub pbx_force: bool,
    /// Free-form `--arg name=value` pairs, reachable from templates as `args.<name>`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildArgs {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            key: None,
            spec: false,
            spec_key: None,
            spec_type: Platform::default(),
            overwrite: false,
            pid: None,
            ios_project_path: None,
            pbx_force: false,
            extra: Map::new(),
        }
    }

    pub fn is_build(&self) -> bool {
        self.action == Action::Build
    }

    pub fn is_incremental(&self) -> bool {
        self.key.is_some()
    }

    /// Whether plain (non entity-bound) documents and binaries are regenerated.
    pub fn normal_docs(&self) -> bool {
        self.is_build() || (self.action == Action::Update && self.spec)
    }

    /// Merge defaults from a settings file. Values already set win.
    pub fn apply_settings(&mut self, settings: &Settings) {
        if self.spec_type == Platform::default() {
            if let Some(spec_type) = &settings.spec_type {
                self.spec_type = Platform::parse(spec_type);
            }
        }
        if !self.overwrite {
            self.overwrite = settings.overwrite.unwrap_or(false);
        }
        if self.pid.is_none() {
            self.pid = settings.pid;
        }
        for (name, value) in &settings.args {
            self.extra
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// Parse `name=value`. Values that parse as JSON keep their type; others are strings.
pub fn parse_arg_pair(raw: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("argument name is empty in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub args: BuildArgs,
    pub output_root: PathBuf,
    /// Where `stubsmith.json` and `server.config.json` are persisted.
    pub config_root: PathBuf,
}

impl BuildConfig {
    pub fn new(args: BuildArgs, output_root: impl Into<PathBuf>) -> Self {
        let output_root = output_root.into();
        let config_root = output_root.join(DEFAULT_CONFIG_DIR);
        Self {
            args,
            output_root,
            config_root,
        }
    }

    pub fn with_config_root(mut self, config_root: impl Into<PathBuf>) -> Self {
        self.config_root = config_root.into();
        self
    }

    /// Directory holding the Xcode project. A given path is taken relative to
    /// the output root; without one the output root itself is used.
    pub fn ios_project_dir(&self) -> PathBuf {
        match &self.args.ios_project_path {
            Some(path) => self.output_root.join(path),
            None => self.output_root.clone(),
        }
    }
}

/// Optional YAML settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spec_type: Option<String>,
    pub overwrite: Option<bool>,
    pub config_root: Option<PathBuf>,
    pub pid: Option<i64>,
    pub args: Map<String, Value>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {path:?}"))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {path:?}"))
    }
}
