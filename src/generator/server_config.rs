//! Persisted run configuration: `stubsmith.json` and `server.config.json`.

use super::helpers::pretty_json;
use super::mock::{MockRule, ViewRule};
use super::paths::StructuralRoots;
use crate::config::{Action, BuildConfig};
use crate::providers::FileSystem;
use crate::spec::NormalizedSpec;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::debug;

pub const ENGINE_CONFIG_FILE: &str = "stubsmith.json";
pub const SERVER_CONFIG_FILE: &str = "server.config.json";

/// Server settings a user may have edited; kept across updates.
pub const PRESERVED_FIELDS: [&str; 5] = ["launch", "port", "online", "fmpp", "apiResHeaders"];

const DEFAULT_PORT: u16 = 8002;

/// A mock-server routing rule.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum ServerRule<'a> {
    View(&'a ViewRule),
    Mock(&'a MockRule),
}

impl ServerRule<'_> {
    pub fn path(&self) -> &str {
        match self {
            ServerRule::View(rule) => &rule.path,
            ServerRule::Mock(rule) => &rule.path,
        }
    }
}

/// View rules then interface rules, stable-sorted by descending path so the
/// most specific routes match first.
pub fn sorted_rules<'a>(views: &'a [ViewRule], mocks: &'a [MockRule]) -> Vec<ServerRule<'a>> {
    let mut rules: Vec<ServerRule<'a>> = views
        .iter()
        .map(ServerRule::View)
        .chain(mocks.iter().map(ServerRule::Mock))
        .collect();
    rules.sort_by(|a, b| b.path().cmp(a.path()));
    rules
}

/// Arguments a later `update` run needs to find the project again.
pub fn engine_config(config: &BuildConfig) -> Value {
    let args = &config.args;
    let mut out = Map::new();
    out.insert("specType".to_string(), json!(args.spec_type.as_str()));
    if let Some(pid) = args.pid {
        out.insert("pid".to_string(), json!(pid));
    }
    if let Some(key) = &args.key {
        out.insert("key".to_string(), json!(key));
    }
    if let Some(spec_key) = &args.spec_key {
        out.insert("specKey".to_string(), json!(spec_key));
    }
    if let Some(path) = &args.ios_project_path {
        out.insert("iosProjectPath".to_string(), json!(path.to_string_lossy()));
    }
    json!({ "args": out })
}

/// Read the existing server config, if any.
pub fn read_existing(fs: &dyn FileSystem, path: &Path) -> Option<Value> {
    let content = fs.read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&content) {
        Ok(value) if value.is_object() => Some(value),
        _ => {
            debug!(path = ?path, "Existing server config unreadable, using defaults");
            None
        }
    }
}

pub fn server_config(
    config: &BuildConfig,
    roots: &StructuralRoots,
    spec: &NormalizedSpec,
    rules: &[ServerRule<'_>],
    existing: Option<&Value>,
) -> Value {
    let mut out = Map::new();
    let path_value = |p: &Option<std::path::PathBuf>| match p {
        Some(p) => json!(p.to_string_lossy()),
        None => Value::Null,
    };
    out.insert(
        "outputRoot".to_string(),
        json!(config.output_root.to_string_lossy()),
    );
    out.insert("webRoot".to_string(), path_value(&roots.web_root));
    out.insert("viewRoot".to_string(), path_value(&roots.view_root));
    out.insert("mockApiRoot".to_string(), path_value(&roots.mock_api_root));
    out.insert("mockViewRoot".to_string(), path_value(&roots.mock_view_root));
    out.insert(
        "engine".to_string(),
        spec.spec.engine.clone().unwrap_or(Value::Null),
    );
    out.insert("viewExt".to_string(), json!(spec.spec.view_ext));
    out.insert("rules".to_string(), json!(rules));
    out.insert("projectKey".to_string(), json!(config.args.key));

    out.insert("launch".to_string(), json!(true));
    out.insert("port".to_string(), json!(DEFAULT_PORT));
    out.insert("online".to_string(), json!(false));
    if config.args.action == Action::Update {
        if let Some(existing) = existing.and_then(Value::as_object) {
            for field in PRESERVED_FIELDS {
                if let Some(value) = existing.get(field) {
                    out.insert(field.to_string(), value.clone());
                }
            }
        }
    }
    Value::Object(out)
}

/// Four-space pretty JSON with a trailing newline.
pub fn render_config(value: &Value) -> serde_json::Result<String> {
    Ok(pretty_json(value, b"    ")? + "\n")
}
