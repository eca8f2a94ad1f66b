//! Sandboxed template compiler.
//!
//! One [`Sandbox`] exists per generation run. It owns a Handlebars registry
//! holding the built-in helpers plus every helper authored in the document
//! tree. Spec-authored helpers are Rhai scripts evaluated by a restricted
//! engine: no file, network, process or environment access, no `eval` or
//! `import`, and bounded operations, call depth and collection sizes.

use super::context::RenderContext;
use super::helpers;
use crate::spec::{DataSource, DocNode};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderError, RenderErrorReason, ScopedJson,
};
use rhai::{Dynamic, Engine, Scope, AST};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

const MAX_OPERATIONS: u64 = 1_000_000;
const MAX_CALL_LEVELS: usize = 64;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_STRING_SIZE: usize = 4 * 1024 * 1024;
const MAX_COLLECTION_SIZE: usize = 100_000;

/// A restricted script engine.
///
/// Rhai's standard packages have no file, network or process access; module
/// imports and `eval` are disabled on top of that.
pub fn script_engine() -> Engine {
    let mut engine = Engine::new();
    engine
        .set_max_operations(MAX_OPERATIONS)
        .set_max_call_levels(MAX_CALL_LEVELS)
        .set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH)
        .set_max_string_size(MAX_STRING_SIZE)
        .set_max_array_size(MAX_COLLECTION_SIZE)
        .set_max_map_size(MAX_COLLECTION_SIZE)
        .disable_symbol("eval")
        .disable_symbol("import");
    engine.on_print(|text| debug!(target: "stubsmith::script", "{text}"));
    engine.on_debug(|text, source, pos| {
        debug!(target: "stubsmith::script", source = ?source, position = ?pos, "{text}")
    });
    engine
}

/// Failure to register a script helper.
#[derive(Debug)]
pub enum SandboxError {
    /// The helper name is empty after stripping the extension
    EmptyName(String),
    /// The script does not parse
    Script { name: String, message: String },
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::EmptyName(node) => {
                write!(f, "helper node '{node}' does not yield a helper name")
            }
            SandboxError::Script { name, message } => {
                write!(f, "helper '{name}' failed to compile: {message}")
            }
        }
    }
}

impl std::error::Error for SandboxError {}

/// Helper name for a helper document node: its file stem.
pub fn helper_name(node_name: &str) -> Option<String> {
    let stem = Path::new(node_name.trim()).file_stem()?.to_str()?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Convert a script result back into JSON.
pub(crate) fn dynamic_to_json(value: &Dynamic) -> Result<Value, String> {
    if value.is_unit() {
        return Ok(Value::Null);
    }
    rhai::serde::from_dynamic::<Value>(value).map_err(|e| e.to_string())
}

struct ScriptHelper {
    name: String,
    engine: Arc<Engine>,
    ast: AST,
}

impl HelperDef for ScriptHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut handlebars::RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let params: Vec<Value> = h.params().iter().map(|p| p.value().clone()).collect();
        let hash: Map<String, Value> = h
            .hash()
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.value().clone()))
            .collect();

        let failure = |message: String| -> RenderError {
            RenderErrorReason::Other(format!("helper '{}' failed: {message}", self.name)).into()
        };
        let params = rhai::serde::to_dynamic(&params).map_err(|e| failure(e.to_string()))?;
        let hash = rhai::serde::to_dynamic(&hash).map_err(|e| failure(e.to_string()))?;
        let mut scope = Scope::new();
        scope.push_dynamic("params", params);
        scope.push_dynamic("hash", hash);

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|e| failure(e.to_string()))?;
        let json = dynamic_to_json(&result).map_err(failure)?;
        Ok(ScopedJson::Derived(json))
    }
}

/// The helper registry and template compiler of one run.
pub struct Sandbox {
    registry: Handlebars<'static>,
    engine: Arc<Engine>,
    script_helpers: Vec<String>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// A sandbox with only the built-in helpers.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        helpers::register_builtins(&mut registry);
        Self {
            registry,
            engine: Arc::new(script_engine()),
            script_helpers: Vec::new(),
        }
    }

    /// A sandbox with the built-ins and every helper authored in `docs`.
    pub fn with_helpers(docs: &[DocNode]) -> Self {
        let mut sandbox = Self::new();
        sandbox.load_helpers(docs);
        sandbox
    }

    /// Compile `source` and register it under `name`, replacing any helper of
    /// that name.
    pub fn register_script_helper(&mut self, name: &str, source: &str) -> Result<(), SandboxError> {
        if name.is_empty() {
            return Err(SandboxError::EmptyName(name.to_string()));
        }
        let ast = self.engine.compile(source).map_err(|e| SandboxError::Script {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        self.registry.register_helper(
            name,
            Box::new(ScriptHelper {
                name: name.to_string(),
                engine: Arc::clone(&self.engine),
                ast,
            }),
        );
        if !self.script_helpers.iter().any(|n| n == name) {
            self.script_helpers.push(name.to_string());
        }
        Ok(())
    }

    /// Register every HandlebarHelper file node, depth-first in tree order.
    /// Failures are logged and skipped. Returns the number registered.
    pub fn load_helpers(&mut self, docs: &[DocNode]) -> usize {
        let mut registered = 0;
        for node in docs {
            match node {
                DocNode::Directory(dir) => registered += self.load_helpers(&dir.children),
                DocNode::File(file) if file.data_source == DataSource::HandlebarHelper => {
                    let result = match helper_name(&file.name) {
                        Some(name) => self.register_script_helper(&name, &file.content),
                        None => Err(SandboxError::EmptyName(file.name.clone())),
                    };
                    match result {
                        Ok(()) => {
                            debug!(helper = %file.name, "Registered script helper");
                            registered += 1;
                        }
                        Err(err) => error!(node = %file.name, error = %err, "Helper registration failed"),
                    }
                }
                DocNode::File(_) => {}
            }
        }
        registered
    }

    /// Names of the script helpers registered so far.
    pub fn script_helpers(&self) -> &[String] {
        &self.script_helpers
    }

    /// Render `template` against `data`. Failures are logged and yield `None`.
    pub fn compile<T: Serialize>(&self, template: &str, data: &T) -> Option<String> {
        logged(template, self.registry.render_template(template, data))
    }

    /// Render `template` against the run context without re-serializing it.
    pub fn render(&self, template: &str, context: &RenderContext) -> Option<String> {
        logged(
            template,
            self.registry
                .render_template_with_context(template, context.as_handlebars()),
        )
    }
}

fn logged(template: &str, result: Result<String, RenderError>) -> Option<String> {
    match result {
        Ok(rendered) => Some(rendered),
        Err(err) => {
            error!(template = %preview(template), error = %err, "Template compilation failed");
            None
        }
    }
}

fn preview(template: &str) -> String {
    const LIMIT: usize = 80;
    match template.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &template[..idx]),
        None => template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_helper_name_is_file_stem() {
        assert_eq!(helper_name("upperSnake.rhai").as_deref(), Some("upperSnake"));
        assert_eq!(helper_name("plain").as_deref(), Some("plain"));
        assert_eq!(helper_name(""), None);
    }

    #[test]
    fn test_script_helper_receives_params_and_hash() {
        let mut sb = Sandbox::new();
        sb.register_script_helper("join", r#"params[0] + hash.sep + params[1]"#)
            .unwrap();
        let out = sb.compile("{{join a b sep=\"-\"}}", &json!({"a": "x", "b": "y"}));
        assert_eq!(out.as_deref(), Some("x-y"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let mut sb = Sandbox::new();
        let err = sb.register_script_helper("broken", "let = ;").unwrap_err();
        assert!(matches!(err, SandboxError::Script { .. }));
        assert!(sb.script_helpers().is_empty());
    }

    #[test]
    fn test_runtime_failure_yields_none() {
        let mut sb = Sandbox::new();
        sb.register_script_helper("boom", r#"throw "nope""#).unwrap();
        assert_eq!(sb.compile("{{boom}}", &json!({})), None);
        assert_eq!(sb.compile("ok", &json!({})).as_deref(), Some("ok"));
    }

    #[test]
    fn test_runaway_script_is_stopped() {
        let mut sb = Sandbox::new();
        sb.register_script_helper("spin", "loop { }").unwrap();
        assert_eq!(sb.compile("{{spin}}", &json!({})), None);
    }

    #[test]
    fn test_eval_is_disabled() {
        let mut sb = Sandbox::new();
        assert!(sb.register_script_helper("ev", r#"eval("1")"#).is_err());
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let sb = Sandbox::new();
        assert_eq!(sb.compile("[{{nothing.here}}]", &json!({})).as_deref(), Some("[]"));
        assert_eq!(sb.compile("{{a}}", &json!({"a": "<b>"})).as_deref(), Some("&lt;b&gt;"));
    }
}
