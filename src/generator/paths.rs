//! Path handling for rendered names and mock files.

use super::context::RenderContext;
use super::sandbox::Sandbox;
use crate::spec::{DocNode, SpecAttributes};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::error;

/// Join a rendered, `/`-separated name onto `dir`.
///
/// Empty and `.` segments are dropped. `..` pops only segments the rendered
/// name pushed itself, so the result never climbs above `dir`.
pub fn join_rendered(dir: &Path, rendered: &str) -> PathBuf {
    let mut pushed: Vec<&str> = Vec::new();
    for segment in rendered.trim().split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                pushed.pop();
            }
            s => pushed.push(s),
        }
    }
    let mut out = dir.to_path_buf();
    out.extend(pushed);
    out
}

/// Mock data path of an interface URL: `:`, `?`, `&` and `=` become `/_/`
/// and `/data` is appended. Returned without a leading `/`.
pub fn mock_data_path(url: &str) -> String {
    let replaced: String = url
        .chars()
        .map(|c| match c {
            ':' | '?' | '&' | '=' => "/_/".to_string(),
            c => c.to_string(),
        })
        .collect();
    format!("{replaced}/data")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip the extension of the last path segment, from its first `.` on.
pub fn strip_extension(path: &str) -> &str {
    let start = path.rfind('/').map_or(0, |i| i + 1);
    match path[start..].find('.') {
        Some(dot) => &path[..start + dot],
        None => path,
    }
}

/// `path` relative to `root` with `/` separators, if it lies under it.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Directories that play a structural role in the generated project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralRoots {
    pub web_root: Option<PathBuf>,
    pub view_root: Option<PathBuf>,
    pub mock_api_root: Option<PathBuf>,
    pub mock_view_root: Option<PathBuf>,
}

impl StructuralRoots {
    /// Scan the directory nodes for the ids named by the spec attributes.
    /// Names render against the run context; a failing name hides its subtree.
    pub fn discover(
        docs: &[DocNode],
        attributes: Option<&SpecAttributes>,
        output_root: &Path,
        sandbox: &Sandbox,
        context: &RenderContext,
    ) -> Self {
        let mut roots = StructuralRoots::default();
        if let Some(attrs) = attributes {
            roots.scan(docs, attrs, output_root, sandbox, context);
        }
        roots
    }

    fn scan(
        &mut self,
        docs: &[DocNode],
        attrs: &SpecAttributes,
        dir: &Path,
        sandbox: &Sandbox,
        context: &RenderContext,
    ) {
        for node in docs {
            let DocNode::Directory(d) = node else {
                continue;
            };
            let Some(name) = sandbox.render(&d.name, context) else {
                error!(node = %d.name, "Directory name failed to render, subtree not scanned");
                continue;
            };
            let path = join_rendered(dir, &name);
            let id = Some(d.id);
            if id == attrs.web_root {
                self.web_root = Some(path.clone());
            } else if id == attrs.view_root {
                self.view_root = Some(path.clone());
            } else if id == attrs.mock_api_root {
                self.mock_api_root = Some(path.clone());
            } else if id == attrs.mock_view_root {
                self.mock_view_root = Some(path.clone());
            }
            self.scan(&d.children, attrs, &path, sandbox, context);
        }
    }

    /// Output-root-relative form exposed to templates as `config`,
    /// e.g. `/src/mock/`.
    pub fn config_value(&self, output_root: &Path) -> Value {
        let relative = |root: &Option<PathBuf>| {
            root.as_deref()
                .and_then(|p| relative_slash_path(output_root, p))
                .map(|rel| {
                    if rel.is_empty() {
                        "/".to_string()
                    } else {
                        format!("/{rel}/")
                    }
                })
        };
        let mut config = Map::new();
        for (key, root) in [
            ("webRoot", &self.web_root),
            ("viewRoot", &self.view_root),
            ("mockApiRoot", &self.mock_api_root),
            ("mockViewRoot", &self.mock_view_root),
        ] {
            if let Some(rel) = relative(root) {
                config.insert(key.to_string(), Value::String(rel));
            }
        }
        Value::Object(config)
    }
}
