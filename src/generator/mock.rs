//! Mock data files and mock-server routing rules.

use super::helpers::pretty_json;
use super::paths::{join_rendered, mock_data_path, strip_extension};
use super::walker::{ensure_parent, WalkReport};
use super::writer::OutputWriter;
use crate::dummy_value::{MockData, MockDataProvider};
use crate::providers::FileSystem;
use crate::spec::{format, NormalizedSpec, Page};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::error;

/// Pass-through filter written next to every mock payload.
pub const DEFAULT_MOCK_FILTER: &str = "module.exports = function (json) {\n\treturn json;\n}";

/// Route from an interface to its mock payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRule {
    pub id: i64,
    pub path: String,
    /// Payload stem relative to the mock API root.
    pub mock_file: String,
    pub method: String,
}

/// Route from a page to the templates it renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRule {
    pub method: String,
    pub path: String,
    /// JSON array of `{id, path}` entries.
    pub list: String,
    pub name: String,
}

fn log_errors(mock: &MockData, subject: &str) {
    if !mock.errors.is_empty() {
        error!(subject = %subject, errors = %mock.errors.join(", "), "Mock data synthesis reported errors");
    }
}

/// Writes mock payloads and filters under the run's overwrite policy.
pub struct MockWriter<'a> {
    fs: &'a dyn FileSystem,
    writer: &'a OutputWriter<'a>,
    provider: &'a dyn MockDataProvider,
    report: WalkReport,
}

impl<'a> MockWriter<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        writer: &'a OutputWriter<'a>,
        provider: &'a dyn MockDataProvider,
    ) -> Self {
        Self {
            fs,
            writer,
            provider,
            report: WalkReport::default(),
        }
    }

    pub fn into_report(self) -> WalkReport {
        self.report
    }

    fn output(&mut self, path: PathBuf, content: &str) {
        if let Err(err) = ensure_parent(self.fs, &path) {
            error!(path = ?path, error = %err, "Failed to create mock directory");
            self.report.failed += 1;
            return;
        }
        let result = self.writer.write(&path, content, false);
        self.report.record(&path, result);
    }

    fn output_pair(&mut self, stem: &Path, json: &Value) {
        match pretty_json(json, b"    ") {
            Ok(body) => self.output(with_suffix(stem, ".json"), &body),
            Err(err) => {
                error!(stem = ?stem, error = %err, "Failed to serialize mock payload");
                self.report.failed += 1;
            }
        }
        self.output(with_suffix(stem, ".js"), DEFAULT_MOCK_FILTER);
    }

    /// Payload and filter per interface, returning the routing rules.
    pub fn interface_mocks(&mut self, spec: &NormalizedSpec, mock_api_root: &Path) -> Vec<MockRule> {
        let mut rules = Vec::with_capacity(spec.interfaces.len());
        for itf in &spec.interfaces {
            let method = itf.method.to_lowercase();
            let mock_file = format!("{method}/{}", mock_data_path(&itf.path));
            let stem = join_rendered(mock_api_root, &mock_file);

            let mock = self.provider.synthesize(
                &spec.constraints,
                itf.res_format,
                &itf.params.outputs,
                &spec.type_catalog,
            );
            log_errors(&mock, &itf.name);
            let mock = self.provider.apply_script(&spec.constraints, mock.json, itf);
            log_errors(&mock, &itf.name);

            self.output_pair(&stem, &mock.json);
            rules.push(MockRule {
                id: itf.id,
                path: itf.path.clone(),
                mock_file,
                method: method.to_uppercase(),
            });
        }
        rules
    }

    /// Payload and filter per template some page references.
    pub fn template_mocks(&mut self, spec: &NormalizedSpec, mock_view_root: &Path) {
        let view_ext = spec.spec.view_ext.as_deref().unwrap_or_default();
        for tpl in &spec.templates {
            let referenced = spec.pages.iter().flat_map(|p| &p.templates).any(|used| {
                used.path == tpl.path || format!("{}.{view_ext}", tpl.path) == used.path
            });
            if !referenced {
                continue;
            }
            let mut json = if tpl.params.is_empty() {
                json!({})
            } else {
                let mock = self.provider.synthesize(
                    &spec.constraints,
                    format::HASH,
                    &tpl.params,
                    &spec.type_catalog,
                );
                log_errors(&mock, &tpl.name);
                mock.json
            };
            if let Some(obj) = json.as_object_mut() {
                default_text(obj, "title", &tpl.name);
                default_text(obj, "description", &tpl.description);
            }
            let stem = join_rendered(mock_view_root, strip_extension(&tpl.path));
            self.output_pair(&stem, &json);
        }
    }
}

fn default_text(obj: &mut serde_json::Map<String, Value>, key: &str, fallback: &str) {
    let present = obj.get(key).is_some_and(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    });
    if !present {
        obj.insert(key.to_string(), Value::String(fallback.to_string()));
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut os = stem.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// One GET rule per page that has a path and templates.
pub fn view_rules(pages: &[Page]) -> Vec<ViewRule> {
    pages
        .iter()
        .filter(|page| !page.path.is_empty() && !page.templates.is_empty())
        .map(|page| {
            let list: Vec<Value> = page
                .templates
                .iter()
                .map(|tpl| json!({"id": tpl.id, "path": strip_extension(&tpl.path)}))
                .collect();
            ViewRule {
                method: "GET".to_string(),
                path: page.path.clone(),
                list: Value::Array(list).to_string(),
                name: page.name.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_value::SchemaMockData;
    use crate::providers::LocalFs;
    use crate::spec::{Interface, InterfaceParams, Param, SpecInfo, Template};
    use tempfile::tempdir;

    fn spec() -> NormalizedSpec {
        let string = crate::spec::DataType {
            id: 10001,
            name: "String".to_string(),
            format: format::STRING,
            kind: 1,
            ..Default::default()
        };
        let name = Param {
            name: "name".to_string(),
            type_id: Some(10001),
            ..Default::default()
        };
        NormalizedSpec {
            spec: SpecInfo {
                view_ext: Some("ftl".to_string()),
                ..Default::default()
            },
            interfaces: vec![Interface {
                id: 1,
                name: "getUser".to_string(),
                method: "GET".to_string(),
                path: "/user/:id".to_string(),
                params: InterfaceParams {
                    inputs: vec![],
                    outputs: vec![name.clone()],
                },
                ..Default::default()
            }],
            templates: vec![
                Template {
                    id: 5,
                    name: "Index".to_string(),
                    path: "index".to_string(),
                    description: "home".to_string(),
                    ..Default::default()
                },
                Template {
                    id: 6,
                    name: "Unused".to_string(),
                    path: "unused.ftl".to_string(),
                    ..Default::default()
                },
            ],
            pages: vec![
                Page {
                    id: 9,
                    name: "home".to_string(),
                    path: "/home".to_string(),
                    templates: vec![Template {
                        id: 5,
                        path: "index.ftl".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                Page {
                    id: 10,
                    name: "empty".to_string(),
                    path: "/empty".to_string(),
                    ..Default::default()
                },
            ],
            type_catalog: vec![string],
            ..Default::default()
        }
    }

    #[test]
    fn test_interface_mock_files_and_rule() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(&LocalFs, false);
        let provider = SchemaMockData::new();
        let mut mocks = MockWriter::new(&LocalFs, &writer, &provider);
        let rules = mocks.interface_mocks(&spec(), dir.path());

        assert_eq!(
            rules,
            vec![MockRule {
                id: 1,
                path: "/user/:id".to_string(),
                mock_file: "get/user/_/id/data".to_string(),
                method: "GET".to_string(),
            }]
        );
        let stem = dir.path().join("get/user/_/id/data");
        let body = std::fs::read_to_string(with_suffix(&stem, ".json")).unwrap();
        assert_eq!(body, "{\n    \"name\": \"example\"\n}");
        let filter = std::fs::read_to_string(with_suffix(&stem, ".js")).unwrap();
        assert_eq!(filter, DEFAULT_MOCK_FILTER);
        assert_eq!(mocks.into_report().written.len(), 2);
    }

    #[test]
    fn test_only_referenced_templates_get_mocks() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(&LocalFs, false);
        let provider = SchemaMockData::new();
        let mut mocks = MockWriter::new(&LocalFs, &writer, &provider);
        mocks.template_mocks(&spec(), dir.path());

        let body: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("index.json")).unwrap())
                .unwrap();
        assert_eq!(body, json!({"title": "Index", "description": "home"}));
        assert!(!dir.path().join("unused.json").exists());
    }

    #[test]
    fn test_view_rules() {
        let rules = view_rules(&spec().pages);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].method, "GET");
        assert_eq!(rules[0].path, "/home");
        assert_eq!(rules[0].list, r#"[{"id":5,"path":"index"}]"#);
    }
}
