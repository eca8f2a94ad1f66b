//! The data every template renders against.

use crate::config::BuildArgs;
use crate::spec::{DataSource, NormalizedSpec};
use anyhow::{Context as _, Result};
use handlebars::Context;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Render context of one run.
///
/// Top-level keys: `args`, `config`, `project`, `spec`, `datatypeEnums`,
/// `ds`, `_ds`, `interfaceMockRules`, `templateMockRules`. While an
/// entity-bound node expands, one extra key (`interface`, `datatype`,
/// `template` or `view`) holds the current entity.
#[derive(Debug, Clone)]
pub struct RenderContext {
    inner: Context,
}

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<Value> {
    serde_json::to_value(value).with_context(|| format!("Failed to serialize {what}"))
}

impl RenderContext {
    pub fn new(spec: &NormalizedSpec, args: &BuildArgs) -> Result<Self> {
        let mut data = Map::new();
        data.insert("args".to_string(), to_json(args, "run arguments")?);
        data.insert("config".to_string(), json!({}));
        data.insert("project".to_string(), spec.project.clone());
        data.insert("spec".to_string(), to_json(&spec.spec, "spec info")?);
        data.insert(
            "datatypeEnums".to_string(),
            to_json(&spec.datatype_enums, "enum data types")?,
        );
        data.insert(
            "ds".to_string(),
            json!({
                "interfaces": to_json(&spec.interfaces, "interfaces")?,
                "datatypes": to_json(&spec.datatypes, "data types")?,
                "templates": to_json(&spec.templates, "templates")?,
                "pages": to_json(&spec.pages, "pages")?,
                "constraints": spec.constraints,
            }),
        );
        data.insert("_ds".to_string(), spec.raw.clone());
        data.insert("interfaceMockRules".to_string(), json!([]));
        data.insert("templateMockRules".to_string(), json!([]));
        Ok(Self {
            inner: Context::from(Value::Object(data)),
        })
    }

    pub fn data(&self) -> &Value {
        self.inner.data()
    }

    pub(crate) fn as_handlebars(&self) -> &Context {
        &self.inner
    }

    /// Set a top-level key.
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.inner
            .data_mut()
            .as_object_mut()
            .and_then(|data| data.insert(key.to_string(), value))
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner
            .data_mut()
            .as_object_mut()
            .and_then(|data| data.remove(key))
    }

    /// The entity list a data source expands over. DataType nodes flagged
    /// `!!enum` expand over `datatypeEnums` instead of `ds.datatypes`.
    pub fn entities(&self, source: DataSource, enums_only: bool) -> Vec<Value> {
        let pointer = match (source, enums_only) {
            (DataSource::Interface, _) => "/ds/interfaces",
            (DataSource::DataType, true) => "/datatypeEnums",
            (DataSource::DataType, false) => "/ds/datatypes",
            (DataSource::Template, _) => "/ds/templates",
            (DataSource::WebView, _) => "/ds/pages",
            (DataSource::None | DataSource::HandlebarHelper, _) => return Vec::new(),
        };
        self.data()
            .pointer(pointer)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// Bind `entity` under `key`, returning what the key held before.
    pub fn bind(&mut self, key: &str, entity: Value) -> Option<Value> {
        self.insert(key, entity)
    }

    /// Undo a [`bind`](Self::bind).
    pub fn unbind(&mut self, key: &str, previous: Option<Value>) {
        match previous {
            Some(value) => {
                self.insert(key, value);
            }
            None => {
                self.remove(key);
            }
        }
    }
}
