use super::types::{
    DataSource, DataType, DocDir, DocFile, DocNode, Field, Interface, Page, Param,
    RawDocNode, SpecInfo, Template, NODE_DIR, NODE_FILE,
};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Error raised while turning an export into a [`NormalizedSpec`].
#[derive(Debug)]
pub enum SpecLoadError {
    /// The export does not have the expected shape
    Malformed(String),
    /// The export carries no document spec
    MissingSpec,
    /// A document node has a `type` code other than file or directory
    UnknownNodeKind {
        /// Node id
        id: i64,
        /// Offending code
        code: i64,
    },
    /// A file node has an unknown `dataSource` code
    UnknownDataSource {
        /// Node id
        id: i64,
        /// Offending code
        code: i64,
    },
}

impl fmt::Display for SpecLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecLoadError::Malformed(msg) => write!(f, "malformed spec export: {msg}"),
            SpecLoadError::MissingSpec => write!(f, "spec export contains no document spec"),
            SpecLoadError::UnknownNodeKind { id, code } => {
                write!(f, "document node {id} has unknown type code {code}")
            }
            SpecLoadError::UnknownDataSource { id, code } => {
                write!(f, "document node {id} has unknown data source code {code}")
            }
        }
    }
}

impl std::error::Error for SpecLoadError {}

#[derive(Debug, Default, Deserialize)]
struct RawSpec {
    #[serde(default)]
    spec: SpecInfo,
    #[serde(default)]
    docs: Vec<RawDocNode>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExport {
    #[serde(default)]
    project: Value,
    #[serde(default)]
    specs: Vec<RawSpec>,
    #[serde(default)]
    interfaces: Vec<Interface>,
    #[serde(default)]
    datatypes: Vec<DataType>,
    #[serde(default)]
    templates: Vec<Template>,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    constraints: Value,
}

/// The typed view of an export that generation runs against.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSpec {
    pub project: Value,
    pub spec: SpecInfo,
    pub docs: Vec<DocNode>,
    pub interfaces: Vec<Interface>,
    /// User data types, the set DataType nodes expand over.
    pub datatypes: Vec<DataType>,
    /// Every data type including system ones, for type resolution.
    pub type_catalog: Vec<DataType>,
    pub datatype_enums: Vec<DataType>,
    pub templates: Vec<Template>,
    pub pages: Vec<Page>,
    pub constraints: Value,
    /// The export as loaded.
    pub raw: Value,
}

impl NormalizedSpec {
    pub fn from_raw(raw: Value) -> Result<Self, SpecLoadError> {
        let export: RawExport = serde_json::from_value(raw.clone())
            .map_err(|e| SpecLoadError::Malformed(e.to_string()))?;
        let RawSpec { spec, docs } = export
            .specs
            .into_iter()
            .next()
            .ok_or(SpecLoadError::MissingSpec)?;
        let docs = docs
            .into_iter()
            .map(convert_node)
            .collect::<Result<Vec<_>, _>>()?;

        let mut catalog = export.datatypes;
        let lookup: HashMap<i64, (String, i64)> = catalog
            .iter()
            .map(|dt| (dt.id, (dt.name.clone(), dt.format)))
            .collect();
        for dt in catalog.iter_mut() {
            dt.fields = dt.params.iter().map(|p| resolve_field(p, &lookup)).collect();
        }
        let datatypes: Vec<DataType> = catalog.iter().filter(|dt| dt.kind == 0).cloned().collect();
        let datatype_enums = datatypes.iter().filter(|dt| dt.is_enum()).cloned().collect();

        let interfaces = export
            .interfaces
            .into_iter()
            .map(|mut itf| {
                itf.method = itf.method.to_uppercase();
                itf
            })
            .collect();

        Ok(NormalizedSpec {
            project: export.project,
            spec,
            docs,
            interfaces,
            datatypes,
            type_catalog: catalog,
            datatype_enums,
            templates: export.templates,
            pages: export.pages,
            constraints: export.constraints,
            raw,
        })
    }
}

fn resolve_field(param: &Param, lookup: &HashMap<i64, (String, i64)>) -> Field {
    let resolved = param.type_id.and_then(|id| lookup.get(&id));
    let type_name = resolved
        .map(|(name, _)| name.clone())
        .or_else(|| param.type_name.clone())
        .unwrap_or_default();
    Field {
        name: param.name.clone(),
        type_name,
        format: resolved.map(|(_, fmt)| *fmt),
        item_is_array: param.is_array,
        arr_dim: u32::from(param.is_array),
        description: param.description.clone(),
    }
}

fn convert_node(raw: RawDocNode) -> Result<DocNode, SpecLoadError> {
    match raw.kind {
        NODE_DIR => {
            let children = raw
                .children
                .into_iter()
                .map(convert_node)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DocNode::Directory(DocDir {
                id: raw.id,
                name: raw.name,
                children,
            }))
        }
        NODE_FILE => {
            let code = raw.data_source.unwrap_or(0);
            let data_source = DataSource::from_code(code)
                .ok_or(SpecLoadError::UnknownDataSource { id: raw.id, code })?;
            Ok(DocNode::File(DocFile {
                id: raw.id,
                name: raw.name,
                mime: raw.mime,
                data_source,
                content: raw.content.unwrap_or_default(),
            }))
        }
        code => Err(SpecLoadError::UnknownNodeKind { id: raw.id, code }),
    }
}

/// Load an export from a JSON or YAML file and normalize it.
pub fn load_data_source(path: &Path) -> anyhow::Result<NormalizedSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec export {path:?}"))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(NormalizedSpec::from_raw(value)?)
}
