use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Data type format codes used by the export.
pub mod format {
    pub const HASH: i64 = 0;
    pub const ENUM: i64 = 1;
    pub const ARRAY: i64 = 2;
    pub const STRING: i64 = 3;
    pub const NUMBER: i64 = 4;
    pub const BOOLEAN: i64 = 5;
    pub const FILE: i64 = 6;
}

/// Raw `type` code of a file node.
pub const NODE_FILE: i64 = 0;
/// Raw `type` code of a directory node.
pub const NODE_DIR: i64 = 1;

static TEXT_MIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(text/.+)|(application/json)$").expect("text mime regex should be valid")
});

/// How a file node expands over domain entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    None,
    Interface,
    DataType,
    Template,
    WebView,
    HandlebarHelper,
}

impl DataSource {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DataSource::None),
            1 => Some(DataSource::Interface),
            2 => Some(DataSource::DataType),
            3 => Some(DataSource::Template),
            4 => Some(DataSource::WebView),
            5 => Some(DataSource::HandlebarHelper),
            _ => None,
        }
    }

    /// Context key the bound entity is exposed under while this source expands.
    pub fn binding_key(self) -> Option<&'static str> {
        match self {
            DataSource::Interface => Some("interface"),
            DataSource::DataType => Some("datatype"),
            DataSource::Template => Some("template"),
            DataSource::WebView => Some("view"),
            DataSource::None | DataSource::HandlebarHelper => None,
        }
    }
}

/// A node of the document tree. Names and contents are Handlebars templates.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Directory(DocDir),
    File(DocFile),
}

impl DocNode {
    pub fn id(&self) -> i64 {
        match self {
            DocNode::Directory(dir) => dir.id,
            DocNode::File(file) => file.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DocNode::Directory(dir) => &dir.name,
            DocNode::File(file) => &file.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocDir {
    pub id: i64,
    pub name: String,
    pub children: Vec<DocNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocFile {
    pub id: i64,
    pub name: String,
    pub mime: Option<String>,
    pub data_source: DataSource,
    /// Template text for text files, asset URL for binary ones.
    pub content: String,
}

impl DocFile {
    /// Text files are rendered; everything else is downloaded from `content`.
    pub fn is_text(&self) -> bool {
        self.mime
            .as_deref()
            .map_or(true, |mime| TEXT_MIME.is_match(mime))
    }
}

/// Document node exactly as it appears in the export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocNode {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub data_source: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub children: Vec<RawDocNode>,
}

/// A request/response parameter or data type member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    #[serde(default)]
    pub name: String,
    /// Id of the referenced data type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceParams {
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub res_format: i64,
    #[serde(default)]
    pub params: InterfaceParams,
    /// Post-processing script applied to the synthesized mock payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_script: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Member of a data type, resolved against the type catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<i64>,
    pub item_is_array: bool,
    pub arr_dim: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub format: i64,
    /// 0 for user types; system and anonymous types are non-zero.
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_deserializing)]
    pub fields: Vec<Field>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataType {
    pub fn is_enum(&self) -> bool {
        self.format == format::ENUM
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ids of the directories that act as per-platform roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecAttributes {
    #[serde(default)]
    pub web_root: Option<i64>,
    #[serde(default)]
    pub view_root: Option<i64>,
    #[serde(default)]
    pub mock_api_root: Option<i64>,
    #[serde(default)]
    pub mock_view_root: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub engine: Option<Value>,
    #[serde(default)]
    pub view_ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SpecAttributes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts `true`/`false`, `0`/`1` and their string forms.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}
