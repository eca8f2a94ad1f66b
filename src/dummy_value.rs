//! Mock payload synthesis from interface and template parameters.

use crate::generator::sandbox::{dynamic_to_json, script_engine};
use crate::spec::{format, DataType, Interface, Param};
use rhai::{Dynamic, Engine, Scope};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// How deep hash and array types are expanded before recursion is cut off with `null`.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// A synthesized payload plus the problems met while producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockData {
    pub json: Value,
    pub errors: Vec<String>,
}

/// Produces mock payloads. Errors are reported in [`MockData::errors`] and
/// are never fatal.
pub trait MockDataProvider {
    fn synthesize(
        &self,
        constraints: &Value,
        res_format: i64,
        params: &[Param],
        datatypes: &[DataType],
    ) -> MockData;

    /// Run the interface's post-processing script over `json`.
    fn apply_script(&self, constraints: &Value, json: Value, interface: &Interface) -> MockData;
}

/// Example values derived from parameter types.
pub struct SchemaMockData {
    engine: Engine,
    max_depth: usize,
}

impl Default for SchemaMockData {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaMockData {
    pub fn new() -> Self {
        Self {
            engine: script_engine(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Example value of a primitive format.
pub fn dummy_value(fmt: i64) -> Value {
    match fmt {
        format::STRING | format::FILE => json!("example"),
        format::NUMBER => json!(42),
        format::BOOLEAN => json!(true),
        _ => Value::Null,
    }
}

/// Coerce an exported default value to the parameter's format.
fn coerce_default(value: &Value, fmt: Option<i64>) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };
    match fmt {
        Some(format::NUMBER) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|n| {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    Some(json!(n as i64))
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number)
                }
            })
            .unwrap_or_else(|| value.clone()),
        Some(format::BOOLEAN) => match s.trim() {
            "true" => json!(true),
            "false" => json!(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

struct Synth<'a> {
    catalog: HashMap<i64, &'a DataType>,
    max_depth: usize,
    errors: Vec<String>,
}

impl<'a> Synth<'a> {
    fn object(&mut self, params: &[Param], depth: usize) -> Value {
        let mut obj = Map::new();
        for param in params {
            let value = self.param(param, depth);
            obj.insert(param.name.clone(), value);
        }
        Value::Object(obj)
    }

    fn param(&mut self, param: &Param, depth: usize) -> Value {
        let datatype = param.type_id.and_then(|id| self.catalog.get(&id).copied());
        let single = match (&param.default_value, datatype) {
            (Some(default), dt) if !default.is_null() && !default.as_str().is_some_and(str::is_empty) => {
                coerce_default(default, dt.map(|dt| dt.format))
            }
            (_, Some(dt)) => self.datatype(dt, depth),
            (_, None) => {
                self.errors.push(match param.type_id {
                    Some(id) => format!("unknown data type {id} for param '{}'", param.name),
                    None => format!("param '{}' has no data type", param.name),
                });
                Value::Null
            }
        };
        if param.is_array {
            Value::Array(vec![single])
        } else {
            single
        }
    }

    fn datatype(&mut self, dt: &DataType, depth: usize) -> Value {
        let nested = matches!(dt.format, format::HASH | format::ARRAY);
        if nested && depth >= self.max_depth {
            return Value::Null;
        }
        match dt.format {
            format::HASH => self.object(&dt.params, depth + 1),
            format::ENUM => dt
                .params
                .first()
                .map(|p| match &p.default_value {
                    Some(v) if !v.is_null() => v.clone(),
                    _ => Value::String(p.name.clone()),
                })
                .unwrap_or(Value::Null),
            format::ARRAY => {
                let item = match dt.params.first() {
                    Some(p) => self.param(p, depth + 1),
                    None => Value::Null,
                };
                Value::Array(vec![item])
            }
            other => dummy_value(other),
        }
    }
}

impl MockDataProvider for SchemaMockData {
    fn synthesize(
        &self,
        _constraints: &Value,
        res_format: i64,
        params: &[Param],
        datatypes: &[DataType],
    ) -> MockData {
        let mut synth = Synth {
            catalog: datatypes.iter().map(|dt| (dt.id, dt)).collect(),
            max_depth: self.max_depth,
            errors: Vec::new(),
        };
        let json = match res_format {
            format::ARRAY => Value::Array(vec![synth.object(params, 0)]),
            format::HASH => synth.object(params, 0),
            _ => match params.first() {
                Some(p) => synth.param(p, 0),
                None => dummy_value(res_format),
            },
        };
        MockData {
            json,
            errors: synth.errors,
        }
    }

    fn apply_script(&self, constraints: &Value, json: Value, interface: &Interface) -> MockData {
        let script = match interface.after_script.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => {
                return MockData {
                    json,
                    errors: Vec::new(),
                }
            }
        };
        let keep = |json: Value, message: String| MockData {
            json,
            errors: vec![format!("afterScript of '{}' failed: {message}", interface.name)],
        };

        let mut scope = Scope::new();
        match (rhai::serde::to_dynamic(&json), rhai::serde::to_dynamic(constraints)) {
            (Ok(payload), Ok(constraints)) => {
                scope.push_dynamic("json", payload);
                scope.push_dynamic("constraints", constraints);
            }
            (Err(e), _) | (_, Err(e)) => return keep(json, e.to_string()),
        }
        let result = match self.engine.eval_with_scope::<Dynamic>(&mut scope, script) {
            Ok(result) => result,
            Err(e) => return keep(json, e.to_string()),
        };
        // A script that only mutates `json` in place evaluates to unit.
        let result = if result.is_unit() {
            scope.get_value::<Dynamic>("json").unwrap_or(result)
        } else {
            result
        };
        match dynamic_to_json(&result) {
            Ok(out) => MockData {
                json: out,
                errors: Vec::new(),
            },
            Err(message) => keep(json, message),
        }
    }
}
