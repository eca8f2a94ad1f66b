//! Built-in Handlebars helpers available to every document template.

use crate::spec::format;
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, HelperResult, Output,
    RenderContext, RenderError, RenderErrorReason, Renderable, ScopedJson,
};
use serde::Serialize;
use serde_json::Value;

/// Register the built-in helper set on a registry.
pub fn register_builtins(registry: &mut Handlebars<'_>) {
    registry.register_helper("raw", Box::new(RawHelper));
    registry.register_helper("ifCond", Box::new(IfCondHelper));
    registry.register_helper("typeName", Box::new(TypeNameHelper));
    registry.register_helper("iosProperty", Box::new(IosPropertyHelper));
    registry.register_helper("extname", Box::new(extname));
    registry.register_helper("hyphenToUnderline", Box::new(hyphen_to_underline));
    registry.register_helper("hyphenToCamel", Box::new(hyphen_to_camel));
    registry.register_helper("camelToHyphen", Box::new(camel_to_hyphen));
    registry.register_helper("lowerFirst", Box::new(lower_first));
    registry.register_helper("upperFirst", Box::new(upper_first));
    registry.register_helper("noLineBreak", Box::new(no_line_break));
    registry.register_helper("prettifyComment", Box::new(prettify_comment));
    registry.register_helper("JSONStringify", Box::new(json_stringify));
}

handlebars_helper!(extname: |s: str| match s.rfind('.') {
    Some(idx) => s[idx + 1..].to_string(),
    None => s.to_string(),
});

handlebars_helper!(hyphen_to_underline: |s: str| {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c == '-' {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
});

handlebars_helper!(hyphen_to_camel: |s: str| {
    s.split('-').map(upper_first_str).collect::<String>()
});

handlebars_helper!(camel_to_hyphen: |s: str| {
    let mut chunks: Vec<String> = Vec::new();
    for c in s.chars() {
        if c.is_ascii_uppercase() || chunks.is_empty() {
            chunks.push(String::new());
        }
        if let Some(last) = chunks.last_mut() {
            last.push(c.to_ascii_lowercase());
        }
    }
    chunks.join("-")
});

handlebars_helper!(lower_first: |s: str| {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
});

handlebars_helper!(upper_first: |s: str| upper_first_str(s));

handlebars_helper!(no_line_break: |s: str, {sep: str = ","}| s.replace('\n', sep));

handlebars_helper!(prettify_comment: |s: str| format!(" * {}", s.split('\n').collect::<Vec<_>>().join("\n * ")));

handlebars_helper!(json_stringify: |obj: Json| to_tab_json(obj));

fn upper_first_str(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Pretty JSON with a custom indent.
pub fn pretty_json(value: &Value, indent: &[u8]) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pretty JSON indented with tabs.
pub fn to_tab_json(value: &Value) -> String {
    pretty_json(value, b"\t").unwrap_or_default()
}

/// JavaScript truthiness over JSON values.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_number(a) == as_number(b),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => a == b,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

/// Evaluate `v1 <op> v2` the way the `ifCond` helper does.
pub(crate) fn eval_condition(v1: &Value, op: &str, v2: &Value) -> Option<bool> {
    use std::cmp::Ordering::{Equal, Greater, Less};
    let result = match op {
        "==" => loose_eq(v1, v2),
        "===" => v1 == v2,
        "<" => compare(v1, v2) == Some(Less),
        "<=" => matches!(compare(v1, v2), Some(Less | Equal)),
        ">" => compare(v1, v2) == Some(Greater),
        ">=" => matches!(compare(v1, v2), Some(Greater | Equal)),
        "&&" => is_truthy(v1) && is_truthy(v2),
        "||" => is_truthy(v1) || is_truthy(v2),
        _ => return None,
    };
    Some(result)
}

fn param_value<'a>(h: &'a Helper<'_>, idx: usize) -> &'a Value {
    h.param(idx).map_or(&Value::Null, |p| p.value())
}

/// Renders its block without interpreting it; pairs with `{{{{raw}}}}` blocks.
pub struct RawHelper;

impl HelperDef for RawHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        match h.template() {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

/// `{{#ifCond a "<=" b}}…{{else}}…{{/ifCond}}`
pub struct IfCondHelper;

impl HelperDef for IfCondHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let op = param_value(h, 1).as_str().unwrap_or_default();
        let holds = eval_condition(param_value(h, 0), op, param_value(h, 2)).unwrap_or(false);
        let branch = if holds { h.template() } else { h.inverse() };
        match branch {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

/// Format a type name with array nesting: `T[][]` or `List<List<T>>`.
pub(crate) fn format_type_name(ty: &str, arr_dim: u64, use_list: bool) -> String {
    let dim = usize::try_from(arr_dim).unwrap_or(0);
    if dim == 0 {
        ty.to_string()
    } else if use_list {
        format!("{}{}{}", "List<".repeat(dim), ty, ">".repeat(dim))
    } else {
        format!("{}{}", ty, "[]".repeat(dim))
    }
}

fn json_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `{{typeName model useList=true}}` or `{{typeName type=t arrDim=n useList=true}}`
pub struct TypeNameHelper;

impl HelperDef for TypeNameHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let hash = |key: &str| h.hash_get(key).map(|v| v.value().clone()).unwrap_or(Value::Null);
        let model = param_value(h, 0);
        let (ty, arr_dim) = match model.get("type") {
            Some(ty) => (ty.clone(), model.get("arrDim").cloned().unwrap_or(Value::Null)),
            None => (hash("type"), hash("arrDim")),
        };
        let use_list = hash("useList") == Value::Bool(true);
        let Some(ty) = json_to_text(&ty) else {
            return Ok(ScopedJson::Derived(Value::Null));
        };
        let arr_dim = as_number(&arr_dim).map_or(0, |n| n.max(0.0) as u64);
        Ok(ScopedJson::Derived(Value::String(format_type_name(
            &ty, arr_dim, use_list,
        ))))
    }
}

fn ios_property_line(field: &Value, prefix: &str, has_prefix: bool) -> String {
    let text = |key: &str| field.get(key).and_then(json_to_text).unwrap_or_default();
    let fmt = field.get("format").and_then(Value::as_i64);
    let (ref_name, no_star) = if field.get("itemIsArray").is_some_and(is_truthy) {
        ("strong", false)
    } else {
        match fmt {
            Some(format::NUMBER) | Some(format::BOOLEAN) => ("assign", true),
            Some(format::STRING) => ("copy", false),
            _ => ("strong", false),
        }
    };
    let ty = if fmt == Some(format::HASH) && has_prefix {
        format!("{prefix}{}", text("type"))
    } else {
        text("type")
    };
    format!(
        "/**\n *  {}\n */\n@property (nonatomic, {ref_name}) {ty} {}{};",
        text("description"),
        if no_star { "" } else { "*" },
        text("name"),
    )
}

/// Objective-C `@property` declarations for a data type's fields.
pub struct IosPropertyHelper;

impl HelperDef for IosPropertyHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let has_prefix = is_truthy(param_value(h, 1));
        let prefix = ctx
            .data()
            .pointer("/args/prefix")
            .and_then(json_to_text)
            .unwrap_or_default();
        let rendered = match param_value(h, 0) {
            Value::Object(datatype) => match datatype.get("fields") {
                Some(Value::Array(fields)) => fields
                    .iter()
                    .map(|f| ios_property_line(f, &prefix, has_prefix))
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => return Ok(ScopedJson::Derived(Value::Null)),
            },
            Value::Array(fields) => fields
                .iter()
                .map(|f| ios_property_line(f, &prefix, has_prefix))
                .collect::<Vec<_>>()
                .join(","),
            Value::Null => {
                return Err(RenderErrorReason::ParamNotFoundForIndex("iosProperty", 0).into())
            }
            _ => return Ok(ScopedJson::Derived(Value::Null)),
        };
        Ok(ScopedJson::Derived(Value::String(rendered)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: &Value) -> String {
        let mut hb = Handlebars::new();
        register_builtins(&mut hb);
        hb.render_template(template, data).unwrap()
    }

    #[test]
    fn test_string_helpers() {
        let data = json!({"s": "a--b-c", "n": "lib/x.tar.gz", "c": "AbcDefGhi", "w": "userName"});
        assert_eq!(render("{{hyphenToUnderline s}}", &data), "a_b_c");
        assert_eq!(render("{{hyphenToCamel s}}", &data), "ABC");
        assert_eq!(render("{{extname n}}", &data), "gz");
        assert_eq!(render("{{camelToHyphen c}}", &data), "abc-def-ghi");
        assert_eq!(render("{{upperFirst w}}", &data), "UserName");
        assert_eq!(render("{{lowerFirst c}}", &data), "abcDefGhi");
    }

    #[test]
    fn test_no_line_break_and_comment() {
        let data = json!({"d": "one\ntwo"});
        assert_eq!(render("{{noLineBreak d}}", &data), "one,two");
        assert_eq!(render("{{noLineBreak d sep=\";\"}}", &data), "one;two");
        assert_eq!(render("{{prettifyComment d}}", &data), " * one\n * two");
    }

    #[test]
    fn test_if_cond() {
        let data = json!({"a": 3, "b": "3", "c": 5});
        assert_eq!(render("{{#ifCond a \"==\" b}}y{{else}}n{{/ifCond}}", &data), "y");
        assert_eq!(render("{{#ifCond a \"===\" b}}y{{else}}n{{/ifCond}}", &data), "n");
        assert_eq!(render("{{#ifCond a \"<\" c}}y{{else}}n{{/ifCond}}", &data), "y");
        assert_eq!(render("{{#ifCond a \"??\" c}}y{{else}}n{{/ifCond}}", &data), "n");
    }

    #[test]
    fn test_type_name() {
        let data = json!({"f": {"type": "String", "arrDim": 2}, "t": "Pet"});
        assert_eq!(render("{{typeName f}}", &data), "String[][]");
        assert_eq!(render("{{{typeName f useList=true}}}", &data), "List<List<String>>");
        assert_eq!(render("{{typeName type=t arrDim=1}}", &data), "Pet[]");
        assert_eq!(render("{{typeName type=t}}", &data), "Pet");
    }

    #[test]
    fn test_ios_property() {
        let data = json!({
            "args": {"prefix": "NE"},
            "dt": {"fields": [
                {"name": "age", "type": "NSNumber", "format": 4, "description": "years"},
                {"name": "owner", "type": "User", "format": 0, "description": "who"}
            ]}
        });
        let out = render("{{{iosProperty dt true}}}", &data);
        assert!(out.contains("@property (nonatomic, assign) NSNumber age;"));
        assert!(out.contains("@property (nonatomic, strong) NEUser *owner;"));
    }

    #[test]
    fn test_raw_block_and_json() {
        let data = json!({"o": {"k": 1}});
        assert_eq!(render("{{{{raw}}}}{{x}}{{{{/raw}}}}", &data), "{{x}}");
        assert_eq!(render("{{{JSONStringify o}}}", &data), "{\n\t\"k\": 1\n}");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert_eq!(eval_condition(&json!(null), "||", &json!("x")), Some(true));
    }
}
