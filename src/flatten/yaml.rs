//! YAML flattening
//!
//! Mappings are recursed with `.`-joined keys. Scalars keep their type; sequences
//! and other non-scalar leaves are stringified as compact JSON. Tagged values are
//! unwrapped to their inner value. Multiple documents merge in order.

use crate::domain::FlatMap;
use serde::Deserialize;
use serde_json::{Number, Value};
use serde_yaml::Value as YamlValue;

pub fn parse_yaml(text: &str) -> Result<FlatMap, String> {
    let mut out = FlatMap::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = YamlValue::deserialize(document).map_err(|e| e.to_string())?;
        match untag(&value) {
            YamlValue::Null => {}
            YamlValue::Mapping(_) => flatten_into(&value, "", &mut out),
            other => {
                return Err(format!("document root must be a mapping, found {}", kind(other)));
            }
        }
    }
    Ok(out)
}

fn flatten_into(value: &YamlValue, prefix: &str, out: &mut FlatMap) {
    let YamlValue::Mapping(mapping) = untag(value) else {
        return;
    };
    for (k, v) in mapping {
        let segment = key_text(k);
        let key = if prefix.is_empty() { segment } else { format!("{prefix}.{segment}") };
        match untag(v) {
            YamlValue::Mapping(_) => flatten_into(v, &key, out),
            leaf => {
                out.insert(key, scalar(leaf));
            }
        }
    }
}

fn untag(value: &YamlValue) -> &YamlValue {
    match value {
        YamlValue::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn key_text(key: &YamlValue) -> String {
    match untag(key) {
        YamlValue::String(s) => s.clone(),
        other => {
            let json = to_json(other);
            match json {
                Value::String(s) => s,
                v => v.to_string(),
            }
        }
    }
}

fn scalar(value: &YamlValue) -> Value {
    match untag(value) {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => number(n),
        YamlValue::String(s) => Value::String(s.clone()),
        other => Value::String(to_json(other).to_string()),
    }
}

fn number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn to_json(value: &YamlValue) -> Value {
    match untag(value) {
        YamlValue::Sequence(items) => Value::Array(items.iter().map(to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut object = serde_json::Map::new();
            for (k, v) in mapping {
                object.insert(key_text(k), to_json(v));
            }
            Value::Object(object)
        }
        leaf => scalar(leaf),
    }
}

fn kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "boolean",
        YamlValue::Number(_) => "number",
        YamlValue::String(_) => "string",
        YamlValue::Sequence(_) => "sequence",
        YamlValue::Mapping(_) => "mapping",
        YamlValue::Tagged(_) => "tagged value",
    }
}
