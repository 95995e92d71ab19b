//! Conversion between flat dotted keys and nested trees

use crate::domain::FlatMap;
use serde_json::{Map, Value};

/// Rebuild a nested tree by splitting keys on `.`.
///
/// A scalar sitting where a later key needs an intermediate object is replaced
/// by that object.
pub fn unflatten(flat: &FlatMap) -> Value {
    let mut root = Map::new();
    for (key, value) in flat {
        put_nested(&mut root, key, value.clone());
    }
    Value::Object(root)
}

fn put_nested(root: &mut Map<String, Value>, key: &str, value: Value) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().unwrap_or(key);

    let mut current = root;
    for part in parts {
        let slot = current.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), value);
}

/// Flatten a nested JSON tree back into dotted keys. Non-object leaves are kept
/// as-is; empty objects disappear.
pub fn flatten_tree(tree: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(tree, "", &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten_into(v, &key, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), leaf.clone());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> FlatMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unflatten_builds_tree() {
        let tree = unflatten(&flat(json!({
            "server.port": 8080,
            "server.ssl.enabled": true,
            "name": "svc"
        })));
        assert_eq!(
            tree,
            json!({"server": {"port": 8080, "ssl": {"enabled": true}}, "name": "svc"})
        );
    }

    #[test]
    fn test_scalar_replaced_by_object() {
        let tree = unflatten(&flat(json!({"a": "x", "a.b": "y"})));
        assert_eq!(tree, json!({"a": {"b": "y"}}));
    }

    #[test]
    fn test_round_trip() {
        let original = flat(json!({
            "spring.datasource.url": "jdbc:h2:mem",
            "spring.datasource.username": "sa",
            "feature.enabled": false,
            "retries": 3
        }));
        similar_asserts::assert_eq!(flatten_tree(&unflatten(&original)), original);
    }
}
