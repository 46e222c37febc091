//! The JSON-shaped exchange format components decode into and are
//! recompiled from. `ecsdb/src/json.rs` makes the same choice — bridge a
//! binary, schema-typed representation into `serde_json::Value` rather than
//! a bespoke tree type — and this crate follows it directly.

use serde_json::{json, Map, Value};

/// Builds the `{"Type": ..., "Data": ...}` shape every non-leaf value in
/// this format takes.
pub fn object(type_name: &str, data: Value) -> Value {
    json!({ "Type": type_name, "Data": data })
}

/// `{"Type": "<ref>", "Data": "<decimal db-id, or external resource id>"}`.
pub fn reference(id: impl Into<String>) -> Value {
    object("<ref>", Value::String(id.into()))
}

/// A collection value. `ElementType` is omitted entirely when `items` is
/// empty, matching the original encoder: an empty list never carries an
/// element type key.
pub fn list(element_type_name: &str, items: Vec<Value>) -> Value {
    let mut map = Map::new();
    map.insert("Type".into(), Value::String("<collection>".into()));
    if !items.is_empty() {
        map.insert("ElementType".into(), Value::String(element_type_name.into()));
    }
    map.insert("Data".into(), Value::Array(items));
    Value::Object(map)
}

/// A `StdMapType::Pair` entry used for maps keyed by a builtin scalar.
pub fn map_pair(key: impl Into<String>, value: Value) -> Value {
    object("StdMapType::Pair", json!({ "Key": key.into(), "Value": value }))
}

/// Structural equality between two component trees, used by the recompile
/// flow to decide whether an edited material actually changed before
/// treating it as an update. `serde_json::Value`'s `PartialEq` already
/// compares objects order-independently, so this is a thin, documented
/// wrapper rather than a hand-rolled walk.
pub fn compare_jsons(a: &Value, b: &Value) -> bool {
    a != b
}

/// Right-biased recursive merge: `rhs` wins field-by-field, but an empty
/// object or array on `rhs` resets `lhs` rather than merging into it, and a
/// `null` element in an `rhs` array leaves the corresponding `lhs` element
/// untouched (used to let a descendant's diff skip over fields it does not
/// override).
pub fn compose_jsons(lhs: &mut Value, rhs: &Value) {
    match (lhs, rhs) {
        (Value::Object(lmap), Value::Object(rmap)) => {
            if rmap.is_empty() {
                lmap.clear();
                return;
            }
            for (key, rval) in rmap {
                match lmap.get_mut(key) {
                    Some(lval) => compose_jsons(lval, rval),
                    None => {
                        lmap.insert(key.clone(), rval.clone());
                    }
                }
            }
        }
        (Value::Array(larr), Value::Array(rarr)) => {
            if rarr.is_empty() {
                larr.clear();
                return;
            }
            for (i, rval) in rarr.iter().enumerate() {
                if rval.is_null() {
                    continue;
                }
                match larr.get_mut(i) {
                    Some(lval) => compose_jsons(lval, rval),
                    None => larr.push(rval.clone()),
                }
            }
        }
        (lhs_slot, rhs_val) => {
            *lhs_slot = rhs_val.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_overwrites_leaves() {
        let mut lhs = json!({"Type": "Foo", "Data": {"X": "1"}});
        let rhs = json!({"Type": "Foo", "Data": {"X": "2"}});
        compose_jsons(&mut lhs, &rhs);
        assert_eq!(lhs["Data"]["X"], "2");
    }

    #[test]
    fn compose_preserves_fields_rhs_does_not_mention() {
        let mut lhs = json!({"Data": {"X": "1", "Y": "keep"}});
        let rhs = json!({"Data": {"X": "2"}});
        compose_jsons(&mut lhs, &rhs);
        assert_eq!(lhs["Data"]["Y"], "keep");
        assert_eq!(lhs["Data"]["X"], "2");
    }

    #[test]
    fn compose_empty_object_resets() {
        let mut lhs = json!({"Data": {"X": "1"}});
        let rhs = json!({"Data": {}});
        compose_jsons(&mut lhs, &rhs);
        assert_eq!(lhs["Data"], json!({}));
    }

    #[test]
    fn compose_array_skips_null_entries() {
        let mut lhs = json!(["a", "b", "c"]);
        let rhs = json!([null, "B", null]);
        compose_jsons(&mut lhs, &rhs);
        assert_eq!(lhs, json!(["a", "B", "c"]));
    }

    #[test]
    fn empty_list_omits_element_type() {
        let v = list("int32", vec![]);
        assert!(v.get("ElementType").is_none());
        let v = list("int32", vec![Value::String("1".into())]);
        assert_eq!(v["ElementType"], "int32");
    }

    #[test]
    fn compare_detects_changes() {
        let a = json!({"X": 1});
        let b = json!({"X": 2});
        assert!(compare_jsons(&a, &b));
        assert!(!compare_jsons(&a, &a.clone()));
    }
}
