//! Front matter layering.
//!
//! An article's effective front matter is built from four layers, lowest
//! precedence first:
//!
//! ```text
//! builtin defaults → type defaults → layout defaults → the file's own front matter
//! ```
//!
//! Every layer is folded in with [`deep_merge`], which is also used when an
//! article pulls records in from referenced YAML partials.

use serde_json::Value;

/// Merge `overlay` on top of `base`.
///
/// - Objects merge key-by-key, recursively.
/// - Arrays are unioned: base items keep their order, overlay items not
///   already present are appended.
/// - Anything else (scalars, or two values of different kinds) is replaced
///   by the overlay. A `null` overlay still wins.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            for item in overlay_items {
                if !base_items.contains(&item) {
                    base_items.push(item);
                }
            }
            Value::Array(base_items)
        }
        (_, overlay) => overlay,
    }
}

/// Fold a sequence of layers, lowest precedence first.
pub fn layer<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Default::default()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_last_wins() {
        assert_eq!(deep_merge(json!(1), json!(2)), json!(2));
        assert_eq!(deep_merge(json!("a"), json!(null)), json!(null));
    }

    #[test]
    fn objects_merge_recursively() {
        let merged = deep_merge(
            json!({"a": 1, "nested": {"x": 1, "y": 2}}),
            json!({"b": 2, "nested": {"y": 3}}),
        );
        assert_eq!(merged, json!({"a": 1, "b": 2, "nested": {"x": 1, "y": 3}}));
    }

    #[test]
    fn arrays_union_without_duplicates() {
        let merged = deep_merge(json!(["a", "b"]), json!(["b", "c"]));
        assert_eq!(merged, json!(["a", "b", "c"]));
    }

    #[test]
    fn mixed_kinds_take_overlay() {
        assert_eq!(deep_merge(json!(["a"]), json!("b")), json!("b"));
        assert_eq!(deep_merge(json!({"a": 1}), json!([1])), json!([1]));
    }

    #[test]
    fn layer_respects_precedence() {
        let merged = layer([
            json!({"layout": "base", "tags": ["site"]}),
            json!({"layout": "post"}),
            json!({"tags": ["rust"], "title": "Hi"}),
        ]);
        assert_eq!(
            merged,
            json!({"layout": "post", "tags": ["site", "rust"], "title": "Hi"})
        );
    }
}
