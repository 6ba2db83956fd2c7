//! Reference files and config imports.
//!
//! Product, review and image records can live outside the article:
//!
//! - `references: [refs/widget.yaml]` loads YAML partials and merges their
//!   `products`, `reviews` and `images` lists into the article's, index by
//!   index, with the article's own values winning.
//! - `import_products: [widget]` / `import_reviews: [widget]` append records
//!   declared under `[products.<key>]` / `[reviews.<key>]` in the config.
//!
//! Problems here never fail the article: the offending reference or import
//! is skipped and logged.

use crate::front_matter::parse_yaml;
use crate::merge::deep_merge;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const MERGED_KINDS: [&str; 3] = ["products", "reviews", "images"];

/// A string or a list of strings.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Find a reference file next to the article, then from the content root.
fn locate(reference: &str, content_dir: &Path, article_dir: &str) -> Option<PathBuf> {
    let trimmed = reference.trim_start_matches('/');
    let candidates = [
        content_dir.join(article_dir).join(trimmed),
        content_dir.join(trimmed),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

/// Merge `incoming` into `front[kind]` index by index; existing values win.
fn merge_indexed(front: &mut Map<String, Value>, kind: &str, incoming: Vec<Value>) {
    let existing = match front.remove(kind) {
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    let len = existing.len().max(incoming.len());
    let mut existing = existing.into_iter();
    let mut incoming = incoming.into_iter();
    let merged: Vec<Value> = (0..len)
        .filter_map(|_| match (incoming.next(), existing.next()) {
            (Some(base), Some(own)) => Some(deep_merge(base, own)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        })
        .collect();
    front.insert(kind.to_string(), Value::Array(merged));
}

/// Load every file named in `references` and merge its records.
///
/// Returns the number of references that were skipped.
pub fn resolve_references(
    front: &mut Map<String, Value>,
    content_dir: &Path,
    article_dir: &str,
    rel_path: &str,
) -> usize {
    let mut skipped = 0;
    for reference in string_list(front.get("references")) {
        let Some(path) = locate(&reference, content_dir, article_dir) else {
            tracing::error!(path = %rel_path, reference = %reference, "reference file not found");
            skipped += 1;
            continue;
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_yaml(&text).map_err(|e| e.to_string()));
        let data = match parsed {
            Ok(Value::Object(map)) => map,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(path = %rel_path, reference = %reference, error = %e, "unreadable reference");
                skipped += 1;
                continue;
            }
        };
        for kind in MERGED_KINDS {
            if let Some(Value::Array(items)) = data.get(kind) {
                merge_indexed(front, kind, items.clone());
            }
        }
    }
    skipped
}

/// Append records imported by key from config.
///
/// Returns the number of imports that were skipped (duplicate or unknown
/// keys).
pub fn resolve_imports(
    front: &mut Map<String, Value>,
    products: &BTreeMap<String, Value>,
    reviews: &BTreeMap<String, Value>,
    rel_path: &str,
) -> usize {
    let mut skipped = 0;
    for (field, kind, source) in [
        ("import_products", "products", products),
        ("import_reviews", "reviews", reviews),
    ] {
        let mut seen = BTreeSet::new();
        let mut imported = Vec::new();
        for key in string_list(front.get(field)) {
            if !seen.insert(key.clone()) {
                tracing::error!(path = %rel_path, key = %key, field, "duplicate import");
                skipped += 1;
                continue;
            }
            match source.get(&key) {
                Some(record) => imported.push(record.clone()),
                None => {
                    tracing::error!(path = %rel_path, key = %key, field, "unknown import key");
                    skipped += 1;
                }
            }
        }
        if imported.is_empty() {
            continue;
        }
        let list = front
            .entry(kind.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !list.is_array() {
            *list = Value::Array(vec![list.take()]);
        }
        if let Value::Array(items) = list {
            items.extend(imported);
        }
    }
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use serde_json::json;
    use tempfile::TempDir;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn reference_merges_by_index_with_article_winning() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "reviews/refs/widget.yaml",
            "products:\n  - name: Widget\n    brand: Acme\n  - name: Gadget\nreviews:\n  - rating: 4\n",
        );
        let mut front = map(json!({
            "references": "refs/widget.yaml",
            "products": [{"name": "Widget Pro"}]
        }));

        let skipped = resolve_references(&mut front, tmp.path(), "reviews", "reviews/w.md");
        assert_eq!(skipped, 0);
        assert_eq!(
            front["products"],
            json!([{"name": "Widget Pro", "brand": "Acme"}, {"name": "Gadget"}])
        );
        assert_eq!(front["reviews"], json!([{"rating": 4}]));
    }

    #[test]
    fn reference_found_from_content_root() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "shared/img.yaml", "images:\n  - src: a.png\n");
        let mut front = map(json!({"references": ["/shared/img.yaml"]}));
        resolve_references(&mut front, tmp.path(), "deep/dir", "deep/dir/a.md");
        assert_eq!(front["images"], json!([{"src": "a.png"}]));
    }

    #[test]
    fn missing_reference_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut front = map(json!({"references": ["nope.yaml"], "products": [{"name": "A"}]}));
        assert_eq!(resolve_references(&mut front, tmp.path(), "", "a.md"), 1);
        assert_eq!(front["products"], json!([{"name": "A"}]));
    }

    #[test]
    fn imports_append_and_skip_bad_keys() {
        let mut products = BTreeMap::new();
        products.insert("widget".to_string(), json!({"name": "Widget"}));
        let reviews = BTreeMap::new();
        let mut front = map(json!({
            "import_products": ["widget", "widget", "ghost"],
            "import_reviews": ["widget"],
            "products": [{"name": "Own"}]
        }));

        let skipped = resolve_imports(&mut front, &products, &reviews, "a.md");
        assert_eq!(skipped, 3);
        assert_eq!(front["products"], json!([{"name": "Own"}, {"name": "Widget"}]));
        assert!(!front.contains_key("reviews"));
    }
}
