//! Turns one content file into an [`Article`].
//!
//! 1. Split off and parse the YAML front matter.
//! 2. Settle the type: explicit `type`, else the first matching `[[types]]`
//!    rule, else `default_type`.
//! 3. Find the layout across the layout directories.
//! 4. Layer the front matter: builtin → type defaults → layout defaults →
//!    the file's own.
//! 5. Materialize the multi-format fields.
//!
//! Any failure here is fatal for the article.

use super::{Article, ArticleError, LayoutRef};
use crate::config::CompiledType;
use crate::front_matter::{extract, extract_from_comment};
use crate::markup::MultiFormat;
use crate::merge::layer;
use crate::site::Site;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const LAYOUT_EXTENSION: &str = "hbs";

/// Read and build an article from a file under the content directory.
pub fn build_article(path: &Path, site: &Site) -> Result<Article, ArticleError> {
    let text = std::fs::read_to_string(path)?;
    let rel_path = relative_path(path, &site.content_dir());
    build_from_text(path, &rel_path, &text, site)
}

/// `/`-separated path of `path` below `root`, or the file name when it is
/// not below it.
pub fn relative_path(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Build from already-read text.
pub fn build_from_text(
    path: &Path,
    rel_path: &str,
    text: &str,
    site: &Site,
) -> Result<Article, ArticleError> {
    let (front, body) = extract(text)?;
    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();

    let rule = infer_type(&front, &file_name, rel_path, site)?;
    let type_name = rule.rule.name.clone();

    let layout_name = front
        .get("layout")
        .and_then(Value::as_str)
        .or(rule.rule.layout.as_deref())
        .unwrap_or(&type_name)
        .to_string();
    let layout = resolve_layout(&layout_name, &site.layout_dirs())?;
    let layout_text = std::fs::read_to_string(&layout.path)?;
    let (layout_defaults, _) = extract_from_comment(&layout_text)?;

    let merged = layer([
        builtin_defaults(site),
        Value::Object(rule.rule.defaults.clone()),
        layout_defaults,
        front,
    ]);
    let front_matter = match merged {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut article = Article {
        rel_path: rel_path.to_string(),
        source_path: path.to_path_buf(),
        file_name,
        type_name,
        plain: rule.rule.plain,
        layout,
        content: MultiFormat::from_markdown(body),
        ..Default::default()
    };
    apply_multiformat(&mut article, &front_matter, &site.config.content.multiformat);
    article.front_matter = front_matter;

    tracing::debug!(path = %article.rel_path, r#type = %article.type_name, "built");
    Ok(article)
}

fn builtin_defaults(site: &Site) -> Value {
    let mut map = Map::new();
    map.insert("lang".into(), Value::String(site.config.site.lang.clone()));
    map.insert(
        site.config.taxonomy.keyword_field.clone(),
        Value::Array(Vec::new()),
    );
    Value::Object(map)
}

/// Explicit type, else first matching rule, else the default type.
pub fn infer_type<'a>(
    front: &Value,
    file_name: &str,
    rel_path: &str,
    site: &'a Site,
) -> Result<&'a CompiledType, ArticleError> {
    if let Some(explicit) = front.get("type").and_then(Value::as_str) {
        return site
            .compiled_type(explicit)
            .ok_or_else(|| ArticleError::UnknownType(explicit.to_string()));
    }
    if let Some(matched) = site.types.iter().find(|t| t.matches(file_name, rel_path)) {
        return Ok(matched);
    }
    match &site.config.default_type {
        Some(default) => site
            .compiled_type(default)
            .ok_or_else(|| ArticleError::UnknownType(default.clone())),
        None => Err(ArticleError::NoType),
    }
}

/// First existing layout named `name` across `dirs`.
///
/// A name without an extension gets `.hbs`.
pub fn resolve_layout(name: &str, dirs: &[PathBuf]) -> Result<LayoutRef, ArticleError> {
    let file = if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.{LAYOUT_EXTENSION}")
    };
    for dir in dirs {
        let candidate = dir.join(&file);
        if candidate.is_file() {
            let kind = candidate
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(LayoutRef {
                name: name.to_string(),
                path: candidate,
                kind,
            });
        }
    }
    Err(ArticleError::TemplateNotFound {
        name: name.to_string(),
        searched: dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Wrap configured front matter fields as multi-format content.
fn apply_multiformat(article: &mut Article, front: &Map<String, Value>, fields: &[String]) {
    for field in fields {
        if field == "content" {
            continue;
        }
        let Some(value) = front.get(field) else {
            continue;
        };
        let Some((formatted, is_list)) = MultiFormat::from_value(value) else {
            tracing::warn!(path = %article.rel_path, field = %field, "not text or a list, ignored");
            continue;
        };
        match field.as_str() {
            "summary" => {
                article.summary = Some(formatted);
                article.summary_is_list = is_list;
            }
            "abstract" => article.abstract_text = Some(formatted),
            _ => {
                article.formats.insert(field.clone(), formatted);
            }
        }
    }
}
