//! Renderer dispatch and output writing.
//!
//! Each article names a layout; the layout's file extension picks the
//! [`Renderer`]. The renderer gets a data bag of the article (`page`) and
//! the site-wide view (`site`) and returns the page body, which is written
//! to the article's output file under the output directory.
//!
//! A failed render is collected as a [`RenderFailure`] and never stops the
//! run.

use crate::article::{Article, LayoutRef};
use crate::front_matter::extract_from_comment;
use crate::site::Site;
use handlebars::{Handlebars, handlebars_helper};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("layout '{layout}': {message}")]
    Template { layout: String, message: String },
    #[error("no renderer for layout kind '{0}'")]
    NoRenderer(String),
}

#[derive(Debug)]
pub struct RenderFailure {
    pub url: String,
    pub rel_path: String,
    pub error: RenderError,
}

/// A template engine for one layout kind.
pub trait Renderer: Send + Sync {
    /// Layout file extension this renderer handles.
    fn kind(&self) -> &str;

    fn render(&self, layout: &LayoutRef, data: &Value) -> Result<String, RenderError>;
}

handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());

/// Handlebars layouts (`.hbs`).
///
/// Partials are `partials/*.hbs` under each layout directory, registered by
/// file stem; site partials shadow system partials of the same name.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new(layout_dirs: &[PathBuf]) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        // Undefined references fail the render; `{{#if}}` still probes freely
        registry.set_strict_mode(true);
        registry.register_helper("json", Box::new(json));

        for dir in layout_dirs.iter().rev() {
            let partials = dir.join("partials");
            let Ok(entries) = std::fs::read_dir(&partials) else {
                continue;
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == "hbs"))
                .collect();
            files.sort();
            for path in files {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let text = std::fs::read_to_string(&path).map_err(|source| RenderError::Io {
                    path: path.clone(),
                    source,
                })?;
                registry
                    .register_partial(&name, text)
                    .map_err(|e| RenderError::Template {
                        layout: format!("partials/{name}"),
                        message: e.to_string(),
                    })?;
                tracing::debug!(partial = %name, "registered");
            }
        }
        Ok(Self { registry })
    }
}

impl Renderer for HandlebarsRenderer {
    fn kind(&self) -> &str {
        "hbs"
    }

    fn render(&self, layout: &LayoutRef, data: &Value) -> Result<String, RenderError> {
        let text = std::fs::read_to_string(&layout.path).map_err(|source| RenderError::Io {
            path: layout.path.clone(),
            source,
        })?;
        let template_error = |message: String| RenderError::Template {
            layout: layout.name.clone(),
            message,
        };
        let (_, body) = extract_from_comment(&text).map_err(|e| template_error(e.to_string()))?;
        self.registry
            .render_template(body, data)
            .map_err(|e| template_error(e.to_string()))
    }
}

#[derive(Serialize)]
struct RenderContext<'a> {
    page: &'a Article,
    site: &'a Value,
}

/// The `site` half of every data bag.
pub fn site_data(site: &Site) -> Value {
    let taxonomies: Map<String, Value> = site
        .taxonomies
        .iter()
        .map(|(name, index)| {
            let entries: Vec<Value> = index
                .entries
                .values()
                .filter_map(|e| serde_json::to_value(e).ok())
                .collect();
            (name.clone(), Value::Array(entries))
        })
        .collect();
    let collections: Map<String, Value> = site
        .by_type
        .iter()
        .map(|(name, refs)| {
            let refs: Vec<Value> = refs
                .values()
                .filter_map(|r| serde_json::to_value(r).ok())
                .collect();
            (name.clone(), Value::Array(refs))
        })
        .collect();

    let mut data = Map::new();
    data.insert("title".into(), Value::String(site.config.site.title.clone()));
    data.insert(
        "description".into(),
        Value::String(site.config.site.description.clone()),
    );
    data.insert("lang".into(), Value::String(site.config.site.lang.clone()));
    data.insert("base_url".into(), Value::String(site.base_url.clone()));
    data.insert("dev".into(), Value::Bool(site.dev));
    data.insert("now".into(), Value::String(site.now.to_rfc3339()));
    data.insert(
        "config".into(),
        serde_json::to_value(&site.config).unwrap_or(Value::Null),
    );
    data.insert("taxonomies".into(), Value::Object(taxonomies));
    data.insert("collections".into(), Value::Object(collections));
    Value::Object(data)
}

/// Renderers keyed by layout kind.
#[derive(Default)]
pub struct Dispatcher {
    renderers: Vec<Box<dyn Renderer>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderer; a later renderer for the same kind replaces the
    /// earlier one.
    pub fn register(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.retain(|r| r.kind() != renderer.kind());
        self.renderers.push(renderer);
    }

    pub fn renderer_for(&self, kind: &str) -> Option<&dyn Renderer> {
        self.renderers
            .iter()
            .find(|r| r.kind() == kind)
            .map(|r| r.as_ref())
    }

    /// Render one article and write it. Returns the written path.
    pub fn render_article(
        &self,
        article: &Article,
        site_data: &Value,
        output_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let renderer = self
            .renderer_for(&article.layout.kind)
            .ok_or_else(|| RenderError::NoRenderer(article.layout.kind.clone()))?;
        let data = serde_json::to_value(RenderContext {
            page: article,
            site: site_data,
        })
        .map_err(|e| RenderError::Template {
            layout: article.layout.name.clone(),
            message: e.to_string(),
        })?;
        let html = renderer.render(&article.layout, &data)?;

        let path = output_dir.join(article.output_file_name.trim_start_matches('/'));
        let io_error = |source| RenderError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&path, html).map_err(io_error)?;
        Ok(path)
    }

    /// Render every article in parallel. Returns the count written and the
    /// failures.
    pub fn render_all(&self, site: &Site) -> (usize, Vec<RenderFailure>) {
        let data = site_data(site);
        let output_dir = site.output_dir();
        let articles: Vec<&Article> = site.all.values().collect();

        let results: Vec<Result<PathBuf, RenderFailure>> = articles
            .par_iter()
            .map(|article| {
                self.render_article(article, &data, &output_dir)
                    .map_err(|error| RenderFailure {
                        url: article.url.clone(),
                        rel_path: article.rel_path.clone(),
                        error,
                    })
            })
            .collect();

        let mut written = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(path) => {
                    tracing::debug!(path = %path.display(), "written");
                    written += 1;
                }
                Err(failure) => {
                    tracing::error!(path = %failure.rel_path, error = %failure.error, "render failed");
                    failures.push(failure);
                }
            }
        }
        (written, failures)
    }
}
