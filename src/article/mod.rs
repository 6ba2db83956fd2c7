//! The article record and everything that derives it.
//!
//! An [`Article`] is created once per content file by the
//! [`builder`](builder::build_article), then filled in step by step by the
//! [`pipeline`](pipeline::derive). Synthetic articles (pagination pages,
//! taxonomy listings) are built by [`crate::paginate`] from the same type.
//!
//! The record is serialized as-is into the template data bag, so field
//! names here are the names layouts see.

pub mod breadcrumb;
pub mod builder;
pub mod citation;
pub mod faq;
pub mod output_path;
pub mod pipeline;
pub mod refs;

use crate::dates::{DateSource, DateValue};
use crate::front_matter::FrontMatterError;
use crate::markup::MultiFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop one article from being built. The run continues.
#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed front matter: {0}")]
    FrontMatter(#[from] FrontMatterError),
    #[error("no type matches and no default_type is configured")]
    NoType,
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("layout '{name}' not found in {searched}")]
    TemplateNotFound { name: String, searched: String },
    #[error("no permalink pattern for type '{0}'")]
    NoPermalink(String),
    #[error("no published date could be resolved")]
    NoDate,
    #[error("URL {url} is already taken by {existing}")]
    UrlCollision { url: String, existing: String },
    #[error(transparent)]
    Plugin(#[from] crate::events::PluginError),
}

/// An article that could not be built, for the end-of-run report.
#[derive(Debug)]
pub struct ArticleFailure {
    pub rel_path: String,
    pub error: ArticleError,
}

/// The layout an article renders through.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutRef {
    pub name: String,
    pub path: PathBuf,
    /// File extension, selects the renderer (`hbs`).
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A source cited by the article, with its rendered attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Citation {
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub authors: Vec<NamedLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<NamedLink>,
    /// HTML: title link, then ` by ` authors, then ` on ` site.
    pub attribution: String,
}

/// A name, a URL, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Faq {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub faqs: Vec<FaqItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqItem {
    pub q: String,
    pub a: MultiFormat,
}

/// An image the article references, with the purposes it is tagged for.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleImage {
    pub src: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// A registry image resolved for a purpose (featured, og, …).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub srcset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Declared pagination: list `source` articles `per_page` at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSpec {
    /// `all`, a type name, or `<taxonomy>:<value>`.
    #[serde(default = "default_pagination_source")]
    pub source: String,
    #[serde(default)]
    pub per_page: Option<usize>,
}

fn default_pagination_source() -> String {
    "all".to_string()
}

/// The slice of a paginated listing one page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paging {
    pub page: usize,
    pub pages: usize,
    pub per_page: usize,
    pub items: Vec<crate::collection::ArticleRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleLink {
    pub url: String,
    pub title: String,
}

/// The in-flight document for one page of output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Article {
    // identity
    /// Relative to the content root, `/`-separated.
    pub rel_path: String,
    #[serde(skip)]
    pub source_path: PathBuf,
    pub file_name: String,
    pub url: String,
    /// Relative to the output root, with a leading `/`.
    pub output_file_name: String,

    // classification
    #[serde(rename = "type")]
    pub type_name: String,
    pub plain: bool,
    pub layout: LayoutRef,
    /// Merged front matter, all layers applied.
    pub front_matter: Map<String, Value>,

    // temporal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_source: Option<DateSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateValue>,

    // content
    pub content: MultiFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MultiFormat>,
    pub summary_is_list: bool,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<MultiFormat>,
    pub abstract_synthesized: bool,
    /// Other configured multi-format fields, by name.
    pub formats: BTreeMap<String, MultiFormat>,

    // naming
    pub headline: String,
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub authors: Vec<Author>,

    // classification by taxonomy
    pub taxonomies: BTreeMap<String, Vec<String>>,
    pub article_section: Vec<String>,
    pub article_types: Vec<String>,

    // structured extensions
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
    pub citations: Vec<Citation>,
    pub breadcrumbs: Vec<Crumb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq: Option<Faq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub howto: Option<Value>,

    // effort
    pub words: usize,
    pub reading_time: f64,
    pub reading_time_rounded: u64,

    // listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
    pub published: bool,

    // images
    pub images: Vec<ArticleImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<ResolvedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og: Option<ResolvedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<ResolvedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss: Option<ResolvedImage>,

    // cross references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<ArticleLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<ArticleLink>,

    /// JSON-LD payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Plugin data, keyed by plugin name.
    pub extensions: BTreeMap<String, Value>,
}

impl Article {
    /// Front matter value by key.
    pub fn fm(&self, key: &str) -> Option<&Value> {
        self.front_matter.get(key)
    }

    /// Front matter string by key; empty strings count as absent.
    pub fn fm_str(&self, key: &str) -> Option<&str> {
        self.fm(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Directory of the source file relative to the content root, without
    /// leading or trailing slashes. Empty at the root.
    pub fn dir(&self) -> &str {
        match self.rel_path.rfind('/') {
            Some(i) => &self.rel_path[..i],
            None => "",
        }
    }

    pub fn published_ms(&self) -> i64 {
        self.date_published.as_ref().map_or(0, |d| d.epoch_ms)
    }

    pub fn as_ref_entry(&self) -> crate::collection::ArticleRef {
        crate::collection::ArticleRef {
            url: self.url.clone(),
            title: self.name.clone(),
            date_ms: self.published_ms(),
        }
    }
}
