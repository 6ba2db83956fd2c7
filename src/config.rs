//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Configuration is
//! layered: stock defaults are overridden by the site's `config.toml`, and
//! plugins may contribute default sections of their own under
//! `[plugins.<name>]` without clobbering what the user already wrote.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml       # Site config (overrides stock defaults)
//! ├── content/          # Markdown articles, images, static files
//! └── layouts/          # Handlebars layouts, first match wins over system layouts
//! ```
//!
//! ## Type Rules
//!
//! Article types are declared as an ordered `[[types]]` array. When an
//! article has no explicit `type`, the first rule whose filename pattern
//! and/or directory prefix matches wins; `default_type` catches the rest.
//!
//! ```toml
//! [[types]]
//! name = "post"
//! filename_pattern = '^\d{4}-\d{2}-\d{2}-'
//! dir_prefix = "posts/"
//! match_all = false
//! permalink = ":year/:month/:fn"
//! filename_date = '^(\d{4}-\d{2}-\d{2})'
//! date_grab_length = 10
//! ```
//!
//! Unknown keys are rejected to catch typos early, except inside the
//! free-form `defaults`, `authors`, `products`, `reviews` and `plugins` tables.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid pattern in {field}: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("site.domain is required for production builds (use --dev for local builds)")]
    MissingDomain,
    #[error("Unknown lifecycle event: {0}")]
    UnknownEvent(String),
    #[error("Handler for {event} must operate on the {expected} payload")]
    EventScope {
        event: &'static str,
        expected: &'static str,
    },
    #[error("Plugin section [plugins.{name}] is invalid: {message}")]
    PluginSection { name: String, message: String },
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub dev: DevConfig,
    pub dirs: DirsConfig,
    /// Ordered type rules; the first match wins.
    pub types: Vec<TypeRule>,
    /// Type assigned when no rule matches. `None` makes that a hard failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
    pub permalinks: PermalinkConfig,
    pub output: OutputConfig,
    pub dates: DatesConfig,
    pub content: ContentConfig,
    pub taxonomy: TaxonomyConfig,
    pub images: ImagesConfig,
    pub authors: BTreeMap<String, AuthorConfig>,
    /// Importable product records, keyed by import name.
    pub products: BTreeMap<String, serde_json::Value>,
    /// Importable review records, keyed by import name.
    pub reviews: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<PublisherConfig>,
    pub breadcrumbs: BreadcrumbsConfig,
    pub build: BuildConfig,
    /// Free-form plugin sections, keyed by plugin name.
    pub plugins: BTreeMap<String, toml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteSection::default(),
            dev: DevConfig::default(),
            dirs: DirsConfig::default(),
            types: default_types(),
            default_type: Some("page".to_string()),
            permalinks: PermalinkConfig::default(),
            output: OutputConfig::default(),
            dates: DatesConfig::default(),
            content: ContentConfig::default(),
            taxonomy: TaxonomyConfig::default(),
            images: ImagesConfig::default(),
            authors: BTreeMap::new(),
            products: BTreeMap::new(),
            reviews: BTreeMap::new(),
            publisher: None,
            breadcrumbs: BreadcrumbsConfig::default(),
            build: BuildConfig::default(),
            plugins: BTreeMap::new(),
        }
    }
}

fn default_types() -> Vec<TypeRule> {
    vec![
        TypeRule {
            name: "post".to_string(),
            filename_pattern: Some(r"^\d{4}-\d{2}-\d{2}-".to_string()),
            dir_prefix: Some("posts/".to_string()),
            match_all: false,
            permalink: Some(":year/:month/:fn".to_string()),
            layout: None,
            filename_date: Some(r"^(\d{4}-\d{2}-\d{2})".to_string()),
            date_grab_length: 10,
            plain: false,
            defaults: serde_json::Map::new(),
        },
        TypeRule {
            name: "page".to_string(),
            filename_pattern: None,
            dir_prefix: None,
            match_all: false,
            permalink: Some(":path/:fn".to_string()),
            layout: None,
            filename_date: None,
            date_grab_length: 0,
            plain: false,
            defaults: serde_json::Map::new(),
        },
    ]
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.content.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "content.words_per_minute must be non-zero".into(),
            ));
        }
        if self.output.mode == OutputMode::Directory && self.output.index_file.is_empty() {
            return Err(ConfigError::Validation(
                "output.index_file must not be empty in directory mode".into(),
            ));
        }
        if self.taxonomy.per_page == 0 {
            return Err(ConfigError::Validation(
                "taxonomy.per_page must be non-zero".into(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for rule in &self.types {
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "type '{}' is declared twice",
                    rule.name
                )));
            }
            rule.compile()?;
        }
        if let Some(default) = &self.default_type
            && !seen.contains(default.as_str())
        {
            return Err(ConfigError::Validation(format!(
                "default_type '{default}' has no [[types]] entry"
            )));
        }
        compile_pattern("images.resizeable_pattern", &self.images.resizeable_pattern)?;
        Ok(())
    }

    /// Look up the rule for a type name.
    pub fn type_rule(&self, name: &str) -> Option<&TypeRule> {
        self.types.iter().find(|r| r.name == name)
    }

    /// Absolute base URL for generated links.
    ///
    /// Dev builds point at the local server; production builds require a
    /// configured domain.
    pub fn base_url(&self, dev: bool) -> Result<String, ConfigError> {
        if dev {
            return Ok(format!("http://{}:{}", self.dev.host, self.dev.port));
        }
        match self.site.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => {
                let domain = domain.trim_end_matches('/');
                if domain.starts_with("http://") || domain.starts_with("https://") {
                    Ok(domain.to_string())
                } else {
                    Ok(format!("https://{domain}"))
                }
            }
            _ => Err(ConfigError::MissingDomain),
        }
    }

    /// Merge a plugin's default section under `[plugins.<name>]`.
    ///
    /// Values already present in the user's config win at every depth;
    /// defaults only fill the gaps.
    pub fn merge_section(&mut self, name: &str, defaults: toml::Value) {
        let merged = match self.plugins.remove(name) {
            Some(existing) => merge_toml(defaults, existing),
            None => defaults,
        };
        self.plugins.insert(name.to_string(), merged);
    }

    /// Deserialize a plugin section. A missing section yields `T::default()`.
    pub fn plugin_section<T: DeserializeOwned + Default>(
        &self,
        name: &str,
    ) -> Result<T, ConfigError> {
        match self.plugins.get(name) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::PluginSection {
                    name: name.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(T::default()),
        }
    }
}

/// Identity of the site itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    /// Production domain, e.g. `example.com`. Required unless `--dev`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub lang: String,
    pub description: String,
    /// Image used when an article has no image of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            domain: None,
            lang: "en".to_string(),
            description: String::new(),
            default_image: None,
        }
    }
}

/// Local development server address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Directory layout, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsConfig {
    pub content: String,
    pub layouts: String,
    /// Fallback layouts shipped with a theme, searched after `layouts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_layouts: Option<String>,
    pub output: String,
    pub cache: String,
    pub image_cache_file: String,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            layouts: "layouts".to_string(),
            system_layouts: None,
            output: "public".to_string(),
            cache: ".quire-cache/images".to_string(),
            image_cache_file: ".quire-cache/images.json".to_string(),
        }
    }
}

/// One entry in the ordered `[[types]]` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeRule {
    pub name: String,
    /// Regex tested against the file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_pattern: Option<String>,
    /// Prefix tested against the path relative to the content dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_prefix: Option<String>,
    /// When both tests are configured: `true` requires both, `false` either.
    #[serde(default)]
    pub match_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Regex whose first capture is a `YYYY-MM-DD` publish date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_date: Option<String>,
    /// Length of the leading date segment excluded from `:fn`.
    #[serde(default)]
    pub date_grab_length: usize,
    /// Plain files are passed through verbatim: no trailing slash, no index file.
    #[serde(default)]
    pub plain: bool,
    /// Front matter defaults applied to every article of this type.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub defaults: serde_json::Map<String, serde_json::Value>,
}

/// A type rule with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledType {
    pub rule: TypeRule,
    pub filename: Option<Regex>,
    pub date: Option<Regex>,
}

impl TypeRule {
    pub fn compile(&self) -> Result<CompiledType, ConfigError> {
        let filename = self
            .filename_pattern
            .as_deref()
            .map(|p| compile_pattern(&format!("types.{}.filename_pattern", self.name), p))
            .transpose()?;
        let date = self
            .filename_date
            .as_deref()
            .map(|p| compile_pattern(&format!("types.{}.filename_date", self.name), p))
            .transpose()?;
        Ok(CompiledType {
            rule: self.clone(),
            filename,
            date,
        })
    }
}

impl CompiledType {
    /// Test this rule against a file. Rules with no tests never match.
    pub fn matches(&self, file_name: &str, rel_path: &str) -> bool {
        let by_name = self.filename.as_ref().map(|re| re.is_match(file_name));
        let by_dir = self
            .rule
            .dir_prefix
            .as_deref()
            .map(|prefix| rel_path.trim_start_matches('/').starts_with(prefix));
        match (by_name, by_dir) {
            (Some(a), Some(b)) if self.rule.match_all => a && b,
            (Some(a), Some(b)) => a || b,
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => false,
        }
    }
}

pub fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
        field: field.to_string(),
        source,
    })
}

/// Global fallback permalink pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermalinkConfig {
    pub default: String,
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            default: ":path/:fn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// `/hello/` → `/hello/index.html`
    Directory,
    /// `/hello/` → `/hello.html`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub index_file: String,
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Directory,
            index_file: "index.html".to_string(),
            extension: ".html".to_string(),
        }
    }
}

/// Display formats for resolved dates (chrono `strftime` syntax).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatesConfig {
    pub date_format: String,
    pub time_format: String,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            date_format: "%B %-d, %Y".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Front matter fields stored as {source, html, text}. `content` is the body.
    pub multiformat: Vec<String>,
    pub words_per_minute: u32,
    /// Character budget for a synthesized abstract.
    pub abstract_length: usize,
    /// Fall back to the summary when an article has no description.
    pub clever_descriptions: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            multiformat: vec![
                "content".to_string(),
                "summary".to_string(),
                "abstract".to_string(),
            ],
            words_per_minute: 200,
            abstract_length: 160,
            clever_descriptions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxonomyConfig {
    /// Taxonomy types read from front matter, e.g. `["tags"]`.
    pub types: Vec<String>,
    /// Taxonomy whose values are split into sections and article types.
    pub keyword_field: String,
    pub split_sections: bool,
    /// Keyword values promoted to `article_section`.
    pub sections: Vec<String>,
    /// Keyword values promoted to `article_types`.
    pub article_types: Vec<String>,
    pub default_section: String,
    /// Layout for generated `/{taxonomy}/{value}/` listing pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_layout: Option<String>,
    pub per_page: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            types: vec!["tags".to_string()],
            keyword_field: "tags".to_string(),
            split_sections: false,
            sections: Vec::new(),
            article_types: Vec::new(),
            default_section: "general".to_string(),
            listing_layout: None,
            per_page: 10,
        }
    }
}

/// Responsive image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Target widths for responsive variants.
    pub widths: Vec<u32>,
    pub quality: u32,
    /// Regex tested against the file stem to mark a resizeable original.
    pub resizeable_pattern: String,
    pub resizeable_extensions: Vec<String>,
    /// Every extension treated as an image (resizeable or not).
    pub extensions: Vec<String>,
    pub allow_upscale: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![480, 960, 1440],
            quality: 85,
            resizeable_pattern: r"-\d+$".to_string(),
            resizeable_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "svg".to_string(),
                "avif".to_string(),
            ],
            allow_upscale: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// One element of a breadcrumb spec: a literal link or a computed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreadcrumbElement {
    /// `self`, `path`, or `<taxonomy>#<index>`.
    Calc { calc: String },
    Link { name: String, url: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreadcrumbsConfig {
    /// Spec used by articles that do not declare their own.
    pub default: Vec<BreadcrumbElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Log a warning and let the later article replace the earlier one.
    #[default]
    Warn,
    /// Reject the later article.
    Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub on_url_collision: CollisionPolicy,
    /// Exit non-zero when any article or render failed.
    pub fail_on_article_errors: bool,
    /// Report every failure instead of the first one plus a count.
    pub verbose_errors: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Quire Configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error, except inside free-form tables
# (types.defaults, authors, products, reviews, plugins).

# Type assigned to articles no [[types]] rule matches.
# Remove it to make unmatched files a hard error.
default_type = "page"

[site]
title = "Untitled"
# Production domain. Required unless building with --dev.
# domain = "example.com"
lang = "en"
description = ""
# Image used when an article has none of its own.
# default_image = "img/default-1200.jpg"

[dev]
host = "localhost"
port = 8080

[dirs]
content = "content"
layouts = "layouts"
# system_layouts = "themes/basic/layouts"
output = "public"
cache = ".quire-cache/images"
image_cache_file = ".quire-cache/images.json"

# ---------------------------------------------------------------------------
# Article types, tested in order. First match wins.
# ---------------------------------------------------------------------------
[[types]]
name = "post"
filename_pattern = '^\d{4}-\d{2}-\d{2}-'
dir_prefix = "posts/"
match_all = false
permalink = ":year/:month/:fn"
filename_date = '^(\d{4}-\d{2}-\d{2})'
date_grab_length = 10

[[types]]
name = "page"
permalink = ":path/:fn"

[permalinks]
# Tokens: :year :month :day :fn :path
default = ":path/:fn"

[output]
# "directory" writes /hello/index.html, "file" writes /hello.html
mode = "directory"
index_file = "index.html"
extension = ".html"

[dates]
date_format = "%B %-d, %Y"
time_format = "%H:%M"

[content]
multiformat = ["content", "summary", "abstract"]
words_per_minute = 200
abstract_length = 160
clever_descriptions = true

[taxonomy]
types = ["tags"]
keyword_field = "tags"
split_sections = false
sections = []
article_types = []
default_section = "general"
# listing_layout = "taxonomy"
per_page = 10

[images]
widths = [480, 960, 1440]
quality = 85
# Stems matching this pattern are resizeable originals (hero-1920.jpg).
resizeable_pattern = '-\d+$'
resizeable_extensions = ["jpg", "jpeg", "png", "webp"]
extensions = ["jpg", "jpeg", "png", "webp", "gif", "svg", "avif"]
allow_upscale = false

[breadcrumbs]
# default = [{ name = "Home", url = "/" }, { calc = "path" }, { calc = "self" }]
default = []

[build]
# "warn" overwrites on URL collision, "fail" rejects the later article
on_url_collision = "warn"
fail_on_article_errors = false
verbose_errors = false

# [authors.jane]
# name = "Jane Doe"
# url = "https://jane.example"

# [plugins.related]
# max = 5
"##
}
