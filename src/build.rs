//! One complete build run.
//!
//! Phases are strictly sequential; the work inside a phase runs in
//! parallel with rayon where units are independent.
//!
//! ```text
//! config → AFTER_CONFIG
//!   → discover content
//!   → BEFORE_PARSE_EARLY → images (parallel) → AFTER_PARSE_EARLY
//!   → BEFORE_PARSE_LATE  → articles (parallel) → commit (sequential)
//!   → sort indices, prev/next → AFTER_PARSE_LATE
//!   → pagination, taxonomy listings
//!   → ARTICLE_PRERENDER → render (parallel)
//!   → static assets, image cache → output
//! ```
//!
//! Failures of single articles, images or renders are collected into the
//! [`BuildReport`]; only config, plugin registration, structural events and
//! I/O on the run's own files abort the build.

use crate::article::pipeline::process_file;
use crate::article::{ArticleError, ArticleFailure};
use crate::cache::{CacheStats, ImageCache};
use crate::config::{ConfigError, load_config};
use crate::events::{Event, EventBus, Plugin, PluginError, register_plugins};
use crate::imaging::{
    ImageBackend, ImageError, ImageSource, ResolveContext, publish_cache, resolve_all,
};
use crate::paginate::{build_taxonomy_listings, expand_pagination};
use crate::render::{Dispatcher, HandlebarsRenderer, RenderError, RenderFailure};
use crate::site::Site;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File extensions read as articles.
pub const ARTICLE_EXTENSIONS: [&str; 2] = ["md", "markdown"];
/// Reference partials, never copied to the output.
const REFERENCE_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
    #[error("Render setup failed: {0}")]
    Render(#[from] RenderError),
    #[error("{articles} article(s) and {renders} render(s) failed")]
    ArticlesFailed { articles: usize, renders: usize },
}

/// Command-line switches that shape a run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root: PathBuf,
    pub dev: bool,
    /// Delete the image cache directory and cache file first.
    pub clear_cache: bool,
    /// Trust existing image outputs without hashing them.
    pub trust_image_cache: bool,
}

impl BuildOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dev: false,
            clear_cache: false,
            trust_image_cache: false,
        }
    }
}

/// Everything a finished run reports.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub plugins: Vec<&'static str>,
    /// Committed content articles.
    pub articles: usize,
    /// Pagination and taxonomy listing pages.
    pub generated_pages: usize,
    pub written: usize,
    pub images: usize,
    pub image_stats: CacheStats,
    pub image_failures: Vec<ImageError>,
    pub assets_copied: usize,
    pub images_published: usize,
    pub article_failures: Vec<ArticleFailure>,
    pub render_failures: Vec<RenderFailure>,
    pub fail_on_errors: bool,
    pub verbose_errors: bool,
}

impl BuildReport {
    pub fn has_failures(&self) -> bool {
        !self.article_failures.is_empty() || !self.render_failures.is_empty()
    }

    /// Promote collected failures to an error when the config asks for it.
    pub fn into_result(self) -> Result<Self, BuildError> {
        if self.fail_on_errors && self.has_failures() {
            return Err(BuildError::ArticlesFailed {
                articles: self.article_failures.len(),
                renders: self.render_failures.len(),
            });
        }
        Ok(self)
    }
}

/// Content files sorted by role.
#[derive(Debug, Default)]
pub struct Discovered {
    pub articles: Vec<PathBuf>,
    pub images: Vec<ImageSource>,
    pub assets: Vec<(PathBuf, String)>,
}

/// Walk the content directory, skipping dotfiles and dot-directories.
pub fn discover(site: &Site) -> Result<Discovered, BuildError> {
    let content = site.content_dir();
    let mut found = Discovered::default();
    if !content.is_dir() {
        tracing::warn!(dir = %content.display(), "content directory missing");
        return Ok(found);
    }
    let walker = WalkDir::new(&content)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let rel_path = crate::article::builder::relative_path(&path, &content);
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if ARTICLE_EXTENSIONS.contains(&ext.as_str()) {
            found.articles.push(path);
        } else if site.image_settings.is_image(&path) {
            found.images.push(ImageSource { path, rel_path });
        } else if !REFERENCE_EXTENSIONS.contains(&ext.as_str()) {
            found.assets.push((path, rel_path));
        }
    }
    Ok(found)
}

/// Emit a site event. Structural events abort; the rest log and continue.
fn emit(bus: &EventBus, event: Event, site: &mut Site) -> Result<(), PluginError> {
    match bus.emit_site(event, site) {
        Err(e) if event.is_structural() => Err(e),
        Err(e) => {
            tracing::warn!(event = %event, error = %e, "handler failed");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

fn clear_image_cache(site: &Site) -> std::io::Result<()> {
    let dir = site.cache_dir();
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    let file = site.cache_file();
    if file.exists() {
        std::fs::remove_file(&file)?;
    }
    tracing::info!(dir = %dir.display(), "image cache cleared");
    Ok(())
}

fn copy_assets(assets: &[(PathBuf, String)], output_dir: &Path) -> std::io::Result<usize> {
    for (source, rel_path) in assets {
        let target = output_dir.join(rel_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, &target)?;
    }
    Ok(assets.len())
}

/// Run a build with the given image backend and plugins.
pub fn build(
    options: &BuildOptions,
    backend: &dyn ImageBackend,
    plugins: &[Box<dyn Plugin>],
) -> Result<BuildReport, BuildError> {
    let mut config = load_config(&options.root)?;
    let mut bus = EventBus::new();
    let loaded = register_plugins(&mut bus, &mut config, plugins)?;
    let mut site = Site::new(&options.root, config, options.dev)?;
    tracing::info!(root = %options.root.display(), base_url = %site.base_url, "building");

    emit(&bus, Event::AfterConfig, &mut site)?;

    if options.clear_cache {
        clear_image_cache(&site)?;
    }
    let found = discover(&site)?;
    tracing::debug!(
        articles = found.articles.len(),
        images = found.images.len(),
        assets = found.assets.len(),
        "discovered"
    );

    // Early phase: images, so articles can reference them.
    emit(&bus, Event::BeforeParseEarly, &mut site)?;
    let cache_file = site.cache_file();
    let cache_dir = site.cache_dir();
    let mut cache = ImageCache::load(&cache_file);
    let settings = site.image_settings.clone();
    let outcome = {
        let ctx = ResolveContext {
            settings: &settings,
            cache: &cache,
            cache_dir: &cache_dir,
            trust_existing: options.trust_image_cache,
            backend,
        };
        resolve_all(&found.images, &ctx, &mut site.images)
    };
    cache.extend(outcome.updates);
    cache.save(&cache_file)?;
    tracing::info!(stats = %outcome.stats, "images");
    emit(&bus, Event::AfterParseEarly, &mut site)?;

    // Late phase: articles.
    emit(&bus, Event::BeforeParseLate, &mut site)?;
    let results: Vec<(String, Result<_, ArticleError>)> = {
        let site = &site;
        let bus = &bus;
        found
            .articles
            .par_iter()
            .map(|path| {
                let rel_path = crate::article::builder::relative_path(path, &site.content_dir());
                (rel_path, process_file(path, site, bus))
            })
            .collect()
    };
    for (rel_path, result) in results {
        match result.and_then(|article| site.commit(article)) {
            Ok(()) => {}
            Err(e) => site.fail(&rel_path, e),
        }
    }
    site.sort_indices();
    site.link_neighbours();
    let articles = site.all.len();
    emit(&bus, Event::AfterParseLate, &mut site)?;

    let mut generated_pages = expand_pagination(&mut site);
    match build_taxonomy_listings(&mut site) {
        Ok(n) => generated_pages += n,
        Err(e) => site.fail("taxonomy listings", e),
    }

    // Prerender, one article at a time, with the rest of the site readable.
    let mut pending = site.all.drain();
    for (_, article) in pending.iter_mut() {
        if let Err(e) = bus.emit_article(Event::ArticlePrerender, article, &site) {
            tracing::warn!(path = %article.rel_path, error = %e, "prerender handler failed");
        }
    }
    site.all = pending.into_iter().collect();

    let output_dir = site.output_dir();
    std::fs::create_dir_all(&output_dir)?;
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(HandlebarsRenderer::new(&site.layout_dirs())?));
    let (written, render_failures) = dispatcher.render_all(&site);

    let assets_copied = copy_assets(&found.assets, &output_dir)?;
    let images_published = publish_cache(&cache_dir, &output_dir)?;

    Ok(BuildReport {
        output_dir,
        plugins: loaded,
        articles,
        generated_pages,
        written,
        images: site.images.len(),
        image_stats: outcome.stats,
        image_failures: outcome.failures,
        assets_copied,
        images_published,
        article_failures: std::mem::take(&mut site.failures),
        render_failures,
        fail_on_errors: site.config.build.fail_on_article_errors,
        verbose_errors: site.config.build.verbose_errors,
    })
}
