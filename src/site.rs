//! The run context threaded through every phase of a build.
//!
//! [`Site`] owns the configuration, the compiled type rules, the image
//! registry and every index. Article derivation only ever sees `&Site`;
//! the indices are mutated in [`Site::commit`], which runs sequentially
//! after each parallel batch.

use crate::article::{Article, ArticleError, ArticleFailure, PaginationSpec};
use crate::collection::{ArticleRef, Collection, TaxonomyIndex};
use crate::config::{CollisionPolicy, CompiledType, ConfigError, SiteConfig};
use crate::imaging::{ImageRegistry, ImageSettings};
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
    /// Compiled `[[types]]`, declaration order.
    pub types: Vec<CompiledType>,
    pub base_url: String,
    pub dev: bool,
    /// Reference time for published-state resolution.
    pub now: DateTime<FixedOffset>,
    pub image_settings: ImageSettings,
    pub images: ImageRegistry,
    /// Every committed article, keyed by URL.
    pub all: Collection<Article>,
    pub by_type: BTreeMap<String, Collection<ArticleRef>>,
    pub taxonomies: BTreeMap<String, TaxonomyIndex>,
    /// Articles that declared pagination, keyed by URL.
    pub pending_pagination: BTreeMap<String, PaginationSpec>,
    pub failures: Vec<ArticleFailure>,
}

impl Site {
    /// The root is made absolute here, so every derived directory (and
    /// every image cache key) is independent of the working directory.
    pub fn new(root: &Path, config: SiteConfig, dev: bool) -> Result<Self, ConfigError> {
        let root = std::path::absolute(root)?;
        let types = config
            .types
            .iter()
            .map(|rule| rule.compile())
            .collect::<Result<Vec<_>, _>>()?;
        let base_url = config.base_url(dev)?;
        let image_settings = ImageSettings::new(&config.images)?;
        let taxonomies = config
            .taxonomy
            .types
            .iter()
            .map(|t| (t.clone(), TaxonomyIndex::new()))
            .collect();
        Ok(Self {
            root,
            config,
            types,
            base_url,
            dev,
            now: Utc::now().fixed_offset(),
            image_settings,
            images: ImageRegistry::new(),
            all: Collection::new(),
            by_type: BTreeMap::new(),
            taxonomies,
            pending_pagination: BTreeMap::new(),
            failures: Vec::new(),
        })
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.config.dirs.content)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.dirs.output)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.config.dirs.cache)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.root.join(&self.config.dirs.image_cache_file)
    }

    /// Layout search order: site layouts first, then system layouts.
    pub fn layout_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.root.join(&self.config.dirs.layouts)];
        if let Some(system) = &self.config.dirs.system_layouts {
            dirs.push(self.root.join(system));
        }
        dirs
    }

    pub fn compiled_type(&self, name: &str) -> Option<&CompiledType> {
        self.types.iter().find(|t| t.rule.name == name)
    }

    /// Absolute URL for a site path.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url, crate::naming::collapse_slashes(path))
    }

    /// Record a failed article.
    pub fn fail(&mut self, rel_path: &str, error: ArticleError) {
        tracing::error!(path = %rel_path, error = %error, "article failed");
        self.failures.push(ArticleFailure {
            rel_path: rel_path.to_string(),
            error,
        });
    }

    /// Register pagination and index an article.
    ///
    /// Unpublished articles are dropped outside dev builds. A URL that is
    /// already taken either replaces the earlier article with a warning or
    /// is rejected, per `build.on_url_collision`.
    pub fn commit(&mut self, article: Article) -> Result<(), ArticleError> {
        if !article.published && !self.dev {
            tracing::debug!(path = %article.rel_path, "unpublished, skipped");
            return Ok(());
        }

        if let Some(existing) = self.all.get(&article.url) {
            let existing_path = existing.rel_path.clone();
            let existing_type = existing.type_name.clone();
            match self.config.build.on_url_collision {
                CollisionPolicy::Fail => {
                    return Err(ArticleError::UrlCollision {
                        url: article.url.clone(),
                        existing: existing_path,
                    });
                }
                CollisionPolicy::Warn => {
                    tracing::warn!(
                        path = %article.rel_path,
                        url = %article.url,
                        replaces = %existing_path,
                        "URL collision, later article wins"
                    );
                    self.unindex(&article.url, &existing_type);
                }
            }
        }

        if let Some(spec) = &article.pagination {
            self.pending_pagination
                .insert(article.url.clone(), spec.clone());
        }

        let entry = article.as_ref_entry();
        self.by_type
            .entry(article.type_name.clone())
            .or_default()
            .insert(article.url.clone(), entry.clone());
        for (taxonomy, values) in &article.taxonomies {
            let Some(index) = self.taxonomies.get_mut(taxonomy) else {
                continue;
            };
            for value in values {
                index.add(value, entry.clone());
            }
        }
        self.all.insert(article.url.clone(), article);
        Ok(())
    }

    fn unindex(&mut self, url: &str, type_name: &str) {
        self.all.remove(url);
        self.pending_pagination.remove(url);
        if let Some(c) = self.by_type.get_mut(type_name) {
            c.remove(url);
        }
        for index in self.taxonomies.values_mut() {
            index.remove_article(url);
        }
    }

    /// Sort every index. Call only after all articles are committed.
    pub fn sort_indices(&mut self) {
        self.all.sort_desc_by_key(Article::published_ms);
        for collection in self.by_type.values_mut() {
            collection.sort_desc_by_key(|r| r.date_ms);
        }
        for index in self.taxonomies.values_mut() {
            index.sort();
        }
    }

    /// Link each article to its neighbours within its type, newest first:
    /// `next` is the newer article, `prev` the older one.
    pub fn link_neighbours(&mut self) {
        let mut links = Vec::new();
        for collection in self.by_type.values() {
            let refs: Vec<&ArticleRef> = collection.values().collect();
            for (i, r) in refs.iter().enumerate() {
                let link = |x: &ArticleRef| crate::article::ArticleLink {
                    url: x.url.clone(),
                    title: x.title.clone(),
                };
                let next = i.checked_sub(1).map(|j| link(refs[j]));
                let prev = refs.get(i + 1).map(|x| link(*x));
                links.push((r.url.clone(), prev, next));
            }
        }
        for (url, prev, next) in links {
            if let Some(article) = self.all.get_mut(&url) {
                article.prev = prev;
                article.next = next;
            }
        }
    }

    /// Articles listed by a pagination source: `all`, a type name, or
    /// `<taxonomy>:<value>`. `all` leaves out plain files and listing pages.
    pub fn listing(&self, source: &str) -> Vec<ArticleRef> {
        if source == "all" {
            return self
                .all
                .values()
                .filter(|a| a.pagination.is_none() && a.paging.is_none() && !a.plain)
                .map(Article::as_ref_entry)
                .collect();
        }
        if let Some((taxonomy, value)) = source.split_once(':') {
            return self
                .taxonomies
                .get(taxonomy)
                .and_then(|idx| idx.get(value))
                .map(|entry| entry.articles.clone())
                .unwrap_or_default();
        }
        self.by_type
            .get(source)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }
}
