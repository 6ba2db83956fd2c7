//! Image registry and responsive variant resolution.
//!
//! Every image under the content directory gets one [`ImageEntry`], keyed
//! by its path relative to the content root. Images are registered in the
//! early parse phase so articles can reference them by path while they are
//! being derived.
//!
//! Two kinds of image exist:
//!
//! - **Resizeable**: the file stem carries a width suffix (`hero-1600.jpg`,
//!   matched by `images.resizeable_pattern`) and the extension is in
//!   `images.resizeable_extensions`. These get a `subs` map of width →
//!   variant, one variant per configured width that fits the original.
//! - **Standard**: everything else (SVGs, GIFs, unsuffixed files). These are
//!   copied verbatim and never have `subs`.
//!
//! All outputs go into the cache directory, mirroring the content tree,
//! and are checked against [`ImageCache`] before any work is done. The
//! cache directory is copied into the output tree at the end of a build.

use super::backend::{BackendError, ImageBackend};
use super::calculations::variant_sizes;
use super::params::{Quality, ResizeParams};
use crate::cache::{CacheStats, CacheUpdate, ImageCache, hash_file};
use crate::config::{ConfigError, ImagesConfig, compile_pattern};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Backend {
        path: String,
        #[source]
        source: BackendError,
    },
}

/// One generated width of a resizeable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageVariant {
    /// Path relative to the output root, `/`-separated.
    pub rel_path: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    /// Path relative to the content root, `/`-separated.
    pub rel_path: String,
    pub width: u32,
    pub height: u32,
    pub resizeable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subs: Option<BTreeMap<u32, ImageVariant>>,
    /// SHA-256 of the source file.
    pub hash: String,
}

impl ImageEntry {
    /// Site URL of the image (or of its largest variant).
    pub fn url(&self) -> String {
        match self.largest() {
            Some(v) => format!("/{}", v.rel_path),
            None => format!("/{}", self.rel_path),
        }
    }

    pub fn largest(&self) -> Option<&ImageVariant> {
        self.subs.as_ref().and_then(|subs| subs.values().next_back())
    }

    /// `srcset` attribute value, empty for standard images.
    pub fn srcset(&self) -> String {
        self.subs
            .iter()
            .flat_map(|subs| subs.values())
            .map(|v| format!("/{} {}w", v.rel_path, v.width))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// All images known to the run, keyed by normalized relative path.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    entries: BTreeMap<String, ImageEntry>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ImageEntry) {
        self.entries.insert(normalize_key(&entry.rel_path), entry);
    }

    /// Look up by a path as written in front matter: leading `/` and
    /// backslashes are tolerated.
    pub fn get(&self, path: &str) -> Option<&ImageEntry> {
        self.entries.get(&normalize_key(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageEntry> {
        self.entries.values()
    }
}

pub fn normalize_key(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Compiled `[images]` settings.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub widths: Vec<u32>,
    pub quality: Quality,
    pub allow_upscale: bool,
    resizeable_pattern: Regex,
    resizeable_extensions: BTreeSet<String>,
    extensions: BTreeSet<String>,
}

impl ImageSettings {
    pub fn new(config: &ImagesConfig) -> Result<Self, ConfigError> {
        let lower = |v: &[String]| -> BTreeSet<String> {
            v.iter().map(|e| e.to_ascii_lowercase()).collect()
        };
        Ok(Self {
            widths: config.widths.clone(),
            quality: Quality::new(config.quality),
            allow_upscale: config.allow_upscale,
            resizeable_pattern: compile_pattern(
                "images.resizeable_pattern",
                &config.resizeable_pattern,
            )?,
            resizeable_extensions: lower(&config.resizeable_extensions),
            extensions: lower(&config.extensions),
        })
    }

    /// Whether a file is an image at all.
    pub fn is_image(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// True iff the stem carries a width suffix and the extension is
    /// resizeable.
    pub fn is_resizable(&self, path: &Path) -> bool {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        self.resizeable_pattern.is_match(stem)
            && extension(path).is_some_and(|ext| self.resizeable_extensions.contains(&ext))
    }

}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// One source image to resolve.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub path: PathBuf,
    /// Relative to the content root.
    pub rel_path: String,
}

/// Shared inputs for resolving a batch of images.
pub struct ResolveContext<'a> {
    pub settings: &'a ImageSettings,
    pub cache: &'a ImageCache,
    pub cache_dir: &'a Path,
    /// `--noImageCacheCheck`: any existing output is trusted.
    pub trust_existing: bool,
    pub backend: &'a dyn ImageBackend,
}

/// Result of resolving one image.
#[derive(Debug)]
pub struct Resolved {
    pub entry: ImageEntry,
    pub updates: Vec<CacheUpdate>,
    pub stats: CacheStats,
}

/// Resolve a single source image into a registry entry, producing any
/// missing or stale outputs in the cache directory.
pub fn resolve(source: &ImageSource, ctx: &ResolveContext<'_>) -> Result<Resolved, ImageError> {
    let rel_path = normalize_key(&source.rel_path);
    let source_hash = hash_file(&source.path).map_err(|e| ImageError::Io {
        path: rel_path.clone(),
        source: e,
    })?;

    if ctx.settings.is_resizable(&source.path) {
        resolve_resizeable(source, rel_path, source_hash, ctx)
    } else {
        resolve_standard(source, rel_path, source_hash, ctx)
    }
}

fn resolve_resizeable(
    source: &ImageSource,
    rel_path: String,
    source_hash: String,
    ctx: &ResolveContext<'_>,
) -> Result<Resolved, ImageError> {
    let dims = ctx
        .backend
        .identify(&source.path)
        .map_err(|e| ImageError::Backend {
            path: rel_path.clone(),
            source: e,
        })?;

    let rel = Path::new(&rel_path);
    let stem = rel.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = rel.extension().and_then(|s| s.to_str()).unwrap_or("");
    let parent = rel
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    let mut subs = BTreeMap::new();
    let mut updates = Vec::new();
    let mut stats = CacheStats::default();

    for size in variant_sizes(
        (dims.width, dims.height),
        &ctx.settings.widths,
        ctx.settings.allow_upscale,
    ) {
        // Full source stem, so `hero-1600` and `hero-2000` never share outputs
        let file_name = format!("{stem}-{}.{ext}", size.width);
        let variant_rel = if parent.is_empty() {
            file_name
        } else {
            format!("{parent}/{file_name}")
        };
        let output = ctx.cache_dir.join(&variant_rel);

        if ctx.cache.is_fresh(&output, &source_hash, ctx.trust_existing) {
            stats.hit();
        } else {
            tracing::debug!(path = %rel_path, width = size.width, "resizing");
            ctx.backend
                .resize(&ResizeParams {
                    source: source.path.clone(),
                    output: output.clone(),
                    width: size.width,
                    height: size.height,
                    quality: ctx.settings.quality,
                })
                .map_err(|e| ImageError::Backend {
                    path: rel_path.clone(),
                    source: e,
                })?;
            stats.miss();
        }
        updates.push(CacheUpdate::new(&output, &source_hash));
        subs.insert(
            size.width,
            ImageVariant {
                rel_path: variant_rel,
                width: size.width,
                height: size.height,
            },
        );
    }

    Ok(Resolved {
        entry: ImageEntry {
            rel_path,
            width: dims.width,
            height: dims.height,
            resizeable: true,
            subs: Some(subs),
            hash: source_hash,
        },
        updates,
        stats,
    })
}

fn resolve_standard(
    source: &ImageSource,
    rel_path: String,
    source_hash: String,
    ctx: &ResolveContext<'_>,
) -> Result<Resolved, ImageError> {
    let output = ctx.cache_dir.join(&rel_path);
    let mut stats = CacheStats::default();

    if ctx.cache.is_fresh(&output, &source_hash, ctx.trust_existing) {
        stats.hit();
    } else {
        let io_err = |e| ImageError::Io {
            path: rel_path.clone(),
            source: e,
        };
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::copy(&source.path, &output).map_err(io_err)?;
        stats.copy();
    }

    // Vector and animated formats may not be identifiable; that is not an error.
    let (width, height) = match ctx.backend.identify(&source.path) {
        Ok(d) => (d.width, d.height),
        Err(e) => {
            tracing::debug!(path = %rel_path, error = %e, "dimensions unavailable");
            (0, 0)
        }
    };

    Ok(Resolved {
        entry: ImageEntry {
            rel_path,
            width,
            height,
            resizeable: false,
            subs: None,
            hash: source_hash.clone(),
        },
        updates: vec![CacheUpdate::new(&output, &source_hash)],
        stats,
    })
}

/// Outcome of resolving a batch of images.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub updates: Vec<CacheUpdate>,
    pub stats: CacheStats,
    pub failures: Vec<ImageError>,
}

/// Resolve every source in parallel and register the results.
///
/// Failures are collected rather than aborting the batch; a failed image is
/// simply absent from the registry.
pub fn resolve_all(
    sources: &[ImageSource],
    ctx: &ResolveContext<'_>,
    registry: &mut ImageRegistry,
) -> BatchOutcome {
    let results: Vec<Result<Resolved, ImageError>> =
        sources.par_iter().map(|s| resolve(s, ctx)).collect();

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(resolved) => {
                outcome.stats.absorb(resolved.stats);
                outcome.updates.extend(resolved.updates);
                registry.insert(resolved.entry);
            }
            Err(e) => {
                tracing::warn!(error = %e, "image failed");
                outcome.failures.push(e);
            }
        }
    }
    outcome
}

/// Copy the image cache into the output tree, skipping dotfiles and
/// `.orig` backups. Returns the number of files copied.
pub fn publish_cache(cache_dir: &Path, output_dir: &Path) -> std::io::Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in walkdir::WalkDir::new(cache_dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|e| e == "orig") {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(cache_dir)
            .map_err(std::io::Error::other)?;
        let target = output_dir.join(rel);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(entry.path(), &target)?;
        copied += 1;
    }
    Ok(copied)
}
