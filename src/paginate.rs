//! Listing pages generated after indexing.
//!
//! Two kinds of synthetic article are produced here, both carrying a
//! [`Paging`] record with the slice of references one page shows:
//!
//! - **Pagination**: an article that declared `pagination` is split into
//!   `/url/`, `/url/page/2/`, … over its listing source.
//! - **Taxonomy listings**: with `taxonomy.listing_layout` set, every
//!   taxonomy value gets its own listing at `/{taxonomy}/{value}/`.
//!
//! Runs only after [`Site::sort_indices`], so every slice is in final order.

use crate::article::builder::resolve_layout;
use crate::article::output_path::output_for_path;
use crate::article::{Article, ArticleError, Paging};
use crate::collection::ArticleRef;
use crate::config::{OutputConfig, OutputMode};
use crate::naming::slugify;
use crate::site::Site;
use serde_json::Value;

/// Type name given to generated taxonomy listings.
pub const LISTING_TYPE: &str = "listing";

/// Path that page numbers hang off, without a trailing slash.
fn page_base(url: &str, output: &OutputConfig) -> String {
    match output.mode {
        OutputMode::Directory => url.trim_end_matches('/').to_string(),
        OutputMode::File => {
            if url == format!("/{}", output.index_file) {
                String::new()
            } else {
                url.strip_suffix(&output.extension).unwrap_or(url).to_string()
            }
        }
    }
}

/// Split `items` into pages of `base`. The first page keeps the base URL.
///
/// An empty listing still yields one (empty) page.
pub fn pages_for(
    base: &Article,
    items: &[ArticleRef],
    per_page: usize,
    output: &OutputConfig,
) -> Vec<Article> {
    let per_page = per_page.max(1);
    let pages = items.len().div_ceil(per_page).max(1);
    let root = page_base(&base.url, output);

    let locations: Vec<(String, String)> = (1..=pages)
        .map(|n| {
            if n == 1 {
                (base.url.clone(), base.output_file_name.clone())
            } else {
                let out = output_for_path(&format!("{root}/page/{n}"), false, output);
                (out.url, out.output_file_name)
            }
        })
        .collect();

    (0..pages)
        .map(|i| {
            let start = i * per_page;
            let end = (start + per_page).min(items.len());
            let mut page = base.clone();
            (page.url, page.output_file_name) = locations[i].clone();
            if i > 0 {
                page.prev = None;
                page.next = None;
                page.pagination = None;
            }
            page.paging = Some(Paging {
                page: i + 1,
                pages,
                per_page,
                items: items.get(start..end).unwrap_or_default().to_vec(),
                prev_url: i.checked_sub(1).map(|p| locations[p].0.clone()),
                next_url: locations.get(i + 1).map(|l| l.0.clone()),
            });
            page
        })
        .collect()
}

/// Expand every pending pagination registration. Returns the number of
/// extra pages created.
pub fn expand_pagination(site: &mut Site) -> usize {
    let pending = std::mem::take(&mut site.pending_pagination);
    let mut created = 0;
    for (url, spec) in pending {
        let Some(base) = site.all.get(&url).cloned() else {
            continue;
        };
        let per_page = spec.per_page.unwrap_or(site.config.taxonomy.per_page);
        let items: Vec<ArticleRef> = site
            .listing(&spec.source)
            .into_iter()
            .filter(|r| r.url != url)
            .collect();
        if items.is_empty() {
            tracing::warn!(path = %base.rel_path, source = %spec.source, "pagination source is empty");
        }
        for page in pages_for(&base, &items, per_page, &site.config.output) {
            let extra = page.url != url;
            if extra && site.all.contains_key(&page.url) {
                tracing::warn!(path = %base.rel_path, url = %page.url, "page URL taken, skipped");
                continue;
            }
            site.all.insert(page.url.clone(), page);
            if extra {
                created += 1;
            }
        }
    }
    created
}

/// Build one listing per taxonomy value when a listing layout is
/// configured. Returns the number of pages created.
pub fn build_taxonomy_listings(site: &mut Site) -> Result<usize, ArticleError> {
    let Some(layout_name) = site.config.taxonomy.listing_layout.clone() else {
        return Ok(0);
    };
    let layout = resolve_layout(&layout_name, &site.layout_dirs())?;
    let per_page = site.config.taxonomy.per_page;

    let mut pages = Vec::new();
    for (taxonomy, index) in &site.taxonomies {
        for entry in index.entries.values() {
            if entry.articles.is_empty() {
                continue;
            }
            let rel_path = format!("{}/{}", slugify(taxonomy), entry.slug);
            let out = output_for_path(&rel_path, false, &site.config.output);
            let mut front_matter = serde_json::Map::new();
            front_matter.insert("taxonomy".into(), Value::String(taxonomy.clone()));
            front_matter.insert("term".into(), Value::String(entry.name.clone()));
            let base = Article {
                rel_path,
                url: out.url,
                output_file_name: out.output_file_name,
                type_name: LISTING_TYPE.into(),
                layout: layout.clone(),
                front_matter,
                headline: entry.name.clone(),
                name: entry.name.clone(),
                title: entry.name.clone(),
                published: true,
                ..Default::default()
            };
            pages.extend(pages_for(&base, &entry.articles, per_page, &site.config.output));
        }
    }

    let mut created = 0;
    for page in pages {
        if let Some(existing) = site.all.get(&page.url) {
            tracing::warn!(url = %page.url, existing = %existing.rel_path, "listing URL taken, skipped");
            continue;
        }
        site.all.insert(page.url.clone(), page);
        created += 1;
    }
    Ok(created)
}
