//! The derivation pipeline: a fixed sequence of steps run once per article
//! after it is built.
//!
//! | # | Step | Fails the article? |
//! |---|---|---|
//! | 1 | published / modified dates | when no date source exists |
//! | 2 | URL and output file | when no permalink pattern exists |
//! | 3 | reference files | no, skipped and logged |
//! | 4 | config imports | no, skipped and logged |
//! | 5 | authors | no |
//! | 6 | headline / name / title | no |
//! | 7 | summary and abstract | no |
//! | 8 | meta description | no |
//! | 9 | taxonomy split | no |
//! | 10 | citations | no, bad entries skipped |
//! | 11 | breadcrumbs | no, missing elements skipped |
//! | 12 | FAQ / how-to | no |
//! | 13 | words and reading time | no |
//! | 14 | pagination declaration | no |
//! | 15 | published state | no |
//!
//! Indexing (16) happens in [`Site::commit`] once the parallel batch is
//! done, and schema emission (17) in the `schema` plugin right before
//! rendering, when every index is complete.
//!
//! Steps run in table order; later steps read what earlier ones wrote.

use super::breadcrumb::build_breadcrumbs;
use super::builder::build_article;
use super::citation::process_citations;
use super::faq::process_faq;
use super::output_path::{OutputInputs, determine_output, file_stem};
use super::refs::{resolve_imports, resolve_references};
use super::{Article, ArticleError, ArticleImage, Author, PaginationSpec, Product, Review};
use crate::config::BreadcrumbElement;
use crate::dates::{DateValue, PublishedInputs, date_from_value, resolve_published};
use crate::events::{Event, EventBus};
use crate::markup::{MultiFormat, truncate_words};
use crate::naming::{humanize, strip_date_segment};
use crate::site::Site;
use serde_json::Value;
use std::path::Path;

/// Build, derive and announce one content file.
///
/// This is the unit of work of the late parse batch: it needs only `&Site`
/// and returns an owned article ready to commit.
pub fn process_file(path: &Path, site: &Site, bus: &EventBus) -> Result<Article, ArticleError> {
    let mut article = build_article(path, site)?;
    bus.emit_article(Event::AfterArticleParserInit, &mut article, site)?;
    derive(&mut article, site)?;
    if let Err(e) = bus.emit_article(Event::AfterArticleParserRun, &mut article, site) {
        tracing::warn!(path = %article.rel_path, error = %e, "enrichment failed");
    }
    Ok(article)
}

/// Run steps 1 to 15.
pub fn derive(article: &mut Article, site: &Site) -> Result<(), ArticleError> {
    resolve_dates(article, site)?;
    resolve_output(article, site)?;
    resolve_records(article, site);
    resolve_authors(article, site);
    resolve_names(article, site);
    resolve_abstract(article, site);
    resolve_description(article, site);
    resolve_taxonomies(article, site);
    article.citations = process_citations(article.fm("citations"), &article.rel_path);
    resolve_breadcrumbs(article, site);
    article.faq = process_faq(article.fm("faq"), &article.rel_path);
    article.howto = article.fm("howto").cloned();
    resolve_effort(article, site);
    resolve_pagination(article);
    resolve_published_state(article, site);
    resolve_images(article, site);
    Ok(())
}

/// A string or a list of strings, trimmed, blanks dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::String(_)) => vec![v],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Length of the leading date segment to strip from this file's stem.
fn grab_length(article: &Article, site: &Site) -> usize {
    match site.compiled_type(&article.type_name) {
        Some(t) if t.date.as_ref().is_some_and(|re| re.is_match(&article.file_name)) => {
            t.rule.date_grab_length
        }
        _ => 0,
    }
}

// =============================================================================
// 1. Dates
// =============================================================================

pub(crate) fn resolve_dates(article: &mut Article, site: &Site) -> Result<(), ArticleError> {
    let metadata = std::fs::metadata(&article.source_path).ok();
    let modified = metadata.as_ref().and_then(|m| m.modified().ok());
    let birth = metadata
        .as_ref()
        .and_then(|m| m.created().ok())
        .or(modified);
    let date_pattern = site
        .compiled_type(&article.type_name)
        .and_then(|t| t.date.as_ref());
    if let Some(raw) = article.fm("date")
        && date_from_value(raw).is_none()
    {
        tracing::warn!(path = %article.rel_path, date = %raw, "unparseable date, ignored");
    }

    let (published, source) = resolve_published(&PublishedInputs {
        front_matter: article.fm("date"),
        file_name: &article.file_name,
        filename_date: date_pattern,
        birth_time: birth,
    })
    .ok_or(ArticleError::NoDate)?;

    let formats = &site.config.dates;
    article.date_modified = Some(
        match article.fm("mdate").and_then(date_from_value) {
            Some(dt) => DateValue::new(dt, formats),
            None => match modified {
                Some(t) => DateValue::from_system_time(t, formats),
                None => DateValue::new(published, formats),
            },
        },
    );
    article.date_published = Some(DateValue::new(published, formats));
    article.date_source = Some(source);
    Ok(())
}

// =============================================================================
// 2. URL and output file
// =============================================================================

pub(crate) fn resolve_output(article: &mut Article, site: &Site) -> Result<(), ArticleError> {
    let rule_pattern = site
        .compiled_type(&article.type_name)
        .and_then(|t| t.rule.permalink.as_deref());
    let global = Some(site.config.permalinks.default.as_str());
    let pattern = [article.fm_str("permalink"), rule_pattern, global]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|p| !p.is_empty())
        .ok_or_else(|| ArticleError::NoPermalink(article.type_name.clone()))?
        .to_string();

    let date = article.date_published.as_ref().ok_or(ArticleError::NoDate)?;
    let out = determine_output(&OutputInputs {
        pattern: &pattern,
        year: date.year,
        month: date.month,
        day: date.day,
        dir: article.dir(),
        file_name: &article.file_name,
        grab_length: grab_length(article, site),
        plain: article.plain,
        output: &site.config.output,
    });
    article.url = out.url;
    article.output_file_name = out.output_file_name;
    Ok(())
}

// =============================================================================
// 3-4. References, imports and typed records
// =============================================================================

pub(crate) fn resolve_records(article: &mut Article, site: &Site) {
    let dir = article.dir().to_string();
    let rel_path = article.rel_path.clone();
    resolve_references(&mut article.front_matter, &site.content_dir(), &dir, &rel_path);
    resolve_imports(
        &mut article.front_matter,
        &site.config.products,
        &site.config.reviews,
        &rel_path,
    );
    article.products = typed_list::<Product>(article.fm("products"), "products", &rel_path);
    article.reviews = typed_list::<Review>(article.fm("reviews"), "reviews", &rel_path);
}

fn typed_list<T: serde::de::DeserializeOwned>(
    value: Option<&Value>,
    field: &str,
    rel_path: &str,
) -> Vec<T> {
    let items = match value {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single @ Value::Object(_)) => std::slice::from_ref(single),
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(path = %rel_path, field, error = %e, "record skipped");
                None
            }
        })
        .collect()
}

// =============================================================================
// 5. Authors
// =============================================================================

pub(crate) fn resolve_authors(article: &mut Article, site: &Site) {
    let mut keys = string_list(article.fm("authors"));
    if keys.is_empty() {
        keys = string_list(article.fm("author"));
    }
    if keys.is_empty()
        && let Some(first) = site.config.authors.keys().next()
    {
        keys.push(first.clone());
    }
    article.authors = keys
        .into_iter()
        .map(|key| match site.config.authors.get(&key) {
            Some(cfg) => Author {
                name: cfg.name.clone(),
                url: cfg.url.clone(),
                email: cfg.email.clone(),
                image: cfg.image.clone(),
                key,
            },
            None => Author {
                name: key.clone(),
                key,
                url: None,
                email: None,
                image: None,
            },
        })
        .collect();
    if article.authors.iter().any(|a| a.email.is_none()) {
        tracing::debug!(path = %article.rel_path, "author without email, share links limited");
    }
}

// =============================================================================
// 6. Names
// =============================================================================

pub(crate) fn resolve_names(article: &mut Article, site: &Site) {
    let title = article.fm_str("title").map(str::to_string);
    let name = article.fm_str("name").map(str::to_string);
    let headline = article
        .fm_str("headline")
        .map(str::to_string)
        .or_else(|| name.clone())
        .or_else(|| title.clone());
    let name = name.or_else(|| headline.clone()).unwrap_or_else(|| {
        humanize(strip_date_segment(
            file_stem(&article.file_name),
            grab_length(article, site),
        ))
    });
    article.headline = headline.unwrap_or_else(|| name.clone());
    article.title = title.unwrap_or_else(|| name.clone());
    article.name = name;
}

// =============================================================================
// 7-8. Abstract and description
// =============================================================================

pub(crate) fn resolve_abstract(article: &mut Article, site: &Site) {
    if article.abstract_text.is_some() || article.content.text.is_empty() {
        return;
    }
    let text = truncate_words(&article.content.text, site.config.content.abstract_length);
    article.abstract_text = Some(MultiFormat {
        source: text.clone(),
        html: format!("<p>{}</p>", maud::html! { (text) }.into_string()),
        text,
    });
    article.abstract_synthesized = true;
}

pub(crate) fn resolve_description(article: &mut Article, site: &Site) {
    if let Some(explicit) = article.fm_str("description") {
        article.description = Some(explicit.to_string());
        return;
    }
    if site.config.content.clever_descriptions
        && let Some(summary) = article.summary.as_ref().filter(|s| !s.text.is_empty())
    {
        article.description = Some(summary.text.clone());
        return;
    }
    if article.products.len() == 1
        && let Some(description) = article.reviews.first().and_then(|r| r.description.clone())
    {
        article.description = Some(description);
        return;
    }
    tracing::debug!(path = %article.rel_path, "no description");
}

// =============================================================================
// 9. Taxonomies
// =============================================================================

pub(crate) fn resolve_taxonomies(article: &mut Article, site: &Site) {
    let tax = &site.config.taxonomy;
    for taxonomy in &tax.types {
        let mut values = Vec::new();
        for v in string_list(article.fm(taxonomy)) {
            if !values.contains(&v) {
                values.push(v);
            }
        }
        if tax.split_sections && *taxonomy == tax.keyword_field {
            let (sections, rest): (Vec<String>, Vec<String>) =
                values.into_iter().partition(|v| tax.sections.contains(v));
            let (types, rest): (Vec<String>, Vec<String>) =
                rest.into_iter().partition(|v| tax.article_types.contains(v));
            article.article_section = if sections.is_empty() {
                vec![tax.default_section.clone()]
            } else {
                sections
            };
            article.article_types = types;
            values = rest;
        }
        article.taxonomies.insert(taxonomy.clone(), values);
    }
    if !tax.split_sections {
        article.article_section = string_list(article.fm("article_section"));
    }
}

// =============================================================================
// 11. Breadcrumbs
// =============================================================================

pub(crate) fn resolve_breadcrumbs(article: &mut Article, site: &Site) {
    let spec: Vec<BreadcrumbElement> = match article.fm("breadcrumbs") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(path = %article.rel_path, error = %e, "invalid breadcrumb spec");
                return;
            }
        },
        None => site.config.breadcrumbs.default.clone(),
    };
    if spec.is_empty() {
        tracing::debug!(path = %article.rel_path, "no breadcrumb spec");
        return;
    }
    article.breadcrumbs = build_breadcrumbs(&spec, article);
}

// =============================================================================
// 13. Effort
// =============================================================================

pub(crate) fn resolve_effort(article: &mut Article, site: &Site) {
    let words = article.content.word_count()
        + article.summary.as_ref().map_or(0, MultiFormat::word_count)
        + article.faq.as_ref().map_or(0, |f| f.word_count());
    article.words = words;
    if words == 0 {
        article.reading_time = 0.0;
        article.reading_time_rounded = 0;
        return;
    }
    let minutes = words as f64 / f64::from(site.config.content.words_per_minute.max(1));
    article.reading_time = minutes;
    article.reading_time_rounded = minutes.ceil() as u64;
}

// =============================================================================
// 14-15. Pagination and published state
// =============================================================================

pub(crate) fn resolve_pagination(article: &mut Article) {
    article.pagination = match article.fm("pagination") {
        Some(Value::Bool(true)) => Some(PaginationSpec {
            source: "all".into(),
            per_page: None,
        }),
        Some(Value::String(source)) => Some(PaginationSpec {
            source: source.clone(),
            per_page: None,
        }),
        Some(raw @ Value::Object(_)) => match serde_json::from_value(raw.clone()) {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!(path = %article.rel_path, error = %e, "invalid pagination");
                None
            }
        },
        _ => None,
    };
}

pub(crate) fn resolve_published_state(article: &mut Article, site: &Site) {
    article.published = match article.fm("published").and_then(Value::as_bool) {
        Some(explicit) => explicit,
        None => site.now.timestamp_millis() >= article.published_ms(),
    };
}

// =============================================================================
// Images
// =============================================================================

/// Collect `image` / `images` references, keeping only those the registry
/// knows.
pub(crate) fn resolve_images(article: &mut Article, site: &Site) {
    let mut images = Vec::new();
    if let Some(src) = article.fm_str("image") {
        images.push(ArticleImage {
            src: src.to_string(),
            tags: vec!["featured".into()],
            ..Default::default()
        });
    }
    if let Some(Value::Array(items)) = article.fm("images") {
        for item in items {
            let image = match item {
                Value::String(src) => ArticleImage {
                    src: src.clone(),
                    ..Default::default()
                },
                Value::Object(map) => {
                    let Some(src) = map.get("src").and_then(Value::as_str) else {
                        tracing::warn!(path = %article.rel_path, "image without src skipped");
                        continue;
                    };
                    let mut tags = string_list(map.get("tags"));
                    tags.extend(string_list(map.get("tag")));
                    ArticleImage {
                        src: src.to_string(),
                        tags,
                        alt: map.get("alt").and_then(Value::as_str).map(str::to_string),
                        caption: map.get("caption").and_then(Value::as_str).map(str::to_string),
                    }
                }
                _ => continue,
            };
            images.push(image);
        }
    }

    let dir = article.dir();
    article.images = images
        .into_iter()
        .filter_map(|mut image| {
            let local = if dir.is_empty() {
                image.src.clone()
            } else {
                format!("{dir}/{}", image.src)
            };
            let key = [local.as_str(), image.src.as_str()]
                .into_iter()
                .find_map(|candidate| site.images.get(candidate))
                .map(|entry| entry.rel_path.clone());
            match key {
                Some(key) => {
                    image.src = key;
                    Some(image)
                }
                None => {
                    tracing::warn!(path = %article.rel_path, image = %image.src, "image not found, skipped");
                    None
                }
            }
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthorConfig;
    use crate::dates::{DateSource, parse_date};
    use crate::imaging::ImageEntry;
    use crate::test_helpers::{bare_article, bare_site, site_at, write_file};
    use serde_json::json;
    use tempfile::TempDir;

    fn with_front(rel_path: &str, front: Value) -> Article {
        let mut a = bare_article(rel_path);
        if let Value::Object(map) = front {
            a.front_matter = map;
        }
        a
    }

    fn published_on(article: &mut Article, date: &str, site: &Site) {
        article.date_published =
            Some(DateValue::new(parse_date(date).unwrap(), &site.config.dates));
    }

    // =========================================================================
    // Dates
    // =========================================================================

    #[test]
    fn explicit_date_beats_filename_and_filesystem() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "content/2024-01-02-hello.md", "x");
        let site = site_at(tmp.path());
        let mut a = with_front("2024-01-02-hello.md", json!({"date": "2020-05-06"}));
        a.type_name = "post".into();
        a.source_path = tmp.path().join("content/2024-01-02-hello.md");

        resolve_dates(&mut a, &site).unwrap();
        assert_eq!(a.date_source, Some(DateSource::FrontMatter));
        assert_eq!(a.date_published.as_ref().unwrap().year, 2020);
    }

    #[test]
    fn filename_date_beats_filesystem() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "content/2024-01-02-hello.md", "x");
        let site = site_at(tmp.path());
        let mut a = bare_article("2024-01-02-hello.md");
        a.type_name = "post".into();
        a.source_path = tmp.path().join("content/2024-01-02-hello.md");

        resolve_dates(&mut a, &site).unwrap();
        assert_eq!(a.date_source, Some(DateSource::FileName));
        let d = a.date_published.unwrap();
        assert_eq!((d.year, d.month, d.day), (2024, 1, 2));
        assert!(a.date_modified.is_some());
    }

    #[test]
    fn filesystem_date_as_last_resort() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "content/about.md", "x");
        let site = site_at(tmp.path());
        let mut a = bare_article("about.md");
        a.source_path = tmp.path().join("content/about.md");

        resolve_dates(&mut a, &site).unwrap();
        assert_eq!(a.date_source, Some(DateSource::FileSystem));
    }

    #[test]
    fn explicit_mdate() {
        let site = bare_site();
        let mut a = with_front("a.md", json!({"date": "2024-01-01", "mdate": "2024-02-03"}));
        resolve_dates(&mut a, &site).unwrap();
        assert_eq!(a.date_modified.unwrap().month, 2);
    }

    #[test]
    fn no_date_source_fails() {
        let site = bare_site();
        let mut a = bare_article("missing.md");
        a.source_path = "/definitely/not/here.md".into();
        assert!(matches!(resolve_dates(&mut a, &site), Err(ArticleError::NoDate)));
    }

    // =========================================================================
    // Output
    // =========================================================================

    #[test]
    fn post_url_from_type_permalink() {
        let site = bare_site();
        let mut a = bare_article("posts/2024-01-02-hello.md");
        a.type_name = "post".into();
        published_on(&mut a, "2024-01-02", &site);
        resolve_output(&mut a, &site).unwrap();
        assert_eq!(a.url, "/2024/01/hello/");
        assert_eq!(a.output_file_name, "/2024/01/hello/index.html");
    }

    #[test]
    fn front_matter_permalink_wins() {
        let site = bare_site();
        let mut a = with_front("2024-01-02-hello.md", json!({"permalink": ":fn"}));
        a.type_name = "post".into();
        published_on(&mut a, "2024-01-02", &site);
        resolve_output(&mut a, &site).unwrap();
        assert_eq!(a.url, "/hello/");
        assert_eq!(a.output_file_name, "/hello/index.html");
    }

    #[test]
    fn undated_post_keeps_full_stem() {
        let site = bare_site();
        let mut a = bare_article("posts/a-long-post-title.md");
        a.type_name = "post".into();
        published_on(&mut a, "2024-03-04", &site);
        resolve_output(&mut a, &site).unwrap();
        assert_eq!(a.url, "/2024/03/a-long-post-title/");
    }

    #[test]
    fn no_pattern_anywhere_fails() {
        let mut site = bare_site();
        site.config.permalinks.default = String::new();
        site.types[1].rule.permalink = None;
        let mut a = bare_article("about.md");
        published_on(&mut a, "2024-01-01", &site);
        assert!(matches!(
            resolve_output(&mut a, &site),
            Err(ArticleError::NoPermalink(_))
        ));
    }

    // =========================================================================
    // Authors and names
    // =========================================================================

    #[test]
    fn authors_resolve_against_config() {
        let mut site = bare_site();
        site.config.authors.insert(
            "jane".into(),
            AuthorConfig {
                name: "Jane Doe".into(),
                url: Some("https://jane.example".into()),
                email: None,
                image: None,
            },
        );
        let mut a = with_front("a.md", json!({"authors": ["jane", "guest"]}));
        resolve_authors(&mut a, &site);
        assert_eq!(a.authors[0].name, "Jane Doe");
        assert_eq!(a.authors[1].name, "guest");
        assert!(a.authors[1].url.is_none());

        let mut b = bare_article("b.md");
        resolve_authors(&mut b, &site);
        assert_eq!(b.authors[0].key, "jane");
    }

    #[test]
    fn names_fall_back_in_order() {
        let site = bare_site();
        let mut a = with_front("a.md", json!({"title": "The Title"}));
        resolve_names(&mut a, &site);
        assert_eq!(a.headline, "The Title");
        assert_eq!(a.name, "The Title");

        let mut b = with_front("b.md", json!({"name": "Short", "title": "Long Title"}));
        resolve_names(&mut b, &site);
        assert_eq!(b.headline, "Short");
        assert_eq!(b.title, "Long Title");

        let mut c = bare_article("posts/2024-01-02-my_first-post.md");
        c.type_name = "post".into();
        resolve_names(&mut c, &site);
        assert_eq!(c.name, "My first post");
        assert_eq!(c.headline, "My first post");
    }

    // =========================================================================
    // Abstract and description
    // =========================================================================

    #[test]
    fn abstract_synthesized_from_content() {
        let mut site = bare_site();
        site.config.content.abstract_length = 12;
        let mut a = bare_article("a.md");
        a.content = MultiFormat::from_markdown("alpha beta gamma delta");
        resolve_abstract(&mut a, &site);
        assert!(a.abstract_synthesized);
        assert_eq!(a.abstract_text.unwrap().text, "alpha beta…");
    }

    #[test]
    fn authored_abstract_is_kept() {
        let site = bare_site();
        let mut a = bare_article("a.md");
        a.content = MultiFormat::from_markdown("body");
        a.abstract_text = Some(MultiFormat::from_markdown("mine"));
        resolve_abstract(&mut a, &site);
        assert!(!a.abstract_synthesized);
        assert_eq!(a.abstract_text.unwrap().text, "mine");
    }

    #[test]
    fn description_sources() {
        let mut site = bare_site();
        let mut a = with_front("a.md", json!({"description": "Explicit"}));
        a.summary = Some(MultiFormat::from_markdown("Summary"));
        resolve_description(&mut a, &site);
        assert_eq!(a.description.as_deref(), Some("Explicit"));

        let mut b = bare_article("b.md");
        b.summary = Some(MultiFormat::from_markdown("From *summary*"));
        resolve_description(&mut b, &site);
        assert_eq!(b.description.as_deref(), Some("From summary"));

        site.config.content.clever_descriptions = false;
        let mut c = bare_article("c.md");
        c.summary = Some(MultiFormat::from_markdown("ignored"));
        c.products = vec![Product::default()];
        c.reviews = vec![Review {
            description: Some("Review text".into()),
            ..Default::default()
        }];
        resolve_description(&mut c, &site);
        assert_eq!(c.description.as_deref(), Some("Review text"));
    }

    // =========================================================================
    // Taxonomies
    // =========================================================================

    #[test]
    fn sections_split_from_keywords() {
        let mut site = bare_site();
        site.config.taxonomy.split_sections = true;
        site.config.taxonomy.sections = vec!["tutorials".into()];
        let mut a = with_front("a.md", json!({"tags": ["howto", "linux", "tutorials"]}));
        resolve_taxonomies(&mut a, &site);
        assert_eq!(a.article_section, vec!["tutorials"]);
        assert_eq!(a.taxonomies["tags"], vec!["howto", "linux"]);
    }

    #[test]
    fn default_section_and_article_types() {
        let mut site = bare_site();
        site.config.taxonomy.split_sections = true;
        site.config.taxonomy.article_types = vec!["review".into()];
        let mut a = with_front("a.md", json!({"tags": ["review", "rust", "rust"]}));
        resolve_taxonomies(&mut a, &site);
        assert_eq!(a.article_section, vec!["general"]);
        assert_eq!(a.article_types, vec!["review"]);
        assert_eq!(a.taxonomies["tags"], vec!["rust"]);
    }

    #[test]
    fn single_string_taxonomy() {
        let site = bare_site();
        let mut a = with_front("a.md", json!({"tags": "solo"}));
        resolve_taxonomies(&mut a, &site);
        assert_eq!(a.taxonomies["tags"], vec!["solo"]);
    }

    // =========================================================================
    // Breadcrumbs, effort, pagination, published
    // =========================================================================

    #[test]
    fn breadcrumbs_from_config_default() {
        let mut site = bare_site();
        site.config.breadcrumbs.default = vec![
            BreadcrumbElement::Calc { calc: "path".into() },
            BreadcrumbElement::Calc { calc: "self".into() },
        ];
        let mut a = bare_article("index.md");
        a.name = "Home".into();
        a.url = "/".into();
        resolve_breadcrumbs(&mut a, &site);
        assert_eq!(a.breadcrumbs.len(), 1);
        assert_eq!(a.breadcrumbs[0].name, "Home");
    }

    #[test]
    fn zero_words_zero_reading_time() {
        let site = bare_site();
        let mut a = bare_article("a.md");
        resolve_effort(&mut a, &site);
        assert_eq!(a.words, 0);
        assert_eq!(a.reading_time, 0.0);
        assert_eq!(a.reading_time_rounded, 0);
    }

    #[test]
    fn reading_time_counts_summary_and_faq() {
        let mut site = bare_site();
        site.config.content.words_per_minute = 4;
        let mut a = with_front("a.md", json!({}));
        a.content = MultiFormat::from_markdown("one two three");
        a.summary = Some(MultiFormat::from_markdown("four five"));
        a.faq = process_faq(Some(&json!([{"q": "?", "a": "six seven"}])), "a.md");
        resolve_effort(&mut a, &site);
        assert_eq!(a.words, 7);
        assert_eq!(a.reading_time, 1.75);
        assert_eq!(a.reading_time_rounded, 2);
    }

    #[test]
    fn pagination_shapes() {
        let mut a = with_front("a.md", json!({"pagination": {"source": "post", "per_page": 5}}));
        resolve_pagination(&mut a);
        assert_eq!(
            a.pagination,
            Some(PaginationSpec {
                source: "post".into(),
                per_page: Some(5)
            })
        );

        let mut b = with_front("b.md", json!({"pagination": true}));
        resolve_pagination(&mut b);
        assert_eq!(b.pagination.unwrap().source, "all");
    }

    #[test]
    fn published_state() {
        let site = bare_site();
        let mut past = bare_article("a.md");
        published_on(&mut past, "2000-01-01", &site);
        resolve_published_state(&mut past, &site);
        assert!(past.published);

        let mut future = bare_article("b.md");
        published_on(&mut future, "2999-01-01", &site);
        resolve_published_state(&mut future, &site);
        assert!(!future.published);

        let mut forced = with_front("c.md", json!({"published": true}));
        published_on(&mut forced, "2999-01-01", &site);
        resolve_published_state(&mut forced, &site);
        assert!(forced.published);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn images_resolve_against_registry() {
        let mut site = bare_site();
        for rel in ["posts/cover-1600.jpg", "shared/logo.svg"] {
            site.images.insert(ImageEntry {
                rel_path: rel.into(),
                width: 1,
                height: 1,
                resizeable: false,
                subs: None,
                hash: "h".into(),
            });
        }
        let mut a = with_front(
            "posts/a.md",
            json!({
                "image": "cover-1600.jpg",
                "images": [
                    {"src": "shared/logo.svg", "tag": "og", "alt": "Logo"},
                    "missing.png"
                ]
            }),
        );
        resolve_images(&mut a, &site);
        assert_eq!(a.images.len(), 2);
        assert_eq!(a.images[0].src, "posts/cover-1600.jpg");
        assert_eq!(a.images[0].tags, vec!["featured"]);
        assert_eq!(a.images[1].tags, vec!["og"]);
        assert_eq!(a.images[1].alt.as_deref(), Some("Logo"));
    }

    // =========================================================================
    // Whole file
    // =========================================================================

    #[test]
    fn process_file_runs_every_step() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "layouts/post.hbs", "{{name}}");
        write_file(
            tmp.path(),
            "content/posts/2024-01-02-hello.md",
            "---\ntitle: Hello\ntags: [rust, cli]\n---\nSome body words here.",
        );
        let site = site_at(tmp.path());
        let bus = EventBus::new();

        let a = process_file(
            &tmp.path().join("content/posts/2024-01-02-hello.md"),
            &site,
            &bus,
        )
        .unwrap();
        assert_eq!(a.rel_path, "posts/2024-01-02-hello.md");
        assert_eq!(a.url, "/2024/01/hello/");
        assert_eq!(a.name, "Hello");
        assert_eq!(a.taxonomies["tags"], vec!["rust", "cli"]);
        assert_eq!(a.words, 4);
        assert!(a.published);
        assert!(a.abstract_synthesized);
    }

    #[test]
    fn structural_hook_failure_fails_article() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "layouts/page.hbs", "x");
        write_file(tmp.path(), "content/a.md", "body");
        let site = site_at(tmp.path());
        let mut bus = EventBus::new();
        bus.on_article(Event::AfterArticleParserInit, "strict", 50, |_, _| {
            Err(crate::events::PluginError::failed("strict", "rejected"))
        })
        .unwrap();
        let err = process_file(&tmp.path().join("content/a.md"), &site, &bus).unwrap_err();
        assert!(matches!(err, ArticleError::Plugin(_)));
    }

    #[test]
    fn enrichment_hook_failure_is_logged_only() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "layouts/page.hbs", "x");
        write_file(tmp.path(), "content/a.md", "body");
        let site = site_at(tmp.path());
        let mut bus = EventBus::new();
        bus.on_article(Event::AfterArticleParserRun, "flaky", 50, |_, _| {
            Err(crate::events::PluginError::failed("flaky", "oops"))
        })
        .unwrap();
        assert!(process_file(&tmp.path().join("content/a.md"), &site, &bus).is_ok());
    }
}
