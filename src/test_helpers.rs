//! Shared test utilities for the quire test suite.
//!
//! Provides fixture setup, minimal sites and articles, and lookup helpers
//! that panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let site = site_at(tmp.path());
//!
//! let mut article = dated_article("posts/a.md", "/a/", 1_000);
//! article.taxonomies.insert("tags".into(), vec!["rust".into()]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::article::Article;
use crate::config::SiteConfig;
use crate::dates::DateValue;
use crate::site::Site;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write a file, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

// =========================================================================
// Minimal sites and articles
// =========================================================================

/// Default config with a production domain so either mode resolves.
pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.site.domain = Some("example.com".into());
    config.site.title = "Test Site".into();
    config
}

/// A dev-mode site rooted at `root` with the default config.
pub fn site_at(root: &Path) -> Site {
    Site::new(root, test_config(), true).unwrap()
}

/// A dev-mode site whose root need not exist.
pub fn bare_site() -> Site {
    site_at(Path::new("/nonexistent-quire-site"))
}

/// A published page article with only its paths set.
pub fn bare_article(rel_path: &str) -> Article {
    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();
    Article {
        rel_path: rel_path.to_string(),
        file_name,
        type_name: "page".into(),
        published: true,
        ..Default::default()
    }
}

/// A published page article with a URL, a name and a publish time.
pub fn dated_article(rel_path: &str, url: &str, epoch_ms: i64) -> Article {
    let mut article = bare_article(rel_path);
    article.url = url.to_string();
    article.name = url.trim_matches('/').to_string();
    article.date_published = Some(DateValue {
        year: 2024,
        month: 1,
        day: 1,
        epoch_ms,
        iso: String::new(),
        date: String::new(),
        time: String::new(),
    });
    article
}

// =========================================================================
// Lookups (panic with a clear message on miss)
// =========================================================================

/// Find a committed article by URL. Panics if not found.
pub fn find_article<'a>(site: &'a Site, url: &str) -> &'a Article {
    site.all.get(url).unwrap_or_else(|| {
        let urls: Vec<&str> = site.all.keys().collect();
        panic!("article '{url}' not found. Available: {urls:?}")
    })
}
