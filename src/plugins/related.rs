//! Related articles by shared taxonomy values.
//!
//! After every article is indexed, each one gets up to `max` others ranked
//! by how many `(taxonomy, value)` pairs they share, newest first on ties.
//! The result lands in `extensions.related` as a list of article references.

use crate::collection::ArticleRef;
use crate::config::SiteConfig;
use crate::events::{DEFAULT_PRIORITY, Event, EventBus, Plugin, PluginError};
use crate::site::Site;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub struct Related;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct RelatedConfig {
    enabled: bool,
    max: usize,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max: 5,
        }
    }
}

impl Plugin for Related {
    fn name(&self) -> &'static str {
        "related"
    }

    fn default_config(&self) -> Option<toml::Value> {
        toml::Value::try_from(RelatedConfig::default()).ok()
    }

    fn register(&self, bus: &mut EventBus, config: &SiteConfig) -> Result<(), PluginError> {
        let settings: RelatedConfig = config.plugin_section(self.name())?;
        let max = settings.max;
        bus.on_site(Event::AfterParseLate, self.name(), DEFAULT_PRIORITY, move |site| {
            link_related(site, max);
            Ok(())
        })?;
        Ok(())
    }
}

/// Compute `extensions.related` for every committed article.
pub fn link_related(site: &mut Site, max: usize) {
    let tracked: Vec<&String> = site.taxonomies.keys().collect();
    let profiles: Vec<(String, i64, ArticleRef, BTreeSet<(String, String)>)> = site
        .all
        .values()
        .filter(|a| a.paging.is_none())
        .map(|a| {
            let pairs = a
                .taxonomies
                .iter()
                .filter(|(t, _)| tracked.contains(t))
                .flat_map(|(t, values)| values.iter().map(move |v| (t.clone(), v.clone())))
                .collect();
            (a.url.clone(), a.published_ms(), a.as_ref_entry(), pairs)
        })
        .collect();

    let mut results = Vec::new();
    for (url, _, _, pairs) in &profiles {
        if pairs.is_empty() {
            continue;
        }
        let mut scored: Vec<(usize, i64, &ArticleRef)> = profiles
            .iter()
            .filter(|(other, ..)| other != url)
            .map(|(_, date, entry, other_pairs)| {
                (pairs.intersection(other_pairs).count(), *date, entry)
            })
            .filter(|(score, ..)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        let related: Vec<ArticleRef> = scored
            .into_iter()
            .take(max)
            .map(|(_, _, entry)| entry.clone())
            .collect();
        results.push((url.clone(), related));
    }

    for (url, related) in results {
        if let Some(article) = site.all.get_mut(&url) {
            article
                .extensions
                .insert("related".into(), serde_json::to_value(related).unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{bare_site, dated_article, find_article};

    fn tagged(url: &str, date: i64, tags: &[&str]) -> crate::article::Article {
        let mut a = dated_article(&format!("{}.md", url.trim_matches('/')), url, date);
        a.taxonomies
            .insert("tags".into(), tags.iter().map(|t| t.to_string()).collect());
        a
    }

    fn related_urls(site: &Site, url: &str) -> Vec<String> {
        find_article(site, url).extensions["related"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["url"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn ranked_by_shared_values_then_date() {
        let mut site = bare_site();
        site.commit(tagged("/a/", 1, &["rust", "cli", "web"])).unwrap();
        site.commit(tagged("/b/", 2, &["rust", "cli"])).unwrap();
        site.commit(tagged("/c/", 3, &["rust"])).unwrap();
        site.commit(tagged("/d/", 4, &["web"])).unwrap();
        site.commit(tagged("/e/", 5, &["go"])).unwrap();

        link_related(&mut site, 5);
        assert_eq!(related_urls(&site, "/a/"), vec!["/b/", "/d/", "/c/"]);
        assert_eq!(related_urls(&site, "/e/"), Vec::<String>::new());
    }

    #[test]
    fn max_limits_results() {
        let mut site = bare_site();
        for i in 0..4 {
            site.commit(tagged(&format!("/p{i}/"), i, &["rust"])).unwrap();
        }
        link_related(&mut site, 2);
        assert_eq!(related_urls(&site, "/p0/"), vec!["/p3/", "/p2/"]);
    }

    #[test]
    fn untagged_article_gets_nothing() {
        let mut site = bare_site();
        site.commit(dated_article("a.md", "/a/", 1)).unwrap();
        link_related(&mut site, 5);
        assert!(!find_article(&site, "/a/").extensions.contains_key("related"));
    }

    #[test]
    fn default_config_round_trips() {
        let mut config = SiteConfig::default();
        config.merge_section("related", Related.default_config().unwrap());
        let settings: RelatedConfig = config.plugin_section("related").unwrap();
        assert_eq!(settings.max, 5);
        assert!(settings.enabled);
    }
}
