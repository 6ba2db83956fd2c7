//! Ordered collections and taxonomy indices.
//!
//! [`Collection`] keeps insertion order and a key index side by side so it
//! can be re-sorted without losing or duplicating anything. The site keeps
//! three kinds: every article by URL, article references per type, and one
//! [`TaxonomyIndex`] per taxonomy type.
//!
//! Taxonomy sorting is deliberately separate from classification: callers
//! must finish adding every article before calling [`TaxonomyIndex::sort`].

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Key → value mapping that preserves order and supports re-sorting.
#[derive(Debug, Clone)]
pub struct Collection<V> {
    items: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Collection<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced value keeps its position and is
    /// returned.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.items[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.items.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.items[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.index.get(key).map(|&i| &mut self.items[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.items.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.items.iter_mut().map(|(_, v)| v)
    }

    /// Remove by key. Later items shift up; order is otherwise kept.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let i = self.index.remove(key)?;
        let (_, value) = self.items.remove(i);
        self.reindex();
        Some(value)
    }

    /// Re-sort with `compare`. Stable.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        self.items.sort_by(|a, b| compare(&a.1, &b.1));
        self.reindex();
    }

    /// Descending by the key `f` extracts (newest first for dates).
    pub fn sort_desc_by_key<K: Ord, F: FnMut(&V) -> K>(&mut self, mut f: F) {
        self.sort_by(|a, b| f(b).cmp(&f(a)));
    }

    /// Take every value out, leaving the collection empty.
    pub fn drain(&mut self) -> Vec<(String, V)> {
        self.index.clear();
        std::mem::take(&mut self.items)
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
    }
}

impl<V> FromIterator<(String, V)> for Collection<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut c = Collection::new();
        for (k, v) in iter {
            c.insert(k, v);
        }
        c
    }
}

/// Lightweight pointer to an article, as stored in indices and exposed to
/// templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRef {
    pub url: String,
    pub title: String,
    pub date_ms: i64,
}

/// One taxonomy value and the articles carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    pub name: String,
    pub slug: String,
    pub articles: Vec<ArticleRef>,
    pub count: usize,
}

impl TaxonomyEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: crate::naming::slugify(name),
            articles: Vec::new(),
            count: 0,
        }
    }

    /// Append and count. Not idempotent: adding twice counts twice.
    pub fn add_article(&mut self, article: ArticleRef) {
        self.articles.push(article);
        self.count += 1;
    }

    /// Newest first.
    pub fn sort_articles_by_date(&mut self) {
        self.articles.sort_by(|a, b| b.date_ms.cmp(&a.date_ms));
    }
}

/// All values of one taxonomy type (e.g. `tags`).
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    pub entries: Collection<TaxonomyEntry>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `article` carries `value`, creating the entry on first
    /// use.
    pub fn add(&mut self, value: &str, article: ArticleRef) {
        if !self.entries.contains_key(value) {
            self.entries
                .insert(value.to_string(), TaxonomyEntry::new(value));
        }
        if let Some(entry) = self.entries.get_mut(value) {
            entry.add_article(article);
        }
    }

    pub fn get(&self, value: &str) -> Option<&TaxonomyEntry> {
        self.entries.get(value)
    }

    /// Descending by article count. Ties keep their current order.
    pub fn sort_by_count(&mut self) {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Sort entries by count and each entry's articles by date.
    pub fn sort(&mut self) {
        self.sort_by_count();
        for entry in self.entries.values_mut() {
            entry.sort_articles_by_date();
        }
    }

    /// Remove every reference to `url` (used when an article is replaced).
    /// Entries left without articles are dropped.
    pub fn remove_article(&mut self, url: &str) {
        for entry in self.entries.values_mut() {
            let before = entry.articles.len();
            entry.articles.retain(|a| a.url != url);
            entry.count -= before - entry.articles.len();
        }
        let empty: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.count == 0)
            .map(|e| e.name.clone())
            .collect();
        for name in empty {
            self.entries.remove(&name);
        }
    }
}
