//! Citations: sources an article quotes or builds on.
//!
//! ```yaml
//! citations:
//!   - headline: The Rust Book
//!     url: https://doc.rust-lang.org/book/
//!     author: [{name: Steve Klabnik}, {name: Carol Nichols}]
//!     site: {name: rust-lang.org, url: https://rust-lang.org}
//! ```
//!
//! Each entry gets an HTML attribution line: the title (linked when a URL is
//! known), then ` by ` and the authors, then ` on ` and the site.

use super::{Citation, NamedLink};
use maud::{Markup, html};
use serde_json::Value;

/// Parse and validate the `citations` front matter list.
///
/// Entries without a headline are skipped with a warning. A missing URL is
/// only noted.
pub fn process_citations(raw: Option<&Value>, rel_path: &str) -> Vec<Citation> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let headline = item
                .get("headline")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty());
            let Some(headline) = headline else {
                tracing::warn!(path = %rel_path, index = i, "citation has no headline, skipped");
                return None;
            };
            let url = item.get("url").and_then(Value::as_str).map(str::to_string);
            if url.is_none() {
                tracing::info!(path = %rel_path, index = i, "citation has no url");
            }
            let mut citation = Citation {
                headline: headline.to_string(),
                url,
                authors: named_links(item.get("author").or_else(|| item.get("authors"))),
                site: named_links(item.get("site")).into_iter().next(),
                attribution: String::new(),
            };
            citation.attribution = attribution(&citation).into_string();
            Some(citation)
        })
        .collect()
}

/// A single name, a `{name, url}` object, or a list of either.
fn named_links(value: Option<&Value>) -> Vec<NamedLink> {
    match value {
        Some(Value::String(name)) => vec![NamedLink {
            name: Some(name.clone()),
            url: None,
        }],
        Some(Value::Object(_)) => value
            .and_then(|v| serde_json::from_value::<NamedLink>(v.clone()).ok())
            .filter(|l| l.name.is_some() || l.url.is_some())
            .into_iter()
            .collect(),
        Some(Value::Array(items)) => items.iter().flat_map(|i| named_links(Some(i))).collect(),
        _ => Vec::new(),
    }
}

fn link(named: &NamedLink) -> Markup {
    match (&named.name, &named.url) {
        (Some(name), Some(url)) => html! { a href=(url) { (name) } },
        (Some(name), None) => html! { (name) },
        (None, Some(url)) => html! { a href=(url) { (url) } },
        (None, None) => html! {},
    }
}

pub fn attribution(c: &Citation) -> Markup {
    html! {
        @if let Some(url) = &c.url {
            a href=(url) { (c.headline) }
        } @else {
            cite { (c.headline) }
        }
        @if !c.authors.is_empty() {
            " by "
            @for (i, author) in c.authors.iter().enumerate() {
                @if i > 0 { ", " }
                (link(author))
            }
        }
        @if let Some(site) = &c.site {
            " on "
            (link(site))
        }
    }
}
