//! Breadcrumb trails.
//!
//! A trail is declared as a list of elements, either literal links or
//! `calc` directives evaluated against the article:
//!
//! ```yaml
//! breadcrumbs:
//!   - {name: Home, url: /}
//!   - calc: path      # containing directory, omitted at the root
//!   - calc: tags#0    # first tag, omitted when there is none
//!   - calc: self
//! ```
//!
//! Elements whose source data is missing are left out of the trail.

use super::{Article, Crumb};
use crate::config::BreadcrumbElement;
use crate::naming::{collapse_slashes, humanize, slugify};

/// Evaluate a breadcrumb spec for an article.
pub fn build_breadcrumbs(spec: &[BreadcrumbElement], article: &Article) -> Vec<Crumb> {
    spec.iter()
        .filter_map(|element| match element {
            BreadcrumbElement::Link { name, url } => Some(Crumb {
                name: name.clone(),
                url: url.clone(),
            }),
            BreadcrumbElement::Calc { calc } => evaluate(calc, article),
        })
        .collect()
}

fn evaluate(calc: &str, article: &Article) -> Option<Crumb> {
    match calc {
        "self" => Some(Crumb {
            name: article.name.clone(),
            url: article.url.clone(),
        }),
        "path" => {
            let dir = article.dir();
            if dir.is_empty() {
                return None;
            }
            let last = dir.rsplit('/').next().unwrap_or(dir);
            Some(Crumb {
                name: humanize(last),
                url: collapse_slashes(&format!("{dir}/")),
            })
        }
        other => {
            let Some((taxonomy, index)) = other.split_once('#') else {
                tracing::warn!(path = %article.rel_path, calc = other, "unknown breadcrumb calc");
                return None;
            };
            let Ok(index) = index.parse::<usize>() else {
                tracing::warn!(path = %article.rel_path, calc = other, "breadcrumb index is not a number");
                return None;
            };
            let value = article.taxonomies.get(taxonomy)?.get(index)?;
            Some(Crumb {
                name: value.clone(),
                url: format!("/{}/{}/", slugify(taxonomy), slugify(value)),
            })
        }
    }
}
