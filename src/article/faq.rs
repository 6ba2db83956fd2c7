//! FAQ blocks.
//!
//! Front matter may give a bare list of questions or a named block:
//!
//! ```yaml
//! faq:
//!   name: Installing
//!   faqs:
//!     - q: Does it run on Windows?
//!       a: Yes, see *the guide*.
//! ```
//!
//! Both normalize to [`Faq`], with each answer as multi-format content.

use super::{Faq, FaqItem};
use crate::markup::MultiFormat;
use serde_json::Value;

pub fn process_faq(raw: Option<&Value>, rel_path: &str) -> Option<Faq> {
    let (name, items) = match raw? {
        Value::Array(items) => (None, items),
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str).map(str::to_string);
            match map.get("faqs") {
                Some(Value::Array(items)) => (name, items),
                _ => {
                    tracing::warn!(path = %rel_path, "faq block has no faqs list");
                    return None;
                }
            }
        }
        _ => {
            tracing::warn!(path = %rel_path, "faq must be a list or a {{name, faqs}} block");
            return None;
        }
    };

    let faqs: Vec<FaqItem> = items
        .iter()
        .filter_map(|item| {
            let q = item.get("q").or_else(|| item.get("question"))?.as_str()?;
            let a = item.get("a").or_else(|| item.get("answer"))?;
            let (a, _) = MultiFormat::from_value(a)?;
            Some(FaqItem {
                q: q.trim().to_string(),
                a,
            })
        })
        .collect();

    if faqs.len() < items.len() {
        tracing::warn!(path = %rel_path, skipped = items.len() - faqs.len(), "incomplete faq entries skipped");
    }
    if faqs.is_empty() {
        return None;
    }
    Some(Faq { name, faqs })
}

impl Faq {
    pub fn word_count(&self) -> usize {
        self.faqs.iter().map(|f| f.a.word_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_list() {
        let raw = json!([{"q": "Why?", "a": "Because *so*."}]);
        let faq = process_faq(Some(&raw), "a.md").unwrap();
        assert!(faq.name.is_none());
        assert_eq!(faq.faqs[0].q, "Why?");
        assert!(faq.faqs[0].a.html.contains("<em>so</em>"));
        assert_eq!(faq.word_count(), 2);
    }

    #[test]
    fn named_block() {
        let raw = json!({"name": "Setup", "faqs": [{"question": "How?", "answer": ["one", "two"]}]});
        let faq = process_faq(Some(&raw), "a.md").unwrap();
        assert_eq!(faq.name.as_deref(), Some("Setup"));
        assert!(faq.faqs[0].a.html.contains("<ol>"));
    }

    #[test]
    fn incomplete_entries_dropped() {
        let raw = json!([{"q": "No answer"}, {"q": "Ok", "a": "yes"}]);
        let faq = process_faq(Some(&raw), "a.md").unwrap();
        assert_eq!(faq.faqs.len(), 1);
    }

    #[test]
    fn invalid_shapes() {
        assert!(process_faq(Some(&json!("text")), "a.md").is_none());
        assert!(process_faq(Some(&json!({"name": "x"})), "a.md").is_none());
        assert!(process_faq(None, "a.md").is_none());
    }
}
