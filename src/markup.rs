//! Multi-format content fields.
//!
//! Every prose field an article carries (the body, the summary, the
//! abstract, FAQ answers) is kept in three forms at once: the markdown the
//! author wrote, the HTML rendered from it, and plain text derived from the
//! HTML for word counts, descriptions and feeds.
//!
//! Markdown goes through `pulldown-cmark`. Plain text is stripped from the
//! rendered HTML, so text an author wrapped in raw HTML blocks still counts
//! and the result never contains markup.

use pulldown_cmark::{Options, Parser, html as md_html};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One prose field in source, HTML and plain-text form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiFormat {
    pub source: String,
    pub html: String,
    pub text: String,
}

impl MultiFormat {
    /// Build from markdown source.
    pub fn from_markdown(source: &str) -> Self {
        let html = render_html(source);
        let text = strip_tags(&html);
        Self {
            source: source.to_string(),
            html,
            text,
        }
    }

    /// Build from a front matter value: a string is markdown, a list becomes
    /// a numbered markdown list rendered as one block.
    ///
    /// Returns the field and whether it came from a list. Other kinds yield
    /// `None`.
    pub fn from_value(value: &Value) -> Option<(Self, bool)> {
        match value {
            Value::String(s) => Some((Self::from_markdown(s), false)),
            Value::Array(items) => {
                let source = numbered_list(items);
                Some((Self::from_markdown(&source), true))
            }
            Value::Number(n) => Some((Self::from_markdown(&n.to_string()), false)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }
}

/// Render list items as `1. item` lines.
pub fn numbered_list(items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}. {}", i + 1, text.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Markdown → HTML.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Elements whose boundaries separate words in plain text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "li", "ul", "ol", "blockquote", "pre", "table", "tr", "td", "th",
    "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "figure", "figcaption",
];

/// Strip tags from rendered HTML and decode the basic entities. Block
/// boundaries become single spaces; inline tags vanish.
pub fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut tag: Option<String> = None;
    for c in html.chars() {
        match tag.as_mut() {
            None if c == '<' => tag = Some(String::new()),
            None => result.push(c),
            Some(name) if c != '>' => name.push(c),
            Some(_) => {
                if tag.take().is_some_and(|name| is_block_tag(&name)) {
                    result.push(' ');
                }
            }
        }
    }
    let decoded = result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    normalize_whitespace(&decoded)
}

fn is_block_tag(raw: &str) -> bool {
    let name = raw.trim_start_matches('/').split([' ', '/', '\t', '\n']).next().unwrap_or("");
    BLOCK_TAGS.contains(&name.to_ascii_lowercase().as_str())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncate to at most `max` characters on a word boundary, adding `…`
/// when anything was cut.
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > max {
            break;
        }
        if extra == 1 {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(max).collect();
    }
    out.push('…');
    out
}
