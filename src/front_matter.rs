//! Front matter extraction.
//!
//! Content files carry a YAML header between `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [rust]
//! ---
//! Body text in markdown.
//! ```
//!
//! Layouts carry theirs inside a leading HTML comment so the template stays
//! valid on its own:
//!
//! ```text
//! <!--
//! ---
//! type: post
//! ---
//! -->
//! <html>…
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing closing front matter delimiter (---)")]
    Unterminated,
    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// A source file split into its YAML header and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<'a> {
    /// Raw YAML, `None` when the file has no header.
    pub yaml: Option<&'a str>,
    pub body: &'a str,
}

/// Split a file into its front matter and body.
///
/// Files that do not open with `---` have no front matter; the whole text
/// is the body.
pub fn split(content: &str) -> Result<Split<'_>, FrontMatterError> {
    let stripped = content.trim_start_matches('\u{feff}');
    let Some(rest) = stripped.strip_prefix("---") else {
        return Ok(Split {
            yaml: None,
            body: stripped,
        });
    };
    let Some(rest) = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
    else {
        // `---something` on the first line is body text, not a delimiter.
        return Ok(Split {
            yaml: None,
            body: stripped,
        });
    };

    if rest.starts_with("---") {
        let after = &rest[3..];
        return Ok(Split {
            yaml: Some(""),
            body: trim_line_break(after),
        });
    }

    match rest.find("\n---") {
        Some(idx) => {
            let yaml = rest[..idx].trim_end();
            let after = &rest[idx + 4..];
            Ok(Split {
                yaml: Some(yaml),
                body: trim_line_break(after),
            })
        }
        None => Err(FrontMatterError::Unterminated),
    }
}

fn trim_line_break(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

/// Parse a YAML document into a JSON value.
pub fn parse_yaml(yaml: &str) -> Result<Value, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_yaml::from_str(yaml)?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Array(_) => Err(FrontMatterError::NotAMapping("a list")),
        _ => Err(FrontMatterError::NotAMapping("a scalar")),
    }
}

/// Split and parse in one step.
pub fn extract(content: &str) -> Result<(Value, &str), FrontMatterError> {
    let split = split(content)?;
    let front = match split.yaml {
        Some(yaml) => parse_yaml(yaml)?,
        None => Value::Object(Default::default()),
    };
    Ok((front, split.body))
}

/// Extract front matter embedded in a leading HTML comment.
///
/// Returns the parsed defaults and the template body that follows the
/// comment. A layout without such a comment yields empty defaults and the
/// full text.
pub fn extract_from_comment(content: &str) -> Result<(Value, &str), FrontMatterError> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(inner_start) = trimmed.strip_prefix("<!--") else {
        return Ok((Value::Object(Default::default()), content));
    };
    let Some(end) = inner_start.find("-->") else {
        return Ok((Value::Object(Default::default()), content));
    };
    let inner = inner_start[..end].trim();
    let split = split(inner)?;
    match split.yaml {
        Some(yaml) => {
            let body = trim_line_break(&inner_start[end + 3..]);
            Ok((parse_yaml(yaml)?, body))
        }
        // An ordinary comment, keep it in the template.
        None => Ok((Value::Object(Default::default()), content)),
    }
}
