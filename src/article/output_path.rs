//! URL and output file computation.
//!
//! A permalink pattern is a path with tokens:
//!
//! | Token | Value |
//! |---|---|
//! | `:year` `:month` `:day` | publish date, zero-padded |
//! | `:fn` | file stem, minus the leading date segment for dated types |
//! | `:path` | directory of the source relative to the content root |
//!
//! ```text
//! posts/2024-01-02-hello.md, ":year/:month/:fn" → /2024/01/hello/
//!                                               → /2024/01/hello/index.html
//! ```
//!
//! [`determine_output`] is a pure function of its inputs.

use crate::config::{OutputConfig, OutputMode};
use crate::naming::{collapse_slashes, strip_date_segment};

/// Everything the URL depends on.
#[derive(Debug, Clone, Copy)]
pub struct OutputInputs<'a> {
    pub pattern: &'a str,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Source directory relative to the content root, `/`-separated.
    pub dir: &'a str,
    /// Source file name with extension.
    pub file_name: &'a str,
    /// Length of the leading date segment to drop from `:fn`.
    pub grab_length: usize,
    /// Plain files keep their URL verbatim: no trailing slash, no index file.
    pub plain: bool,
    pub output: &'a OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub url: String,
    /// Relative to the output root, with a leading `/`.
    pub output_file_name: String,
}

/// File name without its last extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    }
}

/// Substitute permalink tokens.
pub fn expand_pattern(inputs: &OutputInputs<'_>) -> String {
    let stem = strip_date_segment(file_stem(inputs.file_name), inputs.grab_length);
    inputs
        .pattern
        .replace(":year", &format!("{:04}", inputs.year))
        .replace(":month", &format!("{:02}", inputs.month))
        .replace(":day", &format!("{:02}", inputs.day))
        .replace(":path", inputs.dir)
        .replace(":fn", stem)
}

/// Compute the URL and output file for an article.
///
/// In directory mode the URL ends with `/` and the file is the configured
/// index file inside it. In file mode the URL is the file itself.
pub fn determine_output(inputs: &OutputInputs<'_>) -> Output {
    let path = expand_pattern(inputs);
    output_for_path(&path, inputs.plain, inputs.output)
}

/// Map an already-expanded site path to its URL and output file.
pub fn output_for_path(path: &str, plain: bool, output: &OutputConfig) -> Output {
    let path = collapse_slashes(path);

    if plain {
        let url = if path.len() > 1 {
            path.trim_end_matches('/').to_string()
        } else {
            path
        };
        return Output {
            output_file_name: url.clone(),
            url,
        };
    }

    match output.mode {
        OutputMode::Directory => {
            let url = if path.ends_with('/') {
                path
            } else {
                format!("{path}/")
            };
            Output {
                output_file_name: format!("{url}{}", output.index_file),
                url,
            }
        }
        OutputMode::File => {
            let file = if path == "/" {
                format!("/{}", output.index_file)
            } else {
                format!("{}{}", path.trim_end_matches('/'), output.extension)
            };
            Output {
                url: file.clone(),
                output_file_name: file,
            }
        }
    }
}
