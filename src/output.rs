//! CLI output formatting for a build run.
//!
//! # Output Format
//!
//! ```text
//! Plugins: featured_images, related, schema
//! Images: 3 cached, 1 copied, 2 resized (6 total)
//! Articles: 12 built, 4 generated pages
//! Output: 16 pages, 7 image files, 2 assets → public/
//!
//! Failures
//! 001 posts/broken.md
//!     layout 'missing' not found in layouts
//!     ...and 2 more (set build.verbose_errors to list every failure)
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::build::BuildReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Pluralize a count: `1 page`, `2 pages`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// One failed unit: where it came from and what went wrong.
struct FailureLine {
    source: String,
    message: String,
}

fn failure_lines(report: &BuildReport) -> Vec<FailureLine> {
    let articles = report.article_failures.iter().map(|f| FailureLine {
        source: f.rel_path.clone(),
        message: f.error.to_string(),
    });
    let renders = report.render_failures.iter().map(|f| FailureLine {
        source: format!("{} → {}", f.rel_path, f.url),
        message: f.error.to_string(),
    });
    let images = report.image_failures.iter().map(|e| FailureLine {
        source: "image".to_string(),
        message: e.to_string(),
    });
    articles.chain(renders).chain(images).collect()
}

/// Summary lines for a finished build.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.plugins.is_empty() {
        lines.push(format!("Plugins: {}", report.plugins.join(", ")));
    }
    lines.push(format!("Images: {}", report.image_stats));
    lines.push(format!(
        "Articles: {} built, {}",
        report.articles,
        count(report.generated_pages, "generated page")
    ));
    lines.push(format!(
        "Output: {}, {}, {} → {}",
        count(report.written, "page"),
        count(report.images_published, "image file"),
        count(report.assets_copied, "asset"),
        report.output_dir.display()
    ));
    lines
}

/// Failure listing: the first failure plus a count, or every one when
/// `verbose` is set. Empty when nothing failed.
pub fn format_failures(report: &BuildReport, verbose: bool) -> Vec<String> {
    let failures = failure_lines(report);
    if failures.is_empty() {
        return Vec::new();
    }
    let shown = if verbose { failures.len() } else { 1 };
    let mut lines = vec![String::new(), "Failures".to_string()];
    for (i, failure) in failures.iter().take(shown).enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), failure.source));
        lines.push(format!("{}{}", indent(1), failure.message));
    }
    let hidden = failures.len() - shown;
    if hidden > 0 {
        lines.push(format!(
            "{}...and {hidden} more (set build.verbose_errors to list every failure)",
            indent(1)
        ));
    }
    lines
}

pub fn print_build_report(report: &BuildReport, verbose: bool) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
    for line in format_failures(report, verbose || report.verbose_errors) {
        println!("{}", line);
    }
}
