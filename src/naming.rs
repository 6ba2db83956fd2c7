//! Filename and label helpers shared by the builder and the derivation steps.
//!
//! Content files follow a loose naming convention: posts carry a leading
//! date segment (`2024-01-02-hello.md`), everything else is a plain stem.
//! This module turns those stems into the pieces the rest of the crate needs:
//!
//! - `2024-01-02-hello` with a grab length of 10 → `hello` (the `:fn` token)
//! - `my-first_post` → "My first post" (a display name when no title exists)
//! - `Linux & Friends` → `linux-friends` (a URL segment)

/// Strip a leading date segment of `grab_length` characters plus its
/// separator from a file stem.
///
/// Returns the stem unchanged when it is too short to hold the segment.
pub fn strip_date_segment(stem: &str, grab_length: usize) -> &str {
    if grab_length == 0 {
        return stem;
    }
    let skip = grab_length + 1;
    match stem.char_indices().nth(skip) {
        Some((idx, _)) => &stem[idx..],
        None => stem,
    }
}

/// Turn a file stem into a human-readable label.
///
/// Dashes and underscores become spaces, runs of whitespace collapse, and
/// the first letter is upper-cased.
pub fn humanize(stem: &str) -> String {
    let spaced = stem.replace(['-', '_'], " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case URL-safe slug: alphanumerics are kept, everything else
/// becomes a single dash, leading and trailing dashes are trimmed.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Join URL segments with single slashes, ensuring one leading slash and
/// no doubled separators.
pub fn collapse_slashes(url: &str) -> String {
    let mut out = String::with_capacity(url.len() + 1);
    out.push('/');
    for c in url.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
