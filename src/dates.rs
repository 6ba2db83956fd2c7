//! Publish and modified date resolution.
//!
//! The published date comes from exactly one source, first available wins:
//!
//! 1. `date` in front matter
//! 2. a date captured from the file name by the type's `filename_date` regex
//! 3. the file's birth time (modification time where birth time is unsupported)
//!
//! The modified date is `mdate` from front matter, else the file's
//! modification time. Both end up as a [`DateValue`], which exposes every
//! representation layouts and schema emission need.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;

use crate::config::DatesConfig;

/// Where a published date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    FrontMatter,
    FileName,
    FileSystem,
}

/// A resolved date in every form the templates use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub epoch_ms: i64,
    /// RFC 3339 / ISO-8601.
    pub iso: String,
    /// Date formatted with `dates.date_format`.
    pub date: String,
    /// Time formatted with `dates.time_format`.
    pub time: String,
}

impl DateValue {
    pub fn new(dt: DateTime<FixedOffset>, formats: &DatesConfig) -> Self {
        use chrono::Datelike;
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            epoch_ms: dt.timestamp_millis(),
            iso: dt.to_rfc3339(),
            date: dt.format(&formats.date_format).to_string(),
            time: dt.format(&formats.time_format).to_string(),
        }
    }

    pub fn from_system_time(time: SystemTime, formats: &DatesConfig) -> Self {
        let utc: DateTime<Utc> = time.into();
        Self::new(utc.fixed_offset(), formats)
    }
}

/// Parse a date string. Dates without an offset are read as UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]`, and
/// `YYYY-MM-DD`.
pub fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// Read a date from a front matter value.
pub fn date_from_value(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// Capture a date from a file name with the type's `filename_date` regex.
///
/// The first capture group (or the whole match if there is none) must
/// parse as a date.
pub fn date_from_filename(file_name: &str, pattern: &Regex) -> Option<DateTime<FixedOffset>> {
    let caps = pattern.captures(file_name)?;
    let m = caps.get(1).or_else(|| caps.get(0))?;
    parse_date(m.as_str())
}

/// Inputs to published-date resolution, in priority order.
pub struct PublishedInputs<'a> {
    pub front_matter: Option<&'a Value>,
    pub file_name: &'a str,
    pub filename_date: Option<&'a Regex>,
    pub birth_time: Option<SystemTime>,
}

/// Resolve the published date. Returns `None` only when no source is usable.
pub fn resolve_published(
    inputs: &PublishedInputs<'_>,
) -> Option<(DateTime<FixedOffset>, DateSource)> {
    if let Some(dt) = inputs.front_matter.and_then(date_from_value) {
        return Some((dt, DateSource::FrontMatter));
    }
    if let Some(dt) = inputs
        .filename_date
        .and_then(|re| date_from_filename(inputs.file_name, re))
    {
        return Some((dt, DateSource::FileName));
    }
    inputs.birth_time.map(|t| {
        let utc: DateTime<Utc> = t.into();
        (utc.fixed_offset(), DateSource::FileSystem)
    })
}
