//! # Temporal Conversion Module
//!
//! Formatting and parsing of time values for SQL literals and raw result cells.
//!
//! ## Layouts
//!
//! A layout is either one of the well-known names below or a `chrono`
//! strftime pattern used verbatim.
//!
//! | Name          | Pattern                      |
//! |---------------|------------------------------|
//! | `ANSIC`       | `%a %b %e %H:%M:%S %Y`       |
//! | `RFC822Z`     | `%d %b %y %H:%M %z`          |
//! | `RFC1123Z`    | `%a, %d %b %Y %H:%M:%S %z`   |
//! | `RFC3339`     | RFC 3339, seconds precision  |
//! | `RFC3339Nano` | RFC 3339, nanosecond precision |
//! | `Kitchen`     | `%-I:%M%p`                   |
//! | `DateTime`    | `%Y-%m-%d %H:%M:%S`          |
//! | `DateOnly`    | `%Y-%m-%d`                   |
//! | `TimeOnly`    | `%H:%M:%S`                   |
//!
//! Literals default to [`DEFAULT_LITERAL_FORMAT`]. Cells read without a layout
//! are tried as RFC 3339 first, then as the textual forms drivers return.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::errors::{Error, Result};

/// Pattern used for time literals when no layout is given.
pub const DEFAULT_LITERAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RFC3339: &str = "RFC3339";
const RFC3339_NANO: &str = "RFC3339Nano";

static NAMED_LAYOUTS: &[(&str, &str)] = &[
    ("ANSIC", "%a %b %e %H:%M:%S %Y"),
    ("RFC822Z", "%d %b %y %H:%M %z"),
    ("RFC1123Z", "%a, %d %b %Y %H:%M:%S %z"),
    (RFC3339, "%Y-%m-%dT%H:%M:%S%:z"),
    (RFC3339_NANO, "%Y-%m-%dT%H:%M:%S%.f%:z"),
    ("Kitchen", "%-I:%M%p"),
    ("DateTime", "%Y-%m-%d %H:%M:%S"),
    ("DateOnly", "%Y-%m-%d"),
    ("TimeOnly", "%H:%M:%S"),
];

// Textual forms returned by drivers for DATETIME/TIMESTAMP/DATE columns.
const DRIVER_DATETIME_PATTERNS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DRIVER_DATE_PATTERN: &str = "%Y-%m-%d";

// ============================================================================
// Layout Resolution
// ============================================================================

/// Resolves a layout name to its strftime pattern.
///
/// Unknown names are returned unchanged so they act as patterns themselves.
pub fn resolve_layout(layout: &str) -> &str {
    NAMED_LAYOUTS
        .iter()
        .find(|(name, _)| *name == layout)
        .map(|(_, pattern)| *pattern)
        .unwrap_or(layout)
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats a time with the given layout, or [`DEFAULT_LITERAL_FORMAT`].
///
/// Fails with `InvalidValue` when the layout is not a valid pattern.
pub fn format_time(time: &DateTime<Utc>, layout: Option<&str>) -> Result<String> {
    let layout = layout.unwrap_or(DEFAULT_LITERAL_FORMAT);
    match layout {
        RFC3339 => return Ok(time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        RFC3339_NANO => return Ok(time.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        _ => {}
    }

    let mut out = String::new();
    write!(out, "{}", time.format(resolve_layout(layout)))
        .map_err(|_| Error::invalid_value(format!("invalid time layout {layout:?}")))?;
    Ok(out)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a time from text.
///
/// With a layout, the text may carry a full timestamp with offset, a naive
/// timestamp (read as UTC), a date (midnight UTC) or a time of day (on
/// 0000-01-01). Without one, RFC 3339 and the driver textual forms are tried.
pub fn parse_time(text: &str, layout: Option<&str>) -> Result<DateTime<Utc>> {
    let failed = || Error::failed_parse("time", text);

    let Some(layout) = layout else {
        return parse_driver_text(text).ok_or_else(failed);
    };

    if layout == RFC3339 || layout == RFC3339_NANO {
        return DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc)).map_err(|_| failed());
    }

    let pattern = resolve_layout(layout);
    if let Ok(t) = DateTime::parse_from_str(text, pattern) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, pattern) {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, pattern) {
        return midnight(d).ok_or_else(failed);
    }
    if let Ok(t) = NaiveTime::parse_from_str(text, pattern) {
        let day = NaiveDate::from_ymd_opt(0, 1, 1).ok_or_else(failed)?;
        return Ok(day.and_time(t).and_utc());
    }
    Err(failed())
}

fn parse_driver_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    for pattern in DRIVER_DATETIME_PATTERNS {
        if let Ok(t) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, DRIVER_DATE_PATTERN).ok().and_then(midnight)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 2, 15, 4, 5).unwrap()
    }

    #[test]
    fn default_literal_format() {
        assert_eq!(format_time(&sample(), None).unwrap(), "2020-01-02 15:04:05");
    }

    #[test]
    fn named_layouts_resolve() {
        assert_eq!(resolve_layout("DateOnly"), "%Y-%m-%d");
        assert_eq!(resolve_layout("%d/%m/%Y"), "%d/%m/%Y");
        assert_eq!(format_time(&sample(), Some("RFC3339")).unwrap(), "2020-01-02T15:04:05Z");
        assert_eq!(format_time(&sample(), Some("Kitchen")).unwrap(), "3:04PM");
    }

    #[test]
    fn parses_with_layouts() {
        assert_eq!(parse_time("2020-01-02T15:04:05Z", Some("RFC3339")).unwrap(), sample());
        assert_eq!(parse_time("02/01/2020 15:04:05", Some("%d/%m/%Y %H:%M:%S")).unwrap(), sample());
        assert_eq!(
            parse_time("2020-01-02", Some("DateOnly")).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_driver_text_without_layout() {
        assert_eq!(parse_time("2020-01-02 15:04:05", None).unwrap(), sample());
        assert_eq!(parse_time("2020-01-02T15:04:05+00:00", None).unwrap(), sample());
        assert_eq!(parse_time("2020-01-02", None).unwrap(), Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_failure_names_kind_and_text() {
        let err = parse_time("yesterday", None).unwrap_err();
        assert_eq!(err.to_string(), "failed to parse \"yesterday\" as time");
    }
}
