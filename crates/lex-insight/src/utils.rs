//! Shared utilities for the analysis toolset.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

// =============================================================================
// Date Parsing Utilities
// =============================================================================

// Cheap shape check before trying every chrono format
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{4}").expect("Invalid regex: DD-MM-YYYY"),
    ]
});

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
];

/// Parse a date or datetime string under the common formats.
///
/// Date-only values resolve to midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !DATE_PATTERNS.iter().any(|re| re.is_match(trimmed)) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(trimmed, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Check if a string looks like a date or datetime.
pub fn is_datetime_string(s: &str) -> bool {
    parse_datetime(s).is_some()
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Round to two decimals.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, 0.0 for an empty total.
#[inline]
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Encode a column name for use in a file name.
///
/// ASCII letters, digits and `-` pass through, `_` doubles to `__` and any
/// other character becomes `_<hex codepoint>_`. Distinct names always give
/// distinct results; the empty name encodes as `_`.
pub fn sanitize_file_component(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }

    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            c if c.is_ascii_alphanumeric() || c == '-' => out.push(c),
            '_' => out.push_str("__"),
            c => out.push_str(&format!("_{:x}_", u32::from(c))),
        }
    }
    out
}

/// Format an optional statistic for text output.
pub fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "n/a".to_string(),
    }
}

/// Truncate a label to at most `max_chars` characters.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let mut out: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    #[test]
    fn test_parse_datetime_formats() {
        let midnight = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(parse_datetime("2023-01-15"), Some(midnight));
        assert_eq!(parse_datetime("2023/01/15"), Some(midnight));
        assert_eq!(parse_datetime("15-01-2023"), Some(midnight));
        assert_eq!(parse_datetime("01/15/2023"), Some(midnight));
        assert_eq!(parse_datetime(" 2023-01-15 "), Some(midnight));

        let with_time = parse_datetime("2023-01-15 08:30:00").unwrap();
        assert_eq!(with_time.format("%H:%M").to_string(), "08:30");
        assert!(parse_datetime("2023-01-15T08:30:00Z").is_some());
    }

    #[test]
    fn test_parse_datetime_rejects_non_dates() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("hello").is_none());
        assert!(parse_datetime("20230115").is_none());
        assert!(parse_datetime("2023-13-45").is_none());
        assert!(!is_datetime_string("42"));
    }

    #[test]
    fn test_round2_and_percentage() {
        assert_eq!(round2(33.33333), 33.33);
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("revenue-usd"), "revenue-usd");
        assert_eq!(sanitize_file_component("unit price"), "unit_20_price");
        assert_eq!(sanitize_file_component("unit_price"), "unit__price");
        assert_eq!(sanitize_file_component("a/b"), "a_2f_b");
        assert_eq!(sanitize_file_component("caf\u{e9}"), "caf_e9_");
        assert_eq!(sanitize_file_component("  "), "_20__20_");
        assert_eq!(sanitize_file_component(""), "_");
    }

    #[test]
    fn test_sanitize_file_component_is_injective() {
        let names = [
            "unit price", "unit_price", "unit/price", "unit__price", "unit_20_price",
            "_", "__", "", " ", "a b", "a_b", "a_20_b",
        ];
        let encoded: std::collections::HashSet<String> =
            names.iter().map(|n| sanitize_file_component(n)).collect();
        assert_eq!(encoded.len(), names.len());
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("a very long label", 6), "a ver…");
    }
}
