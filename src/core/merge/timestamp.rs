//! Timestamp extraction from file names and provenance markers
//!
//! Snapshot producers encode a capture time into the file name in a few
//! historical formats. The extractor derives an ordering instant from any of
//! them; callers fall back to the file's modification time when none match.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn underscore_full_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})_(\d{2})_(\d{2})_(\d{2})_(\d{2})_(\d{2})").expect("valid regex")
    })
}

fn underscore_loose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})_(\d{2})_(\d{2})(?:_(\d{2})_(\d{2}))?").expect("valid regex")
    })
}

fn iso_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})T(\d{2})-(\d{2})-(\d{2})").expect("valid regex")
    })
}

/// Derive an ordering instant from a file name or provenance marker.
///
/// Tries, in order:
/// 1. the full underscore pattern `YYYY_MM_DD_HH_MM_SS`;
/// 2. the looser `YYYY_MM_DD[_HH_MM]` pattern with zero-filled time;
/// 3. one or more ISO-like `YYYY-MM-DDTHH-MM-SS` tokens, taking the maximum
///    when several appear.
///
/// Returns `None` when no pattern yields a valid calendar instant. Pure and
/// total: never panics, independent of evaluation order of the input.
pub fn extract_timestamp(name: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = underscore_full_re().captures(name) {
        if let Some(ts) = build_utc(
            parse_num(&caps, 1)?,
            parse_num(&caps, 2)?,
            parse_num(&caps, 3)?,
            parse_num(&caps, 4)?,
            parse_num(&caps, 5)?,
            parse_num(&caps, 6)?,
        ) {
            return Some(ts);
        }
    }

    if let Some(caps) = underscore_loose_re().captures(name) {
        let hour = caps.get(4).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let minute = caps.get(5).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        if let Some(ts) = build_utc(
            parse_num(&caps, 1)?,
            parse_num(&caps, 2)?,
            parse_num(&caps, 3)?,
            hour,
            minute,
            0,
        ) {
            return Some(ts);
        }
    }

    iso_like_re()
        .captures_iter(name)
        .filter_map(|caps| {
            build_utc(
                parse_num(&caps, 1)?,
                parse_num(&caps, 2)?,
                parse_num(&caps, 3)?,
                parse_num(&caps, 4)?,
                parse_num(&caps, 5)?,
                parse_num(&caps, 6)?,
            )
        })
        .max()
}

fn parse_num(caps: &regex::Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn build_utc(year: u32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year as i32, month, day, hour, minute, second)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test_case("export_2024_03_15_10_30_45.tsv", 2024, 3, 15, 10, 30, 45; "full underscore")]
    #[test_case("2023_12_01_23_59_59", 2023, 12, 1, 23, 59, 59; "full underscore bare")]
    #[test_case("snapshot_2024_03_15.tsv", 2024, 3, 15, 0, 0, 0; "date only zero filled")]
    #[test_case("snapshot_2024_03_15_10_30.tsv", 2024, 3, 15, 10, 30, 0; "date with hour minute")]
    #[test_case("run-2024-03-15T10-30-45.tsv", 2024, 3, 15, 10, 30, 45; "iso like token")]
    fn extracts(name: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
        assert_eq!(extract_timestamp(name), Some(utc(y, mo, d, h, mi, s)));
    }

    #[test]
    fn test_multiple_iso_tokens_takes_maximum() {
        let name = "merged-2024-01-01T00-00-00-and-2024-06-30T12-00-00.tsv";
        assert_eq!(
            extract_timestamp(name),
            Some(utc(2024, 6, 30, 12, 0, 0))
        );
    }

    #[test]
    fn test_full_pattern_preferred_over_loose() {
        // The loose pattern would stop at the date; the full one must win.
        let name = "export_2024_03_15_10_30_45.tsv";
        assert_eq!(extract_timestamp(name), Some(utc(2024, 3, 15, 10, 30, 45)));
    }

    #[test]
    fn test_no_pattern_returns_none() {
        assert_eq!(extract_timestamp("plain_export.tsv"), None);
        assert_eq!(extract_timestamp(""), None);
        assert_eq!(extract_timestamp("v1.2.3-notes"), None);
    }

    #[test]
    fn test_invalid_calendar_components() {
        // Month 13 matches the loose pattern but is not a valid instant
        assert_eq!(extract_timestamp("export_2024_13_40.tsv"), None);
    }

    #[test]
    fn test_order_independent_of_surrounding_text() {
        let a = extract_timestamp("prefix_2024_03_15_10_30_45_suffix");
        let b = extract_timestamp("2024_03_15_10_30_45");
        assert_eq!(a, b);
    }
}
