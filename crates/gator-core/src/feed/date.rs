//! Publish-date resolution for feed items.
//!
//! Feeds in the wild use a handful of date formats. Each known layout is tried
//! in order and the first one that parses wins. Input that matches nothing
//! resolves to `None` so the item can still be stored.
//!
//! Zone abbreviations in the `MST` layout are mapped to real offsets for the
//! US zones instead of being read as zero offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Candidate layouts, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `2006-01-02 15:04:05`
    DateTime,
    /// `2006/01/02`
    SlashDate,
    /// `02 Jan 2006`
    DayMonthYear,
    /// `01/02/2006 15:04:05 MST`
    UsDateTimeZone,
    /// `2006-01-02T15:04:05Z07:00`
    Rfc3339,
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc2822,
}

pub const LAYOUTS: &[DateLayout] = &[
    DateLayout::DateTime,
    DateLayout::SlashDate,
    DateLayout::DayMonthYear,
    DateLayout::UsDateTimeZone,
    DateLayout::Rfc3339,
    DateLayout::Rfc2822,
];

impl DateLayout {
    /// Try to parse `raw` with this layout
    pub fn parse(self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            DateLayout::DateTime => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc()),
            DateLayout::SlashDate => parse_date_at_midnight(raw, "%Y/%m/%d"),
            DateLayout::DayMonthYear => parse_date_at_midnight(raw, "%d %b %Y"),
            DateLayout::UsDateTimeZone => parse_with_zone_abbreviation(raw),
            DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            DateLayout::Rfc2822 => DateTime::parse_from_rfc2822(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Resolve a raw pubDate string, returning the first layout that matches
pub fn resolve_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    resolve_with_layout(raw).map(|(dt, _)| dt)
}

/// Like [`resolve_pub_date`], but also reports which layout matched
pub fn resolve_with_layout(raw: &str) -> Option<(DateTime<Utc>, DateLayout)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let resolved = LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(raw).map(|dt| (dt, *layout)));

    if resolved.is_none() {
        tracing::debug!("Unrecognized publish date: {:?}", raw);
    }

    resolved
}

fn parse_date_at_midnight(raw: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, fmt)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_with_zone_abbreviation(raw: &str) -> Option<DateTime<Utc>> {
    let (local, zone) = raw.rsplit_once(' ')?;
    let naive = NaiveDateTime::parse_from_str(local.trim_end(), "%m/%d/%Y %H:%M:%S").ok()?;
    let offset = zone_offset(zone)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Offset for a zone abbreviation; unknown abbreviations count as UTC
fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    if abbreviation.is_empty()
        || abbreviation.len() > 5
        || !abbreviation.chars().all(|c| c.is_ascii_alphabetic())
    {
        return None;
    }

    let hours = match abbreviation.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => 0,
    };

    FixedOffset::east_opt(hours * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_each_layout_resolves_exactly() {
        let cases = [
            ("2023-05-01 12:30:45", utc(2023, 5, 1, 12, 30, 45), DateLayout::DateTime),
            ("2023/05/01", utc(2023, 5, 1, 0, 0, 0), DateLayout::SlashDate),
            ("01 May 2023", utc(2023, 5, 1, 0, 0, 0), DateLayout::DayMonthYear),
            ("05/01/2023 15:04:05 UTC", utc(2023, 5, 1, 15, 4, 5), DateLayout::UsDateTimeZone),
            ("2023-05-01T12:30:45+02:00", utc(2023, 5, 1, 10, 30, 45), DateLayout::Rfc3339),
            ("Mon, 01 May 2023 12:30:45 +0000", utc(2023, 5, 1, 12, 30, 45), DateLayout::Rfc2822),
        ];

        for (raw, expected, layout) in cases {
            assert_eq!(resolve_with_layout(raw), Some((expected, layout)), "input: {}", raw);
        }
    }

    #[test]
    fn test_slash_date_is_midnight() {
        assert_eq!(resolve_pub_date("2023/05/01"), Some(utc(2023, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn test_zone_abbreviation_applies_offset() {
        assert_eq!(
            resolve_pub_date("05/01/2023 15:04:05 EST"),
            Some(utc(2023, 5, 1, 20, 4, 5))
        );
        assert_eq!(
            resolve_pub_date("05/01/2023 15:04:05 PDT"),
            Some(utc(2023, 5, 1, 22, 4, 5))
        );
        // Unknown abbreviation reads as zero offset
        assert_eq!(
            resolve_pub_date("05/01/2023 15:04:05 XYZ"),
            Some(utc(2023, 5, 1, 15, 4, 5))
        );
    }

    #[test]
    fn test_rfc3339_utc() {
        assert_eq!(
            resolve_pub_date("2024-02-29T23:59:59Z"),
            Some(utc(2024, 2, 29, 23, 59, 59))
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(resolve_pub_date("  2023/05/01\n"), Some(utc(2023, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn test_unsupported_input_is_unset() {
        assert_eq!(resolve_pub_date("not-a-date"), None);
        assert_eq!(resolve_pub_date(""), None);
        assert_eq!(resolve_pub_date("2023-13-45 99:00:00"), None);
        assert_eq!(resolve_pub_date("05/01/2023 15:04:05 +0200"), None);
    }
}
