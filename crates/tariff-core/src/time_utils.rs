use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::{Result, TariffError};

// ── Date parsing ──────────────────────────────────────────────────────────────

/// ISO date and date-time layouts, tried before any other family.
const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Long-form layouts accepted by the last-resort fallback.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
];

fn us_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$",
        )
        .expect("regex is valid")
    })
}

/// Four-digit year followed by `-` or `/`. chrono's `%Y` also accepts short
/// years, so ISO layouts are only tried when this matches.
fn iso_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}[-/]").expect("regex is valid"))
}

/// Parse an effective-date cell into a naive date-time.
///
/// Formats are tried in priority order:
///
/// 1. ISO: `YYYY-MM-DD` / `YYYY/MM/DD` (four-digit year), optionally with a time part, and
///    RFC 3339 (the instant is taken in UTC).
/// 2. US: `M/D/YY`, `M/D/YYYY` with `/` or `-` separators. Two-digit years
///    are read as 20xx.
/// 3. A generic fallback covering RFC 2822, `YYYY-MM`, and month-name forms
///    such as `January 5, 2024`.
///
/// Returns `None` for blank or unrecognised input; never errors.
///
/// # Examples
///
/// ```
/// use tariff_core::time_utils::parse_date;
///
/// assert!(parse_date("2024-01-15").is_some());
/// assert!(parse_date("1/15/24").is_some());
/// assert!(parse_date("not a date").is_none());
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    parse_iso(s)
        .or_else(|| parse_us(s))
        .or_else(|| parse_fallback(s))
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if !iso_year_regex().is_match(s) {
        return None;
    }

    let normalised = match s.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => s.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.naive_utc());
    }

    for fmt in ISO_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }
    for fmt in ISO_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

fn parse_us(s: &str) -> Option<NaiveDateTime> {
    let caps = us_date_regex().captures(s)?;

    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year_str = caps.get(3)?.as_str();
    let mut year: i32 = year_str.parse().ok()?;
    if year_str.len() == 2 {
        year += 2000;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match caps.get(4) {
        Some(hour) => {
            let hour: u32 = hour.as_str().parse().ok()?;
            let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
            let second: u32 = match caps.get(6) {
                Some(sec) => sec.as_str().parse().ok()?,
                None => 0,
            };
            NaiveTime::from_hms_opt(hour, minute, second)?
        }
        None => NaiveTime::MIN,
    };

    Some(date.and_time(time))
}

fn parse_fallback(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    // Year-month only, anchored to the first of the month.
    if iso_year_regex().is_match(s) {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parse a user-supplied bound (e.g. a `--date-from` argument) into a
/// calendar day, failing loudly rather than silently dropping the bound.
pub fn parse_date_bound(raw: &str) -> Result<NaiveDate> {
    parse_date(raw)
        .map(|dt| dt.date())
        .ok_or_else(|| TariffError::DateParse(raw.to_string()))
}

// ── Labels ────────────────────────────────────────────────────────────────────

/// Render a calendar day as an en-US short label: `M/D/YYYY`, no zero padding.
///
/// Labels are display keys only; sort by the underlying date, never by the
/// label text (`"10/1/2024"` < `"9/1/2024"` lexically).
///
/// ```
/// use chrono::NaiveDate;
/// use tariff_core::time_utils::date_label;
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// assert_eq!(date_label(d), "1/2/2024");
/// ```
pub fn date_label(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
