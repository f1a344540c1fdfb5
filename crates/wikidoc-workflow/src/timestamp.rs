use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use regex::Regex;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn mw_timestamp_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})$").expect("Invalid regex")
    })
}

fn signature_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(\d{1,2}):(\d{2}), (\d{1,2}) ([A-Z][a-z]+) (\d{4}) \(UTC\)")
            .expect("Invalid regex")
    })
}

/// English month name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|candidate| *candidate == name)
        .map(|index| index as u32 + 1)
}

fn utc(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Parses the compact `YYYYMMDDHHMMSS` form, falling back to RFC 3339.
pub fn parse_mw_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(caps) = mw_timestamp_regex().captures(raw) {
        let field = |index: usize| caps[index].parse::<u32>().ok();
        return utc(
            caps[1].parse().ok()?,
            field(2)?,
            field(3)?,
            field(4)?,
            field(5)?,
            field(6)?,
        );
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// The compact `YYYYMMDDHHMMSS` form as a number.
pub fn to_mw_timestamp(at: DateTime<Utc>) -> u64 {
    let year = u64::from(at.year().max(0) as u32);
    let date = year * 10_000 + u64::from(at.month()) * 100 + u64::from(at.day());
    let time =
        u64::from(at.hour()) * 10_000 + u64::from(at.minute()) * 100 + u64::from(at.second());
    date * 1_000_000 + time
}

/// First `HH:MM, D Month YYYY (UTC)` signature stamp in `text`.
pub fn parse_signature_timestamp(text: &str) -> Option<DateTime<Utc>> {
    signature_regex().captures_iter(text).find_map(|caps| {
        utc(
            caps[5].parse().ok()?,
            month_number(&caps[4])?,
            caps[3].parse().ok()?,
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            0,
        )
    })
}

/// Coarse English description of the time elapsed, e.g. `"3 days ago"`.
pub fn relative_time_since(old: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let elapsed = (now - old).num_seconds().max(0);
    let (amount, unit) = match elapsed {
        s if s < MINUTE => (s, "second"),
        s if s < HOUR => (rounded(s, MINUTE), "minute"),
        s if s < DAY => (rounded(s, HOUR), "hour"),
        s if s < MONTH => (rounded(s, DAY), "day"),
        s if s < YEAR => (rounded(s, MONTH), "month"),
        s => (rounded(s, YEAR), "year"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {unit}{plural} ago")
}

fn rounded(seconds: i64, unit: i64) -> i64 {
    (seconds + unit / 2) / unit
}
