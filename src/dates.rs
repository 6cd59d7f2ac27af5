use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::frontmatter::strip_quotes;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}

/// Normalizes a front-matter date to `YYYY-MM-DD`.
///
/// Unparseable input comes back unchanged (minus surrounding quotes and
/// whitespace); this never fails.
pub fn normalize_date(raw: &str) -> String {
    let cleaned = strip_quotes(raw);
    if cleaned.is_empty() {
        return String::new();
    }
    match parse_calendar_date(cleaned) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => {
            warn!("Invalid date format: {}", cleaned);
            cleaned.to_string()
        }
    }
}

/// Reads back a date produced by [`normalize_date`]. Dates that were kept
/// verbatim give `None`.
pub fn parse_normalized_date(normalized: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(normalized, "%Y-%m-%d").ok()
}

/// Long English form used on post pages, e.g. `July 13, 2025`.
pub fn display_date(normalized: &str) -> String {
    match parse_normalized_date(normalized) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => normalized.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{display_date, normalize_date, parse_normalized_date};

    #[test]
    fn pads_single_digit_month_and_day() {
        assert_eq!(normalize_date("2025-7-13"), "2025-07-13");
        assert_eq!(normalize_date("2025/1/5"), "2025-01-05");
    }

    #[test]
    fn keeps_unparseable_dates_verbatim() {
        assert_eq!(normalize_date("not-a-date"), "not-a-date");
        assert_eq!(normalize_date("\"sometime in spring\""), "sometime in spring");
    }

    #[test]
    fn accepts_timestamps_and_long_forms() {
        assert_eq!(normalize_date("2025-05-15T23:30:00Z"), "2025-05-15");
        assert_eq!(normalize_date("2025-05-15T23:30:00-02:00"), "2025-05-16");
        assert_eq!(normalize_date("'July 13, 2025'"), "2025-07-13");
        assert_eq!(normalize_date("13 July 2025"), "2025-07-13");
    }

    #[test]
    fn blank_date_stays_blank() {
        assert_eq!(normalize_date("  "), "");
    }

    #[test]
    fn display_date_spells_out_month() {
        assert_eq!(display_date("2025-07-03"), "July 3, 2025");
        assert_eq!(display_date("soon"), "soon");
    }

    #[test]
    fn only_normalized_dates_read_back() {
        let date = parse_normalized_date("2025-05-15").unwrap();
        assert_eq!(date.to_string(), "2025-05-15");
        assert!(parse_normalized_date("sometime in spring").is_none());
        assert!(parse_normalized_date("").is_none());
    }
}
