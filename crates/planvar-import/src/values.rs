//! Cell value parsing: dates and numbers as they appear in exported sheets

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M",
];

/// Digits in an epoch-millisecond stamp between 2001-09-09 and 2286-11-20
const EPOCH_MILLIS_DIGITS: usize = 13;

/// Parse a calendar date. Time-of-day components are dropped.
///
/// Besides the usual textual forms, a 13 digit integer is read as epoch
/// milliseconds, which is how dataframe JSON exports encode dates. Compact
/// 12 and 14 digit stamps are `YYYYMMDDHHMM[SS]`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == EPOCH_MILLIS_DIGITS && s.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = s.parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Strip grouping spaces and normalise a decimal comma
fn clean_number(raw: &str) -> String {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if compact.contains(',') && !compact.contains('.') {
        compact.replacen(',', ".", 1)
    } else {
        compact.replace(',', "")
    }
}

/// Parse a monetary amount
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = clean_number(raw);
    if s.is_empty() {
        return None;
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&s).ok())
}

/// Parse a plain real number (resource units)
pub fn parse_f64(raw: &str) -> Option<f64> {
    let s = clean_number(raw);
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2024-01-15"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date(" 15.01.2024 "), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("20240115"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn datetimes_truncate_to_day() {
        assert_eq!(parse_date("2024-01-15 23:59:59"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:30:00"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 00:00:00.000"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:30:00+03:00"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn epoch_millis() {
        // 2024-01-01T00:00:00Z
        assert_eq!(parse_date("1704067200000"), Some(d(2024, 1, 1)));
    }

    #[test]
    fn compact_timestamps_are_not_epoch_millis() {
        assert_eq!(parse_date("202401011200"), Some(d(2024, 1, 1)));
        assert_eq!(parse_date("20240115235959"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("202413011200"), None);
    }

    #[test]
    fn invalid_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("31.13.2024"), None);
    }

    #[test]
    fn decimals() {
        assert_eq!(parse_decimal("1000"), Some(dec!(1000)));
        assert_eq!(parse_decimal("1 250 000,50"), Some(dec!(1250000.50)));
        assert_eq!(parse_decimal("1,250,000.50"), Some(dec!(1250000.50)));
        assert_eq!(parse_decimal("-5"), Some(dec!(-5)));
        assert_eq!(parse_decimal("1.2e3"), Some(dec!(1200)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(parse_f64("2,5"), Some(2.5));
        assert_eq!(parse_f64("3"), Some(3.0));
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("x"), None);
    }
}
