// src/utils/date.rs

//! Calendar helpers. All dates are UTC calendar days in `YYYY-MM-DD` form.

use chrono::{NaiveDate, Utc};

use crate::error::{AppError, Result};

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return Err(AppError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, ISO_FORMAT).map_err(|_| AppError::InvalidDate(raw.to_string()))
}

/// Check whether a string is a valid `YYYY-MM-DD` date.
pub fn is_iso_date(raw: &str) -> bool {
    parse_iso_date(raw).is_ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Current calendar date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Every date from `start` to `end`, both inclusive, ascending.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(AppError::validation(format!(
            "range start {} is after end {}",
            format_iso_date(start),
            format_iso_date(end)
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-02-29").unwrap(), ymd(2024, 2, 29));
        assert_eq!(parse_iso_date(" 2024-03-01 ").unwrap(), ymd(2024, 3, 1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_iso_date("2023-02-29").is_err());
        assert!(parse_iso_date("2024-3-1").is_err());
        assert!(parse_iso_date("03/01/2024").is_err());
        assert!(parse_iso_date("").is_err());
        assert!(!is_iso_date("2024-13-01"));
    }

    #[test]
    fn test_format_round_trips() {
        assert_eq!(format_iso_date(ymd(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn test_date_range_inclusive_across_month_end() {
        let days = date_range(ymd(2024, 2, 27), ymd(2024, 3, 2)).unwrap();
        let formatted: Vec<String> = days.into_iter().map(format_iso_date).collect();
        assert_eq!(
            formatted,
            vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"]
        );
    }

    #[test]
    fn test_date_range_single_day() {
        let days = date_range(ymd(2024, 3, 1), ymd(2024, 3, 1)).unwrap();
        assert_eq!(days, vec![ymd(2024, 3, 1)]);
    }

    #[test]
    fn test_date_range_rejects_reversed_bounds() {
        assert!(date_range(ymd(2024, 3, 2), ymd(2024, 3, 1)).is_err());
    }
}
