//! Calendar helpers
//!
//! Pure functions over calendar dates: leap years, day-of-year ordinals
//! and year progress. Day-of-year values are 1-based (Jan 1 is day 1).

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// 1-based ordinal of `date` within its year
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Date for a 1-based day-of-year, or `None` when the ordinal is out of range
pub fn date_from_day_of_year(day_of_year: u32, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_yo_opt(year, day_of_year)
}

/// Long form date, e.g. "January 5, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Whole percent of the year elapsed, rounded to nearest
pub fn year_progress(current_day: u32, total_days: u32) -> u32 {
    if total_days == 0 {
        return 0;
    }
    ((f64::from(current_day) / f64::from(total_days)) * 100.0).round() as u32
}

/// Progress summary for a single date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProgress {
    pub year: i32,
    pub day_of_year: u32,
    pub days_in_year: u32,
    pub percent: u32,
    pub formatted_date: String,
}

impl YearProgress {
    pub fn for_date(date: NaiveDate) -> Self {
        let year = date.year();
        let day = day_of_year(date);
        let total = days_in_year(year);
        Self {
            year,
            day_of_year: day,
            days_in_year: total,
            percent: year_progress(day, total),
            formatted_date: format_date(date),
        }
    }

    /// Progress for the local calendar date
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_year() {
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2023), 365);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(day_of_year(date(2024, 1, 1)), 1);
        assert_eq!(day_of_year(date(2024, 3, 1)), 61);
        assert_eq!(day_of_year(date(2023, 3, 1)), 60);
        assert_eq!(day_of_year(date(2024, 12, 31)), 366);
    }

    #[test]
    fn test_date_from_day_of_year() {
        assert_eq!(date_from_day_of_year(1, 2025), Some(date(2025, 1, 1)));
        assert_eq!(date_from_day_of_year(60, 2024), Some(date(2024, 2, 29)));
        assert_eq!(date_from_day_of_year(366, 2023), None);
        assert_eq!(date_from_day_of_year(0, 2023), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2024, 1, 5)), "January 5, 2024");
        assert_eq!(format_date(date(2023, 12, 31)), "December 31, 2023");
    }

    #[test]
    fn test_year_progress_rounding() {
        assert_eq!(year_progress(1, 365), 0);
        assert_eq!(year_progress(183, 366), 50);
        assert_eq!(year_progress(365, 365), 100);
        assert_eq!(year_progress(10, 0), 0);
    }

    #[test]
    fn test_year_progress_snapshot() {
        let progress = YearProgress::for_date(date(2024, 7, 1));
        assert_eq!(progress.year, 2024);
        assert_eq!(progress.day_of_year, 183);
        assert_eq!(progress.days_in_year, 366);
        assert_eq!(progress.percent, 50);
        assert_eq!(progress.formatted_date, "July 1, 2024");
    }
}
