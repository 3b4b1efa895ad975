//! Shared utility functions for WRA crates.

/// Date utility functions
pub mod dates {
    use chrono::{Months, NaiveDate, TimeDelta};

    /// ISO calendar date format used on the wire: "YYYY-MM-DD"
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)?)
    }

    /// Signed number of days from `start` to `end`.
    pub fn days_between(start: &NaiveDate, end: &NaiveDate) -> i64 {
        (*end - *start).num_days()
    }

    /// Shift a date by a signed number of days, saturating at the calendar bounds.
    pub fn add_days(date: &NaiveDate, days: i64) -> NaiveDate {
        TimeDelta::try_days(days)
            .and_then(|delta| date.checked_add_signed(delta))
            .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
    }

    /// The day after `today`.
    pub fn tomorrow(today: &NaiveDate) -> NaiveDate {
        add_days(today, 1)
    }

    /// Same day one calendar month later. Month ends are clamped
    /// (Jan 31 -> Feb 28/29).
    pub fn add_one_month(date: &NaiveDate) -> NaiveDate {
        date.checked_add_months(Months::new(1))
            .unwrap_or_else(|| add_days(date, 30))
    }

}

/// Numeric helpers
pub mod numbers {
    /// Round to a fixed number of decimal places (half away from zero).
    pub fn round_to(value: f64, places: u32) -> f64 {
        let factor = 10f64.powi(places as i32);
        (value * factor).round() / factor
    }

}
