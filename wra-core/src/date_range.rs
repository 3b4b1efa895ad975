//! Analysis date ranges and the click-driven range selector.

use crate::error::{Result, WeatherError};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use wra_utils::dates::{add_days, add_one_month, days_between, tomorrow};

/// Longest span (end - start, in days) a range may cover.
pub const DEFAULT_MAX_DAYS: i64 = 30;

/// Span of the range selected when a workflow starts.
pub const DEFAULT_SPAN_DAYS: i64 = 14;

/// An iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct Days(pub NaiveDate, pub NaiveDate);

impl Iterator for Days {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 > self.1 {
            return None;
        }
        let current = self.0;
        match current.succ_opt() {
            Some(next) => self.0 = next,
            // NaiveDate::MAX has no successor; pull the end back instead.
            None => self.1 = current.pred_opt().unwrap_or(NaiveDate::MIN),
        }
        Some(current)
    }
}

/// A start date plus an end date once the selection is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Where a [`DateRange`] is in its selection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePhase {
    Empty,
    PendingEnd,
    Complete,
}

impl DateRange {
    pub fn complete(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn pending(start_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: None,
        }
    }

    pub fn phase(&self) -> RangePhase {
        match (self.start_date, self.end_date) {
            (Some(_), Some(_)) => RangePhase::Complete,
            (Some(_), None) => RangePhase::PendingEnd,
            _ => RangePhase::Empty,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == RangePhase::Complete
    }

    /// Complete, ordered and spanning at most `max_days` days.
    pub fn is_valid(&self, max_days: i64) -> bool {
        self.bounds().is_some_and(|(start, end)| {
            let span = days_between(&start, &end);
            (0..=max_days).contains(&span)
        })
    }

    /// Both endpoints, when the range is complete.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }

    /// Number of calendar days covered, both ends inclusive.
    pub fn day_count(&self) -> usize {
        self.bounds()
            .map(|(start, end)| Days(start, end).count())
            .unwrap_or(0)
    }

    /// Every day of a complete range, in order.
    pub fn days(&self) -> Days {
        match self.bounds() {
            Some((start, end)) => Days(start, end),
            // An exhausted iterator.
            None => Days(NaiveDate::MAX, NaiveDate::MIN),
        }
    }

    /// Whether `date` is highlighted as part of the selection.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= *date && *date <= end,
            (Some(start), None) => start == *date,
            _ => false,
        }
    }
}

/// A preset range offered next to the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickRange {
    pub label: &'static str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// "Next 7 days", "Next 14 days" and "Next 30 days", all starting tomorrow.
pub fn quick_ranges(today: NaiveDate) -> Vec<QuickRange> {
    let start_date = tomorrow(&today);
    vec![
        QuickRange {
            label: "Next 7 days",
            start_date,
            end_date: add_days(&today, 7),
        },
        QuickRange {
            label: "Next 14 days",
            start_date,
            end_date: add_days(&today, 14),
        },
        QuickRange {
            label: "Next 30 days",
            start_date,
            end_date: add_one_month(&today),
        },
    ]
}

/// Calendar selection state: `Empty -> PendingEnd -> Complete -> PendingEnd -> ...`
///
/// Operations return a new selector; a rejected click leaves the caller's
/// value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeSelector {
    range: DateRange,
    min_date: NaiveDate,
    max_date: NaiveDate,
    max_days: i64,
}

impl DateRangeSelector {
    /// Starts on tomorrow .. tomorrow + 14, selectable from today through one year out.
    pub fn new(today: NaiveDate) -> Self {
        let start = tomorrow(&today);
        Self {
            range: DateRange::complete(start, add_days(&start, DEFAULT_SPAN_DAYS)),
            min_date: today,
            max_date: add_days(&today, 365),
            max_days: DEFAULT_MAX_DAYS,
        }
    }

    /// An empty selector with explicit bounds.
    pub fn with_bounds(min_date: NaiveDate, max_date: NaiveDate, max_days: i64) -> Self {
        Self {
            range: DateRange::default(),
            min_date,
            max_date,
            max_days: max_days.max(0),
        }
    }

    /// Change the span limit. A complete range that no longer fits is cut
    /// back to `max_days` days after its start.
    pub fn with_max_days(self, max_days: i64) -> Self {
        let max_days = max_days.max(0);
        let range = match self.range.bounds() {
            Some((start, end)) if days_between(&start, &end) > max_days => {
                DateRange::complete(start, add_days(&start, max_days))
            }
            _ => self.range,
        };
        Self {
            range,
            max_days,
            ..self
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn phase(&self) -> RangePhase {
        self.range.phase()
    }

    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    pub fn max_date(&self) -> NaiveDate {
        self.max_date
    }

    pub fn day_count(&self) -> usize {
        self.range.day_count()
    }

    /// Outside [min_date, max_date], or too far from a pending start.
    pub fn is_date_disabled(&self, date: &NaiveDate) -> bool {
        if *date < self.min_date || *date > self.max_date {
            return true;
        }
        match (self.range.start_date, self.range.end_date) {
            (Some(start), None) => days_between(&start, date).abs() > self.max_days,
            _ => false,
        }
    }

    /// Advance the selection with a calendar click.
    pub fn click_date(&self, date: NaiveDate) -> Result<Self> {
        if self.is_date_disabled(&date) {
            debug!("rejected click on disabled date {date}");
            return Err(WeatherError::Validation(format!(
                "{date} cannot be selected (allowed {} to {}, at most {} days per range)",
                self.min_date, self.max_date, self.max_days
            )));
        }
        let range = match (self.range.start_date, self.range.end_date) {
            (Some(start), None) if date >= start => DateRange::complete(start, date),
            (Some(start), None) => DateRange::complete(date, start),
            _ => DateRange::pending(date),
        };
        Ok(Self { range, ..*self })
    }

    /// Jump straight to a complete range.
    pub fn select_quick_range(&self, quick: &QuickRange) -> Result<Self> {
        self.select_range(quick.start_date, quick.end_date)
    }

    /// Set both endpoints at once, enforcing the range invariant.
    pub fn select_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if let Some(date) = [start_date, end_date]
            .into_iter()
            .find(|date| *date < self.min_date || *date > self.max_date)
        {
            return Err(WeatherError::Validation(format!(
                "{date} is outside the selectable dates {} to {}",
                self.min_date, self.max_date
            )));
        }
        let span = days_between(&start_date, &end_date);
        if span < 0 {
            return Err(WeatherError::Validation(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }
        if span > self.max_days {
            return Err(WeatherError::Validation(format!(
                "range {start_date} to {end_date} spans {span} days, more than {}",
                self.max_days
            )));
        }
        Ok(Self {
            range: DateRange::complete(start_date, end_date),
            ..*self
        })
    }
}
