//! Reporting period resolution.
//!
//! # Responsibility
//! - Map a period keyword and "today" to inclusive date bounds.
//! - Derive the immediately preceding comparison window of equal meaning.
//!
//! # Invariants
//! - Resolution is pure and deterministic given `today`.
//! - Weeks start on Monday; months and years use true calendar lengths.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Aggregation period for insight queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// Parses the period keyword used by callers. Case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Keyword form, also used in comparison labels.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Label naming the comparison window, e.g. `"last week"`.
    pub fn comparison_label(self) -> String {
        format!("last {}", self.keyword())
    }

    /// `(completion, timeliness)` blend weights for the flow score.
    ///
    /// Short horizons reward raw completion; long horizons weight
    /// timeliness more heavily.
    pub fn blend_weights(self) -> (f64, f64) {
        match self {
            Self::Day => (0.85, 0.15),
            Self::Week => (0.70, 0.30),
            Self::Month => (0.60, 0.40),
            Self::Year => (0.50, 0.50),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Current window plus the equal-length window immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow {
    pub current: DateRange,
    pub previous: DateRange,
}

/// Resolves the current and previous windows for `period` around `today`.
pub fn resolve_window(today: NaiveDate, period: Period) -> PeriodWindow {
    match period {
        Period::Day => {
            let previous_day = today.checked_sub_days(Days::new(1)).unwrap_or(today);
            PeriodWindow {
                current: DateRange {
                    start: today,
                    end: today,
                },
                previous: DateRange {
                    start: previous_day,
                    end: previous_day,
                },
            }
        }
        Period::Week => {
            let offset = Days::new(u64::from(today.weekday().num_days_from_monday()));
            let start = today.checked_sub_days(offset).unwrap_or(today);
            let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
            let previous_start = start.checked_sub_days(Days::new(7)).unwrap_or(start);
            let previous_end = end.checked_sub_days(Days::new(7)).unwrap_or(end);
            PeriodWindow {
                current: DateRange { start, end },
                previous: DateRange {
                    start: previous_start,
                    end: previous_end,
                },
            }
        }
        Period::Month => {
            let start = month_start(today);
            let previous_start = start
                .checked_sub_months(Months::new(1))
                .map(month_start)
                .unwrap_or(start);
            PeriodWindow {
                current: DateRange {
                    start,
                    end: month_end(start),
                },
                previous: DateRange {
                    start: previous_start,
                    end: month_end(previous_start),
                },
            }
        }
        Period::Year => PeriodWindow {
            current: year_range(today.year()),
            previous: year_range(today.year() - 1),
        },
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(start)
}

fn year_range(year: i32) -> DateRange {
    let fallback = NaiveDate::default();
    DateRange {
        start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(fallback),
        end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(fallback),
    }
}
