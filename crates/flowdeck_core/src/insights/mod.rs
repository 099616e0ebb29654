//! Derived productivity insights.
//!
//! # Responsibility
//! - Resolve reporting windows and score them ([`period`], [`flow`]).
//! - Summarize completed activity as text ([`summary`]).
//! - Shape the aggregate insight response for presentation callers.
//!
//! # Invariants
//! - Everything in this module is pure; `now`/`today` arrive as parameters.

pub mod flow;
pub mod period;
pub mod summary;

use crate::insights::flow::FlowScore;
use crate::insights::period::{DateRange, Period};
use crate::model::task::Task;
use chrono::{Datelike, Days, Timelike};
use serde::Serialize;

/// One bucket of the task-completion series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionBucket {
    pub label: String,
    pub completed: u32,
    pub total: u32,
}

/// One cell of the productive-time heatmap. `day` 0 = Monday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductiveSlot {
    pub day: u32,
    pub hour: u32,
    pub intensity: f64,
}

/// Flow score plus its comparison against the previous window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowScoreInsight {
    pub score: i64,
    pub comparison: FlowComparison,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowComparison {
    pub change: i64,
    pub period: String,
}

impl From<FlowScore> for FlowScoreInsight {
    fn from(value: FlowScore) -> Self {
        Self {
            score: value.score,
            comparison: FlowComparison {
                change: value.change,
                period: value.period_label,
            },
        }
    }
}

/// Aggregate insight response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub flow_score: FlowScoreInsight,
    pub task_completion: Vec<CompletionBucket>,
    pub productive_times: Vec<ProductiveSlot>,
}

/// Buckets tasks due in `range` into the period's completion series.
///
/// - day: one bucket labeled "Today"
/// - week: seven weekday buckets (Mon..Sun)
/// - month: seven-day "Week N" buckets
/// - year: twelve month-name buckets
pub fn completion_series(period: Period, range: DateRange, tasks: &[Task]) -> Vec<CompletionBucket> {
    let mut buckets: Vec<(DateRange, String)> = Vec::new();

    match period {
        Period::Day => {
            buckets.push((range, "Today".to_string()));
        }
        Period::Week => {
            let mut day = range.start;
            while day <= range.end {
                buckets.push((
                    DateRange {
                        start: day,
                        end: day,
                    },
                    day.format("%a").to_string(),
                ));
                let Some(next) = day.checked_add_days(Days::new(1)) else {
                    break;
                };
                day = next;
            }
        }
        Period::Month => {
            let mut start = range.start;
            let mut index = 1;
            while start <= range.end {
                let end = start
                    .checked_add_days(Days::new(6))
                    .map_or(range.end, |candidate| candidate.min(range.end));
                buckets.push((DateRange { start, end }, format!("Week {index}")));
                index += 1;
                let Some(next) = end.checked_add_days(Days::new(1)) else {
                    break;
                };
                start = next;
            }
        }
        Period::Year => {
            let mut start = range.start;
            while start <= range.end {
                let end = chrono::NaiveDate::from_ymd_opt(
                    start.year(),
                    start.month(),
                    days_in_month(start.year(), start.month()),
                )
                .unwrap_or(range.end)
                .min(range.end);
                buckets.push((DateRange { start, end }, start.format("%b").to_string()));
                let Some(next) = end.checked_add_days(Days::new(1)) else {
                    break;
                };
                start = next;
            }
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, label)| {
            let mut total = 0u32;
            let mut completed = 0u32;
            for task in tasks {
                let Some(due) = task.due_date else { continue };
                if !bucket.contains(due) {
                    continue;
                }
                total += 1;
                if task.completed {
                    completed += 1;
                }
            }
            CompletionBucket {
                label,
                completed,
                total,
            }
        })
        .collect()
}

/// Aggregates completion timestamps into the (weekday, hour) heatmap.
///
/// Intensity is the cell count divided by the maximum cell count, so the
/// busiest hour is always 1.0. Cells without completions are omitted.
pub fn productive_times(completed_tasks: &[Task]) -> Vec<ProductiveSlot> {
    let mut cells: Vec<((u32, u32), u32)> = Vec::new();

    for task in completed_tasks {
        let Some(completed_at) = task.completed_at else {
            continue;
        };
        let key = (
            completed_at.weekday().num_days_from_monday(),
            completed_at.hour(),
        );
        match cells.iter_mut().find(|(cell, _)| *cell == key) {
            Some((_, count)) => *count += 1,
            None => cells.push((key, 1)),
        }
    }

    let max_count = cells.iter().map(|(_, count)| *count).max().unwrap_or(0);
    if max_count == 0 {
        return Vec::new();
    }

    cells.sort_by_key(|((day, hour), _)| (*day, *hour));
    cells
        .into_iter()
        .map(|((day, hour), count)| ProductiveSlot {
            day,
            hour,
            intensity: f64::from(count) / f64::from(max_count),
        })
        .collect()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if chrono::NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{completion_series, productive_times};
    use crate::insights::period::{resolve_window, Period};
    use crate::model::task::{Priority, Task};
    use chrono::{Datelike, NaiveDate};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task_due(day: NaiveDate, completed: bool) -> Task {
        let mut task = Task::new("owner", "series task", Priority::Medium);
        task.due_date = Some(day);
        if completed {
            task.complete(day.and_hms_opt(14, 0, 0).unwrap());
        }
        task
    }

    #[test]
    fn week_series_has_seven_weekday_buckets() {
        let window = resolve_window(date(2025, 6, 12), Period::Week);
        let tasks = vec![
            task_due(date(2025, 6, 9), true),
            task_due(date(2025, 6, 9), false),
            task_due(date(2025, 6, 11), true),
        ];
        let series = completion_series(Period::Week, window.current, &tasks);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].label, "Mon");
        assert_eq!(series[0].total, 2);
        assert_eq!(series[0].completed, 1);
        assert_eq!(series[2].label, "Wed");
        assert_eq!(series[2].completed, 1);
        assert_eq!(series[6].label, "Sun");
        assert_eq!(series[6].total, 0);
    }

    #[test]
    fn year_series_has_twelve_month_buckets() {
        let window = resolve_window(date(2025, 8, 3), Period::Year);
        let series = completion_series(Period::Year, window.current, &[]);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].label, "Jan");
        assert_eq!(series[11].label, "Dec");
    }

    #[test]
    fn month_series_covers_whole_month_in_week_buckets() {
        let window = resolve_window(date(2025, 1, 15), Period::Month);
        let series = completion_series(Period::Month, window.current, &[]);
        // 31 days -> 4 full weeks + a 3-day tail.
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].label, "Week 1");
        assert_eq!(series[4].label, "Week 5");
    }

    #[test]
    fn productive_times_normalize_against_busiest_cell() {
        let monday = date(2025, 6, 9);
        assert_eq!(monday.weekday().num_days_from_monday(), 0);
        let tasks = vec![
            task_due(monday, true),
            task_due(monday, true),
            task_due(date(2025, 6, 10), true),
        ];
        let slots = productive_times(&tasks);

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day, 0);
        assert_eq!(slots[0].hour, 14);
        assert!((slots[0].intensity - 1.0).abs() < f64::EPSILON);
        assert!((slots[1].intensity - 0.5).abs() < f64::EPSILON);
    }
}
