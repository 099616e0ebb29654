//! Flow score computation.
//!
//! # Responsibility
//! - Blend weighted completion and timeliness into a 0-100 score.
//! - Compare the current window against the preceding one.
//!
//! # Invariants
//! - Pure over the task/event snapshot plus explicit `now`.
//! - Empty windows are degenerate inputs, not errors: each component is 0.
//! - The final score is clamped to `[0, 100]` before rounding.

use crate::insights::period::Period;
use crate::model::event::Event;
use crate::model::task::Task;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

const COMPLETION_POINTS: f64 = 70.0;
const TIMELINESS_POINTS: f64 = 30.0;

/// Timeliness contribution per qualifying task.
const EARLY_POINTS: i64 = 2;
const ON_TIME_POINTS: i64 = 1;
const LATE_POINTS: i64 = -2;

/// Flow score for one window plus the delta against the previous window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowScore {
    /// Rounded score in `[0, 100]`.
    pub score: i64,
    /// `current - previous`, both rounded.
    pub change: i64,
    /// Names the comparison window, e.g. `"last week"`.
    pub period_label: String,
}

/// Computes the blended score for both windows and the delta between them.
///
/// `current_*` and `previous_*` are the items due/occurring in each window;
/// `now` drives the derived event-completion rule.
pub fn flow_score(
    period: Period,
    current_tasks: &[Task],
    current_events: &[Event],
    previous_tasks: &[Task],
    previous_events: &[Event],
    now: NaiveDateTime,
) -> FlowScore {
    let current = window_score(period, current_tasks, current_events, now);
    let previous = window_score(period, previous_tasks, previous_events, now);
    FlowScore {
        score: current,
        change: current - previous,
        period_label: period.comparison_label(),
    }
}

/// Scores one window: completion and timeliness components blended by the
/// period's weights, clamped and rounded half away from zero.
pub fn window_score(period: Period, tasks: &[Task], events: &[Event], now: NaiveDateTime) -> i64 {
    let completion = completion_component(tasks, events, now);
    let timeliness = timeliness_component(tasks);
    let (completion_weight, timeliness_weight) = period.blend_weights();

    let blended = completion * completion_weight + timeliness * timeliness_weight;
    blended.clamp(0.0, 100.0).round() as i64
}

/// Weighted completion ratio scaled to [`COMPLETION_POINTS`].
///
/// Tasks weigh by priority; events weigh 1.0 and complete once their end
/// time has passed. An empty window yields 0.
fn completion_component(tasks: &[Task], events: &[Event], now: NaiveDateTime) -> f64 {
    let mut total = 0.0;
    let mut done = 0.0;

    for task in tasks {
        let weight = task.priority.weight();
        total += weight;
        if task.completed {
            done += weight;
        }
    }
    for event in events {
        total += 1.0;
        if event.is_finished(now) {
            done += 1.0;
        }
    }

    if total <= 0.0 {
        return 0.0;
    }
    done / total * COMPLETION_POINTS
}

/// Early/on-time/late points over qualifying tasks, normalized by the
/// maximum attainable (`count * 2`) and scaled to [`TIMELINESS_POINTS`].
///
/// Qualifying tasks are completed with both a due date and a completion
/// timestamp. No qualifying tasks yields 0. A window dominated by late
/// completions can go negative; the caller's clamp absorbs it.
fn timeliness_component(tasks: &[Task]) -> f64 {
    let mut accumulated = 0i64;
    let mut qualifying = 0i64;

    for task in tasks {
        if !task.completed {
            continue;
        }
        let (Some(due_at), Some(completed_at)) = (task.due_at(), task.completed_at) else {
            continue;
        };

        let delta = completed_at - due_at;
        accumulated += if delta < -Duration::hours(1) {
            EARLY_POINTS
        } else if delta > Duration::hours(1) {
            LATE_POINTS
        } else {
            ON_TIME_POINTS
        };
        qualifying += 1;
    }

    if qualifying == 0 {
        return 0.0;
    }
    accumulated as f64 / (qualifying * 2) as f64 * TIMELINESS_POINTS
}
