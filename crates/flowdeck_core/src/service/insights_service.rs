//! Insights use-case service.
//!
//! # Responsibility
//! - Resolve the requested reporting window and pull its item snapshots.
//! - Compose the pure insight computations into response shapes.
//!
//! # Invariants
//! - `today`/`now` arrive from the caller; this layer never reads the clock.
//! - Empty windows produce defined degenerate results, never errors.

use crate::insights::flow::flow_score;
use crate::insights::period::{resolve_window, Period};
use crate::insights::summary::activity_summary;
use crate::insights::{completion_series, productive_times, Insights};
use crate::model::event::Event;
use crate::repo::event_repo::EventRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use chrono::{NaiveDate, NaiveDateTime};

/// Insights service facade over the task and event repositories.
pub struct InsightsService<T: TaskRepository, E: EventRepository> {
    tasks: T,
    events: E,
}

impl<T: TaskRepository, E: EventRepository> InsightsService<T, E> {
    /// Creates a service using the provided repository implementations.
    pub fn new(tasks: T, events: E) -> Self {
        Self { tasks, events }
    }

    /// Computes the full insight response for one owner and period.
    pub fn get_insights(
        &self,
        owner_id: &str,
        period: Period,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> RepoResult<Insights> {
        let window = resolve_window(today, period);

        let current_tasks = self.tasks.tasks_due_in_range(owner_id, window.current)?;
        let previous_tasks = self.tasks.tasks_due_in_range(owner_id, window.previous)?;
        let current_events = self.events.events_in_range(owner_id, window.current)?;
        let previous_events = self.events.events_in_range(owner_id, window.previous)?;

        let score = flow_score(
            period,
            &current_tasks,
            &current_events,
            &previous_tasks,
            &previous_events,
            now,
        );
        let task_completion = completion_series(period, window.current, &current_tasks);

        let completed_tasks = self
            .tasks
            .tasks_completed_in_range(owner_id, window.current)?;
        let productive = productive_times(&completed_tasks);

        Ok(Insights {
            flow_score: score.into(),
            task_completion,
            productive_times: productive,
        })
    }

    /// Builds the natural-language activity summary for the current window.
    pub fn get_activity_summary(
        &self,
        owner_id: &str,
        period: Period,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> RepoResult<String> {
        let window = resolve_window(today, period);

        let completed_tasks = self
            .tasks
            .tasks_completed_in_range(owner_id, window.current)?;
        let finished_events: Vec<Event> = self
            .events
            .events_ending_in_range(owner_id, window.current)?
            .into_iter()
            .filter(|event| event.is_finished(now))
            .collect();

        Ok(activity_summary(&completed_tasks, &finished_events))
    }
}
