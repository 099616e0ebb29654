//! Task domain model.
//!
//! # Responsibility
//! - Define the task record including the self-referential subtask link.
//! - Provide lifecycle helpers for completion state.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another task.
//! - `completed_at` is set if and only if `completed` is true.
//! - `due_time` is meaningful only together with `due_date`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Task urgency level driving flow-score weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Completion weight used by the flow-score denominator/numerator.
    pub fn weight(self) -> f64 {
        match self {
            Self::High => 1.5,
            Self::Medium => 1.0,
            Self::Low => 0.5,
        }
    }
}

/// Validation failures rejected before any task write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is blank after trim.
    BlankTitle,
    /// `completed` and `completed_at` disagree.
    CompletionTimestampMismatch { completed: bool },
    /// A due time was provided without a due date.
    DueTimeWithoutDate,
    /// Task is its own parent.
    SelfParent(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::CompletionTimestampMismatch { completed } => write!(
                f,
                "completed_at must be set exactly when completed is true (completed={completed})"
            ),
            Self::DueTimeWithoutDate => write!(f, "due_time requires due_date"),
            Self::SelfParent(id) => write!(f, "task cannot be its own parent: {id}"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for linking, cards and auditing.
    pub uuid: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// Meaningful only together with `due_date`.
    pub due_time: Option<NaiveTime>,
    pub priority: Priority,
    pub completed: bool,
    /// Set exactly when `completed` is true.
    pub completed_at: Option<NaiveDateTime>,
    /// RRULE text stored pass-through; expansion happens outside this core.
    pub recurrence_rule: Option<String>,
    pub recurrence_end: Option<NaiveDate>,
    pub owner_id: String,
    /// Parent task for subtask trees. `None` means top-level.
    pub parent_uuid: Option<TaskId>,
    /// Opaque reference into the external goal store.
    pub goal_uuid: Option<Uuid>,
}

impl Task {
    /// Creates a new open task with a generated stable ID.
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            description: None,
            due_date: None,
            due_time: None,
            priority,
            completed: false,
            completed_at: None,
            recurrence_rule: None,
            recurrence_end: None,
            owner_id: owner_id.into(),
            parent_uuid: None,
            goal_uuid: None,
        }
    }

    /// Checks write-time invariants.
    ///
    /// # Errors
    /// - `BlankTitle` for empty titles.
    /// - `CompletionTimestampMismatch` when `completed`/`completed_at` disagree.
    /// - `DueTimeWithoutDate` for dangling due times.
    /// - `SelfParent` when `parent_uuid` points at this task.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        if self.completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionTimestampMismatch {
                completed: self.completed,
            });
        }
        if self.due_time.is_some() && self.due_date.is_none() {
            return Err(TaskValidationError::DueTimeWithoutDate);
        }
        if self.parent_uuid == Some(self.uuid) {
            return Err(TaskValidationError::SelfParent(self.uuid));
        }
        Ok(())
    }

    /// Combined due instant, defaulting the time-of-day to midnight.
    ///
    /// Returns `None` for tasks without a due date.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        self.due_date
            .map(|date| date.and_time(self.due_time.unwrap_or(NaiveTime::MIN)))
    }

    /// Marks the task completed at `now`.
    pub fn complete(&mut self, now: NaiveDateTime) {
        self.completed = true;
        self.completed_at = Some(now);
    }

    /// Reopens the task and clears the completion timestamp.
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskValidationError};
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn validate_rejects_completion_timestamp_mismatch() {
        let mut task = Task::new("owner", "write report", Priority::Medium);
        task.completed = true;
        let err = task.validate().unwrap_err();
        assert!(matches!(
            err,
            TaskValidationError::CompletionTimestampMismatch { completed: true }
        ));
    }

    #[test]
    fn validate_rejects_due_time_without_date() {
        let mut task = Task::new("owner", "water plants", Priority::Low);
        task.due_time = NaiveTime::from_hms_opt(9, 0, 0);
        assert_eq!(
            task.validate().unwrap_err(),
            TaskValidationError::DueTimeWithoutDate
        );
    }

    #[test]
    fn due_at_defaults_time_to_midnight() {
        let mut task = Task::new("owner", "file taxes", Priority::High);
        task.due_date = NaiveDate::from_ymd_opt(2025, 4, 15);
        let due = task.due_at().unwrap();
        assert_eq!(due.time(), NaiveTime::MIN);
    }

    #[test]
    fn complete_and_reopen_keep_invariant() {
        let mut task = Task::new("owner", "review notes", Priority::Medium);
        task.complete(
            NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        );
        task.validate().unwrap();
        task.reopen();
        task.validate().unwrap();
        assert!(task.completed_at.is_none());
    }
}
