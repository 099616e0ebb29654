//! Task use-case service.
//!
//! # Responsibility
//! - Provide task create/update/get/list/delete APIs over the repository.
//! - Own the completion state machine, including the subtask cascade.
//!
//! # Invariants
//! - Completion writes always carry a matching `completed_at` timestamp.
//! - After `set_task_completion` every ancestor's completion state agrees
//!   with its subtasks: complete iff all subtasks are complete.
//! - The ancestor walk visits each task at most once; a malformed parent
//!   cycle terminates instead of looping.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one task and returns its persisted form.
    pub fn create_task(&self, task: &Task) -> Result<Task, TaskServiceError> {
        let id = self.repo.create_task(task)?;
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Replaces the task's fields fully and returns the persisted form.
    pub fn update_task(&self, task: &Task) -> Result<Task, TaskServiceError> {
        self.repo.update_task(task)?;
        self.repo
            .get_task(task.uuid)?
            .ok_or(TaskServiceError::InconsistentState(
                "updated task not found in read-back",
            ))
    }

    /// Gets one task by stable ID.
    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Lists the owner's tasks ordered by due date.
    pub fn list_tasks(&self, owner_id: &str) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(owner_id)
    }

    /// Lists the direct subtasks of one task.
    pub fn list_subtasks(&self, parent_uuid: TaskId) -> RepoResult<Vec<Task>> {
        self.repo.list_subtasks(parent_uuid)
    }

    /// Deletes one task; its card disappears with it on the next board sync.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(id)?;
        Ok(())
    }

    /// Sets one task's completion state and cascades it up the parent chain.
    ///
    /// A parent auto-completes when all of its subtasks are complete and
    /// auto-reopens when any subtask is reopened. The walk stops as soon as
    /// an ancestor's state is already consistent.
    pub fn set_task_completion(
        &self,
        task_id: TaskId,
        completed: bool,
        now: NaiveDateTime,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self
            .repo
            .get_task(task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))?;

        if completed {
            task.complete(now);
        } else {
            task.reopen();
        }
        self.repo.update_task(&task)?;

        let mut visited: HashSet<TaskId> = HashSet::new();
        visited.insert(task.uuid);
        let mut cursor = task.parent_uuid;

        while let Some(parent_id) = cursor {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(mut parent) = self.repo.get_task(parent_id)? else {
                break;
            };

            let subtasks = self.repo.list_subtasks(parent_id)?;
            let all_complete =
                !subtasks.is_empty() && subtasks.iter().all(|subtask| subtask.completed);

            if all_complete && !parent.completed {
                parent.complete(now);
            } else if !all_complete && parent.completed {
                parent.reopen();
            } else {
                // Parent already consistent; ancestors cannot change either.
                break;
            }
            self.repo.update_task(&parent)?;
            cursor = parent.parent_uuid;
        }

        self.repo
            .get_task(task_id)?
            .ok_or(TaskServiceError::InconsistentState(
                "task missing after completion update",
            ))
    }
}
