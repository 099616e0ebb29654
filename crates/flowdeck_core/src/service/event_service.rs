//! Event use-case service.
//!
//! # Responsibility
//! - Provide event create/update/get/list/delete APIs over the repository.
//!
//! # Invariants
//! - Events never carry a stored completion flag; callers derive completion
//!   from `end_at` against their own `now`.

use crate::model::event::{Event, EventId};
use crate::repo::event_repo::EventRepository;
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for event use-cases.
#[derive(Debug)]
pub enum EventServiceError {
    /// Target event does not exist.
    EventNotFound(EventId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent event state: {details}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EventServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EventNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Event service facade over repository implementations.
pub struct EventService<R: EventRepository> {
    repo: R,
}

impl<R: EventRepository> EventService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one event and returns its persisted form.
    pub fn create_event(&self, event: &Event) -> Result<Event, EventServiceError> {
        let id = self.repo.create_event(event)?;
        self.repo
            .get_event(id)?
            .ok_or(EventServiceError::InconsistentState(
                "created event not found in read-back",
            ))
    }

    /// Replaces the event's fields fully and returns the persisted form.
    pub fn update_event(&self, event: &Event) -> Result<Event, EventServiceError> {
        self.repo.update_event(event)?;
        self.repo
            .get_event(event.uuid)?
            .ok_or(EventServiceError::InconsistentState(
                "updated event not found in read-back",
            ))
    }

    /// Gets one event by stable ID.
    pub fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        self.repo.get_event(id)
    }

    /// Lists the owner's events ordered by start time.
    pub fn list_events(&self, owner_id: &str) -> RepoResult<Vec<Event>> {
        self.repo.list_events(owner_id)
    }

    /// Deletes one event; its card disappears with it on the next board sync.
    pub fn delete_event(&self, id: EventId) -> Result<(), EventServiceError> {
        self.repo.delete_event(id)?;
        Ok(())
    }
}
