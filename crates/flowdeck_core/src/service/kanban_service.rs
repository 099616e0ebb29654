//! Kanban use-case service.
//!
//! # Responsibility
//! - Serve reconciled board snapshots to presentation callers.
//! - Expose the explicit card move operation.
//!
//! # Invariants
//! - A unique-constraint race during reconciliation is retried exactly once;
//!   the losing pass re-reads the winner's cards and converges.

use crate::model::kanban::{BoardView, CardId, ColumnId, KanbanCard};
use crate::repo::board_repo::{KanbanRepoError, KanbanRepository};
use chrono::NaiveDateTime;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for kanban use-cases.
#[derive(Debug)]
pub enum KanbanServiceError {
    /// Target card does not exist.
    CardNotFound(CardId),
    /// Target column does not exist.
    ColumnNotFound(ColumnId),
    /// Persistence-layer failure, including a reconciliation race that
    /// persisted after the retry.
    Repo(KanbanRepoError),
}

impl Display for KanbanServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CardNotFound(id) => write!(f, "kanban card not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "kanban column not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for KanbanServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KanbanRepoError> for KanbanServiceError {
    fn from(value: KanbanRepoError) -> Self {
        match value {
            KanbanRepoError::CardNotFound(id) => Self::CardNotFound(id),
            KanbanRepoError::ColumnNotFound(id) => Self::ColumnNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Kanban service facade over repository implementations.
pub struct KanbanService<R: KanbanRepository> {
    repo: R,
}

impl<R: KanbanRepository> KanbanService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the owner's board, reconciled against the live task/event set.
    ///
    /// Creates the board with its three system columns on first access.
    pub fn get_board(
        &self,
        owner_id: &str,
        now: NaiveDateTime,
    ) -> Result<BoardView, KanbanServiceError> {
        match self.repo.sync_board(owner_id, now) {
            Ok(sync) => Ok(sync.board),
            Err(KanbanRepoError::Conflict(message)) => {
                warn!(
                    "event=board_sync module=kanban status=retry owner_id={owner_id} error={message}"
                );
                Ok(self.repo.sync_board(owner_id, now)?.board)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Moves one card to `(column, position)` with splice semantics.
    ///
    /// Out-of-range positions clamp to the destination column length.
    pub fn move_card(
        &self,
        card_id: CardId,
        new_column_uuid: ColumnId,
        new_position: i64,
    ) -> Result<KanbanCard, KanbanServiceError> {
        Ok(self.repo.move_card(card_id, new_column_uuid, new_position)?)
    }
}
