//! Kanban board/column/card domain model.
//!
//! # Responsibility
//! - Define the board hierarchy records and the card item link.
//! - Name the three system columns every board must carry.
//!
//! # Invariants
//! - A board owns its columns; a column owns its cards.
//! - Card positions within a column are contiguous `0..n-1` after every
//!   repository operation.
//! - A card links exactly one task or event; `CardLink` makes the
//!   exclusivity a type-level guarantee.

use crate::model::event::{Event, EventId};
use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type ColumnId = Uuid;
pub type CardId = Uuid;

/// Name of the column new and idle items land in.
pub const COLUMN_TODO: &str = "To Do";
/// Name of the column for items due within the next hour.
pub const COLUMN_IN_PROGRESS: &str = "In Progress";
/// Name of the column completed items land in.
pub const COLUMN_DONE: &str = "Done";

/// The three mandatory columns in board order.
pub const SYSTEM_COLUMNS: [&str; 3] = [COLUMN_TODO, COLUMN_IN_PROGRESS, COLUMN_DONE];

/// Per-owner board record. One board per owner, lazily created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub uuid: BoardId,
    pub name: String,
    pub owner_id: String,
}

/// Column record; `position` defines left-to-right board order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub uuid: ColumnId,
    pub board_uuid: BoardId,
    pub name: String,
    pub position: i64,
}

/// Non-owning reference from a card to the single item it mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardLink {
    Task(TaskId),
    Event(EventId),
}

impl CardLink {
    /// Stable key used to match cards against the live item set.
    pub fn item_id(self) -> Uuid {
        match self {
            Self::Task(id) => id,
            Self::Event(id) => id,
        }
    }
}

/// Card record; `position` defines top-to-bottom order within its column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanCard {
    pub uuid: CardId,
    pub column_uuid: ColumnId,
    pub link: CardLink,
    pub position: i64,
}

/// Resolved card payload returned in board snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardItem {
    Task(Task),
    Event(Event),
}

/// Card plus its resolved task-or-event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub card: KanbanCard,
    pub item: CardItem,
}

/// Column plus its cards ordered by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub column: KanbanColumn,
    pub cards: Vec<CardView>,
}

/// Eagerly-loaded board snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub board: KanbanBoard,
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    /// Finds a column view by its system name.
    pub fn column_named(&self, name: &str) -> Option<&ColumnView> {
        self.columns.iter().find(|view| view.column.name == name)
    }
}
