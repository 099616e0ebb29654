//! Core domain logic for FlowDeck.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod insights;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use insights::period::{resolve_window, DateRange, Period, PeriodWindow};
pub use insights::{CompletionBucket, FlowScoreInsight, Insights, ProductiveSlot};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{Event, EventCategory, EventId};
pub use model::kanban::{
    BoardView, CardId, CardItem, CardLink, ColumnId, KanbanBoard, KanbanCard, KanbanColumn,
};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use repo::board_repo::{
    BoardSync, KanbanRepoError, KanbanRepoResult, KanbanRepository, SqliteKanbanRepository,
};
pub use repo::event_repo::{EventRepository, SqliteEventRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::event_service::{EventService, EventServiceError};
pub use service::insights_service::InsightsService;
pub use service::kanban_service::{KanbanService, KanbanServiceError};
pub use service::task_service::{TaskService, TaskServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
