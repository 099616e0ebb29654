//! Kanban board repository: reconciliation and card ordering.
//!
//! # Responsibility
//! - Lazily create the per-owner board with its three system columns.
//! - Keep cards consistent with the live task/event set on every fetch.
//! - Maintain contiguous zero-based card positions under move/insert/delete.
//!
//! # Invariants
//! - Reconciliation and moves run inside one Immediate transaction; a
//!   concurrent reader never observes partially shifted positions.
//! - After any operation every column's positions are exactly `0..n-1`.
//! - Card ordering is deterministic: `position ASC, uuid ASC`.
//! - Reconciliation is idempotent: a second pass with no item changes
//!   performs zero writes.

use crate::db::DbError;
use crate::model::event::{Event, EventId};
use crate::model::kanban::{
    BoardId, BoardView, CardId, CardItem, CardLink, CardView, ColumnId, ColumnView, KanbanBoard,
    KanbanCard, KanbanColumn, COLUMN_DONE, COLUMN_IN_PROGRESS, COLUMN_TODO, SYSTEM_COLUMNS,
};
use crate::model::task::{Task, TaskId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{parse_uuid, RepoError};
use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type KanbanRepoResult<T> = Result<T, KanbanRepoError>;

/// Errors from kanban board persistence and reconciliation.
#[derive(Debug)]
pub enum KanbanRepoError {
    Db(DbError),
    /// Target card does not exist.
    CardNotFound(CardId),
    /// Target column does not exist.
    ColumnNotFound(ColumnId),
    /// Board exists but lacks one of the mandatory system columns.
    MissingColumn { board_uuid: BoardId, name: &'static str },
    /// A unique-constraint race with a concurrent reconciliation pass.
    Conflict(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for KanbanRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CardNotFound(id) => write!(f, "kanban card not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "kanban column not found: {id}"),
            Self::MissingColumn { board_uuid, name } => {
                write!(f, "board {board_uuid} is missing mandatory column `{name}`")
            }
            Self::Conflict(message) => {
                write!(f, "concurrent board modification detected: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid kanban data: {message}"),
        }
    }
}

impl Error for KanbanRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for KanbanRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KanbanRepoError {
    fn from(value: rusqlite::Error) -> Self {
        let conflict = matches!(
            &value,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        );
        if conflict {
            Self::Conflict(value.to_string())
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

impl From<RepoError> for KanbanRepoError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Board snapshot plus the number of rows the sync pass wrote.
///
/// A zero write count on a repeated call is the observable form of the
/// idempotence guarantee.
#[derive(Debug)]
pub struct BoardSync {
    pub board: BoardView,
    pub writes: usize,
}

/// Repository interface for kanban board operations.
pub trait KanbanRepository {
    /// Reconciles the owner's board against the live task/event set and
    /// returns a consistent eagerly-loaded snapshot.
    fn sync_board(&self, owner_id: &str, now: NaiveDateTime) -> KanbanRepoResult<BoardSync>;
    /// Moves one card to `(new_column_uuid, new_position)` with splice
    /// semantics; out-of-range positions clamp to the column length. The
    /// destination must belong to the card's own board.
    fn move_card(
        &self,
        card_id: CardId,
        new_column_uuid: ColumnId,
        new_position: i64,
    ) -> KanbanRepoResult<KanbanCard>;
}

/// SQLite-backed kanban repository.
pub struct SqliteKanbanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKanbanRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KanbanRepository for SqliteKanbanRepository<'_> {
    fn sync_board(&self, owner_id: &str, now: NaiveDateTime) -> KanbanRepoResult<BoardSync> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut writes = 0usize;

        let board = match load_board_row(&tx, owner_id)? {
            Some(board) => board,
            None => create_default_board(&tx, owner_id, &mut writes)?,
        };
        let columns = load_columns(&tx, board.uuid)?;
        let todo_col = required_column(&columns, COLUMN_TODO, board.uuid)?;
        let in_progress_col = required_column(&columns, COLUMN_IN_PROGRESS, board.uuid)?;
        let done_col = required_column(&columns, COLUMN_DONE, board.uuid)?;

        let tasks = SqliteTaskRepository::new(&tx).list_tasks(owner_id)?;
        let events = SqliteEventRepository::new(&tx).list_events(owner_id)?;
        let cards = load_board_cards(&tx, board.uuid)?;

        let mut card_by_item: HashMap<Uuid, KanbanCard> = cards
            .iter()
            .map(|card| (card.link.item_id(), card.clone()))
            .collect();
        let mut next_position: HashMap<ColumnId, i64> = HashMap::new();
        for card in &cards {
            let slot = next_position.entry(card.column_uuid).or_insert(0);
            *slot = (*slot).max(card.position + 1);
        }

        for task in &tasks {
            let target = match task_target_column(task, now) {
                COLUMN_DONE => done_col,
                COLUMN_IN_PROGRESS => in_progress_col,
                _ => todo_col,
            };
            reconcile_item(
                &tx,
                &mut card_by_item,
                CardLink::Task(task.uuid),
                target,
                &mut next_position,
                &mut writes,
            )?;
        }
        for event in &events {
            let target = match event_target_column(event, now) {
                COLUMN_DONE => done_col,
                COLUMN_IN_PROGRESS => in_progress_col,
                _ => todo_col,
            };
            reconcile_item(
                &tx,
                &mut card_by_item,
                CardLink::Event(event.uuid),
                target,
                &mut next_position,
                &mut writes,
            )?;
        }

        // Remaining entries reference items that no longer exist.
        for card in card_by_item.values() {
            tx.execute(
                "DELETE FROM kanban_cards WHERE uuid = ?1;",
                [card.uuid.to_string()],
            )?;
            writes += 1;
        }

        for column in &columns {
            writes += renormalize_column(&tx, column.uuid)?;
        }

        tx.commit()?;

        let board = load_board_view(self.conn, owner_id)?.ok_or_else(|| {
            KanbanRepoError::InvalidData(format!("board for owner `{owner_id}` vanished after sync"))
        })?;
        Ok(BoardSync { board, writes })
    }

    fn move_card(
        &self,
        card_id: CardId,
        new_column_uuid: ColumnId,
        new_position: i64,
    ) -> KanbanRepoResult<KanbanCard> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let card = load_card(&tx, card_id)?.ok_or(KanbanRepoError::CardNotFound(card_id))?;
        let board_uuid = column_board(&tx, card.column_uuid)?.ok_or_else(|| {
            KanbanRepoError::InvalidData(format!(
                "card {card_id} references missing column {}",
                card.column_uuid
            ))
        })?;
        // Columns on other boards are invisible to this move.
        match column_board(&tx, new_column_uuid)? {
            Some(destination_board) if destination_board == board_uuid => {}
            _ => return Err(KanbanRepoError::ColumnNotFound(new_column_uuid)),
        }
        let old_column_uuid = card.column_uuid;

        let mut destination_ids = list_column_card_ids(&tx, new_column_uuid)?;
        destination_ids.retain(|id| *id != card_id);
        let target_index = new_position.clamp(0, destination_ids.len() as i64) as usize;
        destination_ids.insert(target_index, card_id);

        tx.execute(
            "UPDATE kanban_cards
             SET column_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![card_id.to_string(), new_column_uuid.to_string()],
        )?;

        for (index, id) in destination_ids.iter().enumerate() {
            write_position(&tx, *id, index as i64)?;
        }

        if old_column_uuid != new_column_uuid {
            renormalize_column(&tx, old_column_uuid)?;
        }

        tx.commit()?;

        load_card(self.conn, card_id)?.ok_or_else(|| {
            KanbanRepoError::InvalidData(format!("card {card_id} vanished after move"))
        })
    }
}

/// Column a task belongs in at `now`.
fn task_target_column(task: &Task, now: NaiveDateTime) -> &'static str {
    if task.completed {
        return COLUMN_DONE;
    }
    match task.due_at() {
        Some(due) if due_within_hour(due, now) => COLUMN_IN_PROGRESS,
        _ => COLUMN_TODO,
    }
}

/// Column an event belongs in at `now`. Events complete once they end.
fn event_target_column(event: &Event, now: NaiveDateTime) -> &'static str {
    if event.is_finished(now) {
        return COLUMN_DONE;
    }
    if due_within_hour(event.start_at, now) {
        return COLUMN_IN_PROGRESS;
    }
    COLUMN_TODO
}

fn due_within_hour(due: NaiveDateTime, now: NaiveDateTime) -> bool {
    now <= due && due < now + Duration::hours(1)
}

fn reconcile_item(
    conn: &Connection,
    card_by_item: &mut HashMap<Uuid, KanbanCard>,
    link: CardLink,
    target_column: ColumnId,
    next_position: &mut HashMap<ColumnId, i64>,
    writes: &mut usize,
) -> KanbanRepoResult<()> {
    match card_by_item.remove(&link.item_id()) {
        Some(card) => {
            if card.column_uuid != target_column {
                // Position carries over; renormalization slots the card
                // deterministically at the end of the pass.
                conn.execute(
                    "UPDATE kanban_cards
                     SET column_uuid = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![card.uuid.to_string(), target_column.to_string()],
                )?;
                *writes += 1;
            }
        }
        None => {
            let slot = next_position.entry(target_column).or_insert(0);
            let position = *slot;
            *slot += 1;

            let (task_uuid, event_uuid) = match link {
                CardLink::Task(id) => (Some(id.to_string()), None),
                CardLink::Event(id) => (None, Some(id.to_string())),
            };
            conn.execute(
                "INSERT INTO kanban_cards (uuid, column_uuid, task_uuid, event_uuid, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    Uuid::new_v4().to_string(),
                    target_column.to_string(),
                    task_uuid,
                    event_uuid,
                    position,
                ],
            )?;
            *writes += 1;
        }
    }
    Ok(())
}

/// Rewrites one column's positions to `0..n-1`, touching only rows whose
/// position actually changes. Returns the number of rewritten rows.
fn renormalize_column(conn: &Connection, column_uuid: ColumnId) -> KanbanRepoResult<usize> {
    let ids = list_column_card_ids(conn, column_uuid)?;
    let mut changed = 0usize;
    for (index, id) in ids.into_iter().enumerate() {
        changed += write_position(conn, id, index as i64)?;
    }
    Ok(changed)
}

fn write_position(conn: &Connection, card_id: CardId, position: i64) -> KanbanRepoResult<usize> {
    let changed = conn.execute(
        "UPDATE kanban_cards
         SET position = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1
           AND position != ?2;",
        params![card_id.to_string(), position],
    )?;
    Ok(changed)
}

fn create_default_board(
    conn: &Connection,
    owner_id: &str,
    writes: &mut usize,
) -> KanbanRepoResult<KanbanBoard> {
    let board = KanbanBoard {
        uuid: Uuid::new_v4(),
        name: "My Board".to_string(),
        owner_id: owner_id.to_string(),
    };
    conn.execute(
        "INSERT INTO kanban_boards (uuid, name, owner_id) VALUES (?1, ?2, ?3);",
        params![board.uuid.to_string(), board.name.as_str(), owner_id],
    )?;
    *writes += 1;

    for (position, name) in SYSTEM_COLUMNS.iter().enumerate() {
        conn.execute(
            "INSERT INTO kanban_columns (uuid, board_uuid, name, position)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                Uuid::new_v4().to_string(),
                board.uuid.to_string(),
                name,
                position as i64,
            ],
        )?;
        *writes += 1;
    }

    Ok(board)
}

fn required_column(
    columns: &[KanbanColumn],
    name: &'static str,
    board_uuid: BoardId,
) -> KanbanRepoResult<ColumnId> {
    columns
        .iter()
        .find(|column| column.name == name)
        .map(|column| column.uuid)
        .ok_or(KanbanRepoError::MissingColumn { board_uuid, name })
}

fn load_board_row(conn: &Connection, owner_id: &str) -> KanbanRepoResult<Option<KanbanBoard>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, name, owner_id
         FROM kanban_boards
         WHERE owner_id = ?1;",
    )?;
    let mut rows = stmt.query([owner_id])?;
    if let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        return Ok(Some(KanbanBoard {
            uuid: parse_uuid(&uuid_text, "kanban_boards.uuid")
                .map_err(KanbanRepoError::InvalidData)?,
            name: row.get("name")?,
            owner_id: row.get("owner_id")?,
        }));
    }
    Ok(None)
}

fn load_columns(conn: &Connection, board_uuid: BoardId) -> KanbanRepoResult<Vec<KanbanColumn>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, board_uuid, name, position
         FROM kanban_columns
         WHERE board_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([board_uuid.to_string()])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        let board_text: String = row.get("board_uuid")?;
        columns.push(KanbanColumn {
            uuid: parse_uuid(&uuid_text, "kanban_columns.uuid")
                .map_err(KanbanRepoError::InvalidData)?,
            board_uuid: parse_uuid(&board_text, "kanban_columns.board_uuid")
                .map_err(KanbanRepoError::InvalidData)?,
            name: row.get("name")?,
            position: row.get("position")?,
        });
    }
    Ok(columns)
}

fn load_board_cards(conn: &Connection, board_uuid: BoardId) -> KanbanRepoResult<Vec<KanbanCard>> {
    let mut stmt = conn.prepare(
        "SELECT c.uuid, c.column_uuid, c.task_uuid, c.event_uuid, c.position
         FROM kanban_cards c
         JOIN kanban_columns k ON k.uuid = c.column_uuid
         WHERE k.board_uuid = ?1
         ORDER BY c.column_uuid ASC, c.position ASC, c.uuid ASC;",
    )?;
    let mut rows = stmt.query([board_uuid.to_string()])?;
    let mut cards = Vec::new();
    while let Some(row) = rows.next()? {
        cards.push(parse_card_row(row)?);
    }
    Ok(cards)
}

fn load_card(conn: &Connection, card_id: CardId) -> KanbanRepoResult<Option<KanbanCard>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, column_uuid, task_uuid, event_uuid, position
         FROM kanban_cards
         WHERE uuid = ?1;",
    )?;
    let mut rows = stmt.query([card_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_card_row(row)?));
    }
    Ok(None)
}

fn column_board(conn: &Connection, column_uuid: ColumnId) -> KanbanRepoResult<Option<BoardId>> {
    let mut stmt = conn.prepare("SELECT board_uuid FROM kanban_columns WHERE uuid = ?1;")?;
    let mut rows = stmt.query([column_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        return Ok(Some(
            parse_uuid(&value, "kanban_columns.board_uuid")
                .map_err(KanbanRepoError::InvalidData)?,
        ));
    }
    Ok(None)
}

fn list_column_card_ids(conn: &Connection, column_uuid: ColumnId) -> KanbanRepoResult<Vec<CardId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM kanban_cards
         WHERE column_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([column_uuid.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "kanban_cards.uuid").map_err(KanbanRepoError::InvalidData)?);
    }
    Ok(ids)
}

fn parse_card_row(row: &Row<'_>) -> KanbanRepoResult<KanbanCard> {
    let uuid_text: String = row.get("uuid")?;
    let uuid =
        parse_uuid(&uuid_text, "kanban_cards.uuid").map_err(KanbanRepoError::InvalidData)?;
    let column_text: String = row.get("column_uuid")?;
    let column_uuid = parse_uuid(&column_text, "kanban_cards.column_uuid")
        .map_err(KanbanRepoError::InvalidData)?;

    let task_uuid: Option<String> = row.get("task_uuid")?;
    let event_uuid: Option<String> = row.get("event_uuid")?;
    let link = match (task_uuid, event_uuid) {
        (Some(task), None) => CardLink::Task(
            parse_uuid(&task, "kanban_cards.task_uuid").map_err(KanbanRepoError::InvalidData)?,
        ),
        (None, Some(event)) => CardLink::Event(
            parse_uuid(&event, "kanban_cards.event_uuid").map_err(KanbanRepoError::InvalidData)?,
        ),
        _ => {
            return Err(KanbanRepoError::InvalidData(format!(
                "card {uuid} must reference exactly one of task/event"
            )));
        }
    };

    Ok(KanbanCard {
        uuid,
        column_uuid,
        link,
        position: row.get("position")?,
    })
}

/// Assembles the eager board snapshot with resolved card payloads.
fn load_board_view(conn: &Connection, owner_id: &str) -> KanbanRepoResult<Option<BoardView>> {
    let Some(board) = load_board_row(conn, owner_id)? else {
        return Ok(None);
    };
    let columns = load_columns(conn, board.uuid)?;
    let cards = load_board_cards(conn, board.uuid)?;

    let tasks: HashMap<TaskId, Task> = SqliteTaskRepository::new(conn)
        .list_tasks(owner_id)?
        .into_iter()
        .map(|task| (task.uuid, task))
        .collect();
    let events: HashMap<EventId, Event> = SqliteEventRepository::new(conn)
        .list_events(owner_id)?
        .into_iter()
        .map(|event| (event.uuid, event))
        .collect();

    let mut column_views = Vec::with_capacity(columns.len());
    for column in columns {
        let mut card_views = Vec::new();
        for card in cards.iter().filter(|card| card.column_uuid == column.uuid) {
            let item = match card.link {
                CardLink::Task(id) => CardItem::Task(
                    tasks
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| {
                            KanbanRepoError::InvalidData(format!(
                                "card {} references missing task {id}",
                                card.uuid
                            ))
                        })?,
                ),
                CardLink::Event(id) => CardItem::Event(
                    events
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| {
                            KanbanRepoError::InvalidData(format!(
                                "card {} references missing event {id}",
                                card.uuid
                            ))
                        })?,
                ),
            };
            card_views.push(CardView {
                card: card.clone(),
                item,
            });
        }
        column_views.push(ColumnView {
            column,
            cards: card_views,
        });
    }

    Ok(Some(BoardView {
        board,
        columns: column_views,
    }))
}
