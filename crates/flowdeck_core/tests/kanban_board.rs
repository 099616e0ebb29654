use chrono::{Duration, NaiveDate, NaiveDateTime};
use flowdeck_core::db::open_db_in_memory;
use flowdeck_core::model::kanban::{COLUMN_DONE, COLUMN_IN_PROGRESS, COLUMN_TODO};
use flowdeck_core::{
    BoardSync, BoardView, CardId, ColumnId, Event, EventCategory, EventRepository, KanbanBoard,
    KanbanCard, KanbanRepoError, KanbanRepoResult, KanbanRepository, KanbanService,
    KanbanServiceError, Priority, SqliteEventRepository, SqliteKanbanRepository,
    SqliteTaskRepository, Task, TaskRepository,
};
use std::cell::Cell;
use std::rc::Rc;
use uuid::Uuid;

const OWNER: &str = "owner-1";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn task_due_in(conn: &rusqlite::Connection, title: &str, minutes: i64) -> Task {
    let due = now() + Duration::minutes(minutes);
    let mut task = Task::new(OWNER, title, Priority::Medium);
    task.due_date = Some(due.date());
    task.due_time = Some(due.time());
    SqliteTaskRepository::new(conn).create_task(&task).unwrap();
    task
}

#[test]
fn first_sync_creates_board_with_system_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::new(&conn);

    let sync = repo.sync_board(OWNER, now()).unwrap();
    let names: Vec<&str> = sync
        .board
        .columns
        .iter()
        .map(|view| view.column.name.as_str())
        .collect();
    assert_eq!(names, vec![COLUMN_TODO, COLUMN_IN_PROGRESS, COLUMN_DONE]);
    // One board row plus three column rows.
    assert_eq!(sync.writes, 4);
}

#[test]
fn sync_places_items_by_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::new(&conn);

    task_due_in(&conn, "due soon", 30);
    task_due_in(&conn, "due later", 300);
    let mut done = Task::new(OWNER, "already done", Priority::Low);
    done.complete(now());
    SqliteTaskRepository::new(&conn).create_task(&done).unwrap();

    let meeting = Event::new(
        OWNER,
        "starts soon",
        now() + Duration::minutes(15),
        now() + Duration::minutes(75),
        EventCategory::Work,
    );
    SqliteEventRepository::new(&conn)
        .create_event(&meeting)
        .unwrap();

    let sync = repo.sync_board(OWNER, now()).unwrap();
    let board = sync.board;

    let todo = board.column_named(COLUMN_TODO).unwrap();
    let in_progress = board.column_named(COLUMN_IN_PROGRESS).unwrap();
    let done_col = board.column_named(COLUMN_DONE).unwrap();

    assert_eq!(todo.cards.len(), 1);
    assert_eq!(in_progress.cards.len(), 2);
    assert_eq!(done_col.cards.len(), 1);

    for column in &board.columns {
        let positions: Vec<i64> = column.cards.iter().map(|view| view.card.position).collect();
        let expected: Vec<i64> = (0..column.cards.len() as i64).collect();
        assert_eq!(positions, expected, "column {} positions", column.column.name);
    }
}

#[test]
fn repeated_sync_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::new(&conn);

    task_due_in(&conn, "alpha", 30);
    task_due_in(&conn, "beta", 300);

    let first = repo.sync_board(OWNER, now()).unwrap();
    assert!(first.writes > 0);

    let second = repo.sync_board(OWNER, now()).unwrap();
    assert_eq!(second.writes, 0, "unchanged board must write nothing");
}

#[test]
fn completing_a_task_moves_its_card_to_done() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);

    let mut task = task_due_in(&conn, "finish draft", 30);
    repo.sync_board(OWNER, now()).unwrap();

    task.complete(now());
    tasks.update_task(&task).unwrap();

    let sync = repo.sync_board(OWNER, now()).unwrap();
    let done = sync.board.column_named(COLUMN_DONE).unwrap();
    assert_eq!(done.cards.len(), 1);
    assert_eq!(
        done.cards[0].card.link.item_id(),
        task.uuid,
        "completed task's card lands in Done"
    );
    assert!(sync
        .board
        .column_named(COLUMN_IN_PROGRESS)
        .unwrap()
        .cards
        .is_empty());
}

#[test]
fn deleting_a_task_removes_its_card_and_closes_the_gap() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKanbanRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);

    let first = task_due_in(&conn, "first", 200);
    let second = task_due_in(&conn, "second", 300);
    let third = task_due_in(&conn, "third", 400);
    repo.sync_board(OWNER, now()).unwrap();

    tasks.delete_task(second.uuid).unwrap();

    let sync = repo.sync_board(OWNER, now()).unwrap();
    let todo = sync.board.column_named(COLUMN_TODO).unwrap();
    let items: Vec<_> = todo
        .cards
        .iter()
        .map(|view| view.card.link.item_id())
        .collect();
    assert_eq!(items.len(), 2);
    assert!(items.contains(&first.uuid));
    assert!(items.contains(&third.uuid));
    assert_eq!(todo.cards[0].card.position, 0);
    assert_eq!(todo.cards[1].card.position, 1);
}

/// Repository stub whose first `conflicts` sync calls lose a reconciliation
/// race; later calls succeed with an empty board.
struct RacySyncRepository {
    conflicts: usize,
    calls: Rc<Cell<usize>>,
}

impl KanbanRepository for RacySyncRepository {
    fn sync_board(&self, owner_id: &str, _now: NaiveDateTime) -> KanbanRepoResult<BoardSync> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call <= self.conflicts {
            return Err(KanbanRepoError::Conflict(
                "UNIQUE constraint failed: kanban_cards.task_uuid".to_string(),
            ));
        }
        Ok(BoardSync {
            board: BoardView {
                board: KanbanBoard {
                    uuid: Uuid::new_v4(),
                    name: "My Board".to_string(),
                    owner_id: owner_id.to_string(),
                },
                columns: Vec::new(),
            },
            writes: 0,
        })
    }

    fn move_card(
        &self,
        card_id: CardId,
        _new_column_uuid: ColumnId,
        _new_position: i64,
    ) -> KanbanRepoResult<KanbanCard> {
        Err(KanbanRepoError::CardNotFound(card_id))
    }
}

#[test]
fn get_board_retries_once_after_losing_a_sync_race() {
    let calls = Rc::new(Cell::new(0));
    let service = KanbanService::new(RacySyncRepository {
        conflicts: 1,
        calls: calls.clone(),
    });

    let board = service.get_board(OWNER, now()).unwrap();
    assert_eq!(board.board.owner_id, OWNER);
    assert_eq!(calls.get(), 2, "losing pass must run the sync again");
}

#[test]
fn get_board_surfaces_conflict_when_the_retry_also_loses() {
    let calls = Rc::new(Cell::new(0));
    let service = KanbanService::new(RacySyncRepository {
        conflicts: usize::MAX,
        calls: calls.clone(),
    });

    let err = service.get_board(OWNER, now()).unwrap_err();
    assert!(matches!(
        err,
        KanbanServiceError::Repo(KanbanRepoError::Conflict(_))
    ));
    assert_eq!(calls.get(), 2, "exactly one retry, then the error surfaces");
}

#[test]
fn service_get_board_returns_reconciled_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let service = KanbanService::new(SqliteKanbanRepository::new(&conn));

    task_due_in(&conn, "only task", 30);

    let board = service.get_board(OWNER, now()).unwrap();
    assert_eq!(board.board.owner_id, OWNER);
    assert_eq!(board.columns.len(), 3);
    assert_eq!(
        board.column_named(COLUMN_IN_PROGRESS).unwrap().cards.len(),
        1
    );
}
