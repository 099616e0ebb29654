use chrono::{Duration, NaiveDate, NaiveDateTime};
use flowdeck_core::db::open_db_in_memory;
use flowdeck_core::model::kanban::{COLUMN_DONE, COLUMN_TODO};
use flowdeck_core::{
    BoardView, CardId, ColumnId, KanbanRepoError, KanbanRepository, KanbanService,
    KanbanServiceError, Priority, SqliteKanbanRepository, SqliteTaskRepository, Task,
    TaskRepository,
};
use uuid::Uuid;

const OWNER: &str = "owner-1";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// Seeds `count` open tasks due far out, so they all land in To Do, and
/// returns the synced board.
fn board_with_todo_cards(conn: &rusqlite::Connection, count: usize) -> BoardView {
    let tasks = SqliteTaskRepository::new(conn);
    for index in 0..count {
        let due = now() + Duration::hours(10 + index as i64);
        let mut task = Task::new(OWNER, format!("task {index}"), Priority::Medium);
        task.due_date = Some(due.date());
        task.due_time = Some(due.time());
        tasks.create_task(&task).unwrap();
    }
    SqliteKanbanRepository::new(conn)
        .sync_board(OWNER, now())
        .unwrap()
        .board
}

fn column_id(board: &BoardView, name: &str) -> ColumnId {
    board.column_named(name).unwrap().column.uuid
}

fn card_ids(board: &BoardView, column: &str) -> Vec<CardId> {
    board
        .column_named(column)
        .unwrap()
        .cards
        .iter()
        .map(|view| view.card.uuid)
        .collect()
}

#[test]
fn move_within_column_splices_and_renumbers() {
    let conn = open_db_in_memory().unwrap();
    let board = board_with_todo_cards(&conn, 4);
    let todo = column_id(&board, COLUMN_TODO);
    let before = card_ids(&board, COLUMN_TODO);

    let repo = SqliteKanbanRepository::new(&conn);
    let moved = repo.move_card(before[3], todo, 1).unwrap();
    assert_eq!(moved.position, 1);

    let board = repo.sync_board(OWNER, now()).unwrap().board;
    let after = card_ids(&board, COLUMN_TODO);
    assert_eq!(after, vec![before[0], before[3], before[1], before[2]]);
}

#[test]
fn move_across_columns_renumbers_both() {
    let conn = open_db_in_memory().unwrap();
    let board = board_with_todo_cards(&conn, 3);
    let done = column_id(&board, COLUMN_DONE);
    let before = card_ids(&board, COLUMN_TODO);

    let repo = SqliteKanbanRepository::new(&conn);
    let moved = repo.move_card(before[1], done, 0).unwrap();
    assert_eq!(moved.column_uuid, done);
    assert_eq!(moved.position, 0);

    // Read the raw positions: the old column closed its gap.
    let positions: Vec<i64> = {
        let mut stmt = conn
            .prepare(
                "SELECT position FROM kanban_cards
                 WHERE column_uuid = ?1
                 ORDER BY position ASC;",
            )
            .unwrap();
        let board_todo = column_id(&board, COLUMN_TODO);
        stmt.query_map([board_todo.to_string()], |row| row.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    };
    assert_eq!(positions, vec![0, 1]);
}

#[test]
fn out_of_range_position_clamps_to_column_length() {
    let conn = open_db_in_memory().unwrap();
    let board = board_with_todo_cards(&conn, 3);
    let todo = column_id(&board, COLUMN_TODO);
    let before = card_ids(&board, COLUMN_TODO);

    let repo = SqliteKanbanRepository::new(&conn);
    let moved = repo.move_card(before[0], todo, 99).unwrap();
    assert_eq!(moved.position, 2, "clamped to last slot");

    let moved = repo.move_card(before[1], todo, -5).unwrap();
    assert_eq!(moved.position, 0, "negative positions clamp to 0");
}

#[test]
fn moving_into_another_owners_column_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let board = board_with_todo_cards(&conn, 1);
    let card = card_ids(&board, COLUMN_TODO)[0];

    let repo = SqliteKanbanRepository::new(&conn);
    let other_board = repo.sync_board("owner-2", now()).unwrap().board;
    let foreign_todo = column_id(&other_board, COLUMN_TODO);

    let err = repo.move_card(card, foreign_todo, 0).unwrap_err();
    assert!(matches!(err, KanbanRepoError::ColumnNotFound(id) if id == foreign_todo));
}

#[test]
fn moving_unknown_card_or_column_is_an_error() {
    let conn = open_db_in_memory().unwrap();
    let board = board_with_todo_cards(&conn, 1);
    let todo = column_id(&board, COLUMN_TODO);
    let card = card_ids(&board, COLUMN_TODO)[0];

    let service = KanbanService::new(SqliteKanbanRepository::new(&conn));

    let ghost_card = Uuid::new_v4();
    let err = service.move_card(ghost_card, todo, 0).unwrap_err();
    assert!(matches!(err, KanbanServiceError::CardNotFound(id) if id == ghost_card));

    let ghost_column = Uuid::new_v4();
    let err = service.move_card(card, ghost_column, 0).unwrap_err();
    assert!(matches!(err, KanbanServiceError::ColumnNotFound(id) if id == ghost_column));
}
