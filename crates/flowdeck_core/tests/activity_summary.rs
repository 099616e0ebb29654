use chrono::{NaiveDate, NaiveDateTime};
use flowdeck_core::db::open_db_in_memory;
use flowdeck_core::insights::summary::NO_ACTIVITY_MESSAGE;
use flowdeck_core::{
    Event, EventCategory, EventRepository, InsightsService, Period, Priority,
    SqliteEventRepository, SqliteTaskRepository, Task, TaskRepository,
};

const OWNER: &str = "owner-1";

// 2025-06-12 is a Thursday; its week runs 06-09 .. 06-15.
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn service(
    conn: &rusqlite::Connection,
) -> InsightsService<SqliteTaskRepository<'_>, SqliteEventRepository<'_>> {
    InsightsService::new(
        SqliteTaskRepository::new(conn),
        SqliteEventRepository::new(conn),
    )
}

fn seed_completed_task(conn: &rusqlite::Connection, title: &str, priority: Priority, day: u32) {
    let mut task = Task::new(OWNER, title, priority);
    task.complete(at(day, 15));
    SqliteTaskRepository::new(conn).create_task(&task).unwrap();
}

#[test]
fn empty_week_returns_fixed_message() {
    let conn = open_db_in_memory().unwrap();
    let summary = service(&conn)
        .get_activity_summary(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();
    assert_eq!(summary, NO_ACTIVITY_MESSAGE);
}

#[test]
fn summary_counts_tasks_and_events_in_the_window() {
    let conn = open_db_in_memory().unwrap();
    seed_completed_task(&conn, "Ship release build", Priority::High, 9);
    seed_completed_task(&conn, "Ship release notes", Priority::High, 10);
    seed_completed_task(&conn, "Water plants", Priority::Low, 11);

    let events = SqliteEventRepository::new(&conn);
    events
        .create_event(&Event::new(
            OWNER,
            "Team sync",
            at(10, 9),
            at(10, 10),
            EventCategory::Work,
        ))
        .unwrap();

    let summary = service(&conn)
        .get_activity_summary(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();

    assert!(summary.starts_with("You completed 4 items"), "{summary}");
    assert!(summary.contains("3 tasks (mostly high priority)"), "{summary}");
    assert!(summary.contains("1 event (mostly work)"), "{summary}");
    assert!(summary.contains("release"), "{summary}");
}

#[test]
fn unfinished_events_are_excluded() {
    let conn = open_db_in_memory().unwrap();
    let events = SqliteEventRepository::new(&conn);
    // Ends later today, after `now`.
    events
        .create_event(&Event::new(
            OWNER,
            "Evening class",
            at(12, 18),
            at(12, 20),
            EventCategory::Personal,
        ))
        .unwrap();

    let summary = service(&conn)
        .get_activity_summary(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();
    assert_eq!(summary, NO_ACTIVITY_MESSAGE);
}

#[test]
fn completions_outside_the_window_are_excluded() {
    let conn = open_db_in_memory().unwrap();
    // Completed during the previous week.
    seed_completed_task(&conn, "Old chore", Priority::Medium, 3);

    let summary = service(&conn)
        .get_activity_summary(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();
    assert_eq!(summary, NO_ACTIVITY_MESSAGE);
}
