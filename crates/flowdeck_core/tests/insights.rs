use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use flowdeck_core::db::open_db_in_memory;
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

fn seed_task(
    conn: &rusqlite::Connection,
    title: &str,
    priority: Priority,
    due: NaiveDateTime,
    completed_at: Option<NaiveDateTime>,
) -> Task {
    let mut task = Task::new(OWNER, title, priority);
    task.due_date = Some(due.date());
    task.due_time = Some(due.time());
    if let Some(at) = completed_at {
        task.complete(at);
    }
    SqliteTaskRepository::new(conn).create_task(&task).unwrap();
    task
}

#[test]
fn single_on_time_task_scores_sixty_two_for_day() {
    let conn = open_db_in_memory().unwrap();
    let due = today().and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    seed_task(&conn, "deep work block", Priority::High, due, Some(due));

    let insights = service(&conn)
        .get_insights(OWNER, Period::Day, today(), at(12, 13))
        .unwrap();

    assert_eq!(insights.flow_score.score, 62);
    assert_eq!(insights.flow_score.comparison.period, "last day");
    // Nothing due yesterday, so the whole score is the delta.
    assert_eq!(insights.flow_score.comparison.change, 62);
}

#[test]
fn week_insights_have_seven_completion_buckets() {
    let conn = open_db_in_memory().unwrap();
    seed_task(&conn, "monday task", Priority::Medium, at(9, 10), Some(at(9, 10)));
    seed_task(&conn, "monday open", Priority::Medium, at(9, 15), None);
    seed_task(&conn, "friday task", Priority::Medium, at(13, 10), None);

    let insights = service(&conn)
        .get_insights(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();

    let series = &insights.task_completion;
    assert_eq!(series.len(), 7);
    assert_eq!(series[0].label, "Mon");
    assert_eq!(series[0].total, 2);
    assert_eq!(series[0].completed, 1);
    assert_eq!(series[4].label, "Fri");
    assert_eq!(series[4].total, 1);
    assert_eq!(series[4].completed, 0);
}

#[test]
fn change_compares_against_previous_window() {
    let conn = open_db_in_memory().unwrap();
    // Previous week (06-02..06-08): one completed on-time task.
    seed_task(&conn, "last week done", Priority::Medium, at(3, 10), Some(at(3, 10)));
    // Current week: one open task.
    seed_task(&conn, "this week open", Priority::Medium, at(10, 10), None);

    let insights = service(&conn)
        .get_insights(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();

    assert_eq!(insights.flow_score.score, 0);
    assert!(insights.flow_score.comparison.change < 0);
}

#[test]
fn events_feed_the_flow_score() {
    let conn = open_db_in_memory().unwrap();
    let events = SqliteEventRepository::new(&conn);
    events
        .create_event(&Event::new(
            OWNER,
            "retro",
            at(10, 9),
            at(10, 10),
            EventCategory::Work,
        ))
        .unwrap();

    let insights = service(&conn)
        .get_insights(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();

    // One finished event, week blend: 70 * 0.70 = 49.
    assert_eq!(insights.flow_score.score, 49);
}

#[test]
fn productive_times_reflect_completion_hours() {
    let conn = open_db_in_memory().unwrap();
    // Two completions Monday 14:00, one Tuesday 14:00.
    seed_task(&conn, "a", Priority::Medium, at(9, 10), Some(at(9, 14)));
    seed_task(&conn, "b", Priority::Medium, at(9, 11), Some(at(9, 14)));
    seed_task(&conn, "c", Priority::Medium, at(10, 10), Some(at(10, 14)));

    let insights = service(&conn)
        .get_insights(OWNER, Period::Week, today(), at(12, 9))
        .unwrap();

    let slots = &insights.productive_times;
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].day, 0);
    assert_eq!(slots[0].hour, 14);
    assert!((slots[0].intensity - 1.0).abs() < f64::EPSILON);
    assert!((slots[1].intensity - 0.5).abs() < f64::EPSILON);
}

#[test]
fn insights_serialize_with_stable_field_names() {
    let conn = open_db_in_memory().unwrap();
    let due = today().and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    seed_task(&conn, "deep work block", Priority::High, due, Some(due));

    let insights = service(&conn)
        .get_insights(OWNER, Period::Day, today(), at(12, 13))
        .unwrap();

    let json = serde_json::to_value(&insights).unwrap();
    assert_eq!(json["flow_score"]["score"], 62);
    assert_eq!(json["flow_score"]["comparison"]["period"], "last day");
    assert_eq!(json["task_completion"][0]["label"], "Today");
    assert!(json["productive_times"].is_array());
}

#[test]
fn empty_window_yields_zero_score_not_error() {
    let conn = open_db_in_memory().unwrap();
    let insights = service(&conn)
        .get_insights(OWNER, Period::Month, today(), at(12, 9))
        .unwrap();

    assert_eq!(insights.flow_score.score, 0);
    assert_eq!(insights.flow_score.comparison.change, 0);
    assert!(insights.productive_times.is_empty());
}
