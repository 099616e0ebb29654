//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `tasks` storage.
//! - Serve the owner/date-range queries the insight and kanban engines need.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Listing order is deterministic: `due_date ASC, uuid ASC`.
//! - Deleting a task hard-deletes it; dependent kanban cards go with it via
//!   the cascading foreign key.

use crate::insights::period::DateRange;
use crate::model::task::{Priority, Task, TaskId};
use crate::repo::{
    bool_to_int, parse_date, parse_datetime, parse_time, parse_uuid, RepoError, RepoResult,
    DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT,
};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    due_date,
    due_time,
    priority,
    completed,
    completed_at,
    recurrence_rule,
    recurrence_end,
    owner_id,
    parent_uuid,
    goal_uuid
FROM tasks";

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, owner_id: &str) -> RepoResult<Vec<Task>>;
    fn list_subtasks(&self, parent_uuid: TaskId) -> RepoResult<Vec<Task>>;
    /// Tasks whose due date falls inside the inclusive range.
    fn tasks_due_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Task>>;
    /// Completed tasks whose completion timestamp falls inside the range.
    fn tasks_completed_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                description,
                due_date,
                due_time,
                priority,
                completed,
                completed_at,
                recurrence_rule,
                recurrence_end,
                owner_id,
                parent_uuid,
                goal_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                task.uuid.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.due_date.map(|value| value.format(DATE_FORMAT).to_string()),
                task.due_time.map(|value| value.format(TIME_FORMAT).to_string()),
                priority_to_db(task.priority),
                bool_to_int(task.completed),
                task.completed_at
                    .map(|value| value.format(DATETIME_FORMAT).to_string()),
                task.recurrence_rule.as_deref(),
                task.recurrence_end
                    .map(|value| value.format(DATE_FORMAT).to_string()),
                task.owner_id.as_str(),
                task.parent_uuid.map(|value| value.to_string()),
                task.goal_uuid.map(|value| value.to_string()),
            ],
        )?;

        Ok(task.uuid)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                due_time = ?4,
                priority = ?5,
                completed = ?6,
                completed_at = ?7,
                recurrence_rule = ?8,
                recurrence_end = ?9,
                parent_uuid = ?10,
                goal_uuid = ?11,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?12;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.due_date.map(|value| value.format(DATE_FORMAT).to_string()),
                task.due_time.map(|value| value.format(TIME_FORMAT).to_string()),
                priority_to_db(task.priority),
                bool_to_int(task.completed),
                task.completed_at
                    .map(|value| value.format(DATETIME_FORMAT).to_string()),
                task.recurrence_rule.as_deref(),
                task.recurrence_end
                    .map(|value| value.format(DATE_FORMAT).to_string()),
                task.parent_uuid.map(|value| value.to_string()),
                task.goal_uuid.map(|value| value.to_string()),
                task.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.uuid));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, owner_id: &str) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY due_date ASC, uuid ASC;"
        ))?;
        let tasks = collect_tasks(stmt.query([owner_id])?);
        tasks
    }

    fn list_subtasks(&self, parent_uuid: TaskId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE parent_uuid = ?1
             ORDER BY due_date ASC, uuid ASC;"
        ))?;
        let tasks = collect_tasks(stmt.query([parent_uuid.to_string()])?);
        tasks
    }

    fn tasks_due_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE owner_id = ?1
               AND due_date IS NOT NULL
               AND due_date >= ?2
               AND due_date <= ?3
             ORDER BY due_date ASC, uuid ASC;"
        ))?;
        let tasks = collect_tasks(stmt.query(params![
            owner_id,
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        ])?);
        tasks
    }

    fn tasks_completed_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Task>> {
        // ISO-8601 text compares lexicographically, so the date prefix of
        // `completed_at` can be ranged directly.
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE owner_id = ?1
               AND completed = 1
               AND completed_at IS NOT NULL
               AND substr(completed_at, 1, 10) >= ?2
               AND substr(completed_at, 1, 10) <= ?3
             ORDER BY completed_at ASC, uuid ASC;"
        ))?;
        let tasks = collect_tasks(stmt.query(params![
            owner_id,
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        ])?);
        tasks
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn collect_tasks(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Task>> {
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "tasks.uuid").map_err(RepoError::InvalidData)?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in tasks.priority"))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_date(&value, "tasks.due_date").map_err(RepoError::InvalidData)?),
        None => None,
    };
    let due_time = match row.get::<_, Option<String>>("due_time")? {
        Some(value) => Some(parse_time(&value, "tasks.due_time").map_err(RepoError::InvalidData)?),
        None => None,
    };
    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(value) => {
            Some(parse_datetime(&value, "tasks.completed_at").map_err(RepoError::InvalidData)?)
        }
        None => None,
    };
    let recurrence_end = match row.get::<_, Option<String>>("recurrence_end")? {
        Some(value) => {
            Some(parse_date(&value, "tasks.recurrence_end").map_err(RepoError::InvalidData)?)
        }
        None => None,
    };
    let parent_uuid = match row.get::<_, Option<String>>("parent_uuid")? {
        Some(value) => {
            Some(parse_uuid(&value, "tasks.parent_uuid").map_err(RepoError::InvalidData)?)
        }
        None => None,
    };
    let goal_uuid = match row.get::<_, Option<String>>("goal_uuid")? {
        Some(value) => Some(parse_uuid(&value, "tasks.goal_uuid").map_err(RepoError::InvalidData)?),
        None => None,
    };

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let task = Task {
        uuid,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date,
        due_time,
        priority,
        completed,
        completed_at,
        recurrence_rule: row.get("recurrence_rule")?,
        recurrence_end,
        owner_id: row.get("owner_id")?,
        parent_uuid,
        goal_uuid,
    };
    task.validate()?;
    Ok(task)
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "high" => Some(Priority::High),
        "medium" => Some(Priority::Medium),
        "low" => Some(Priority::Low),
        _ => None,
    }
}
