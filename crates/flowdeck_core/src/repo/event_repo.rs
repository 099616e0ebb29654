//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `events` storage.
//! - Serve the owner/date-range queries the insight and kanban engines need.
//!
//! # Invariants
//! - Listing order is deterministic: `start_at ASC, uuid ASC`.
//! - Deleting an event hard-deletes it; dependent kanban cards go with it
//!   via the cascading foreign key.

use crate::insights::period::DateRange;
use crate::model::event::{Event, EventCategory, EventId};
use crate::repo::{parse_date, parse_datetime, parse_uuid, RepoError, RepoResult, DATETIME_FORMAT, DATE_FORMAT};
use rusqlite::{params, Connection, Row};

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    location,
    start_at,
    end_at,
    category,
    notes,
    reminder_minutes,
    recurrence_rule,
    recurrence_end,
    owner_id
FROM events";

/// Repository interface for event persistence.
pub trait EventRepository {
    fn create_event(&self, event: &Event) -> RepoResult<EventId>;
    fn update_event(&self, event: &Event) -> RepoResult<()>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    fn list_events(&self, owner_id: &str) -> RepoResult<Vec<Event>>;
    /// Events whose start date falls inside the inclusive range.
    fn events_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Event>>;
    /// Events whose end date falls inside the inclusive range.
    fn events_ending_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Event>>;
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<EventId> {
        self.conn.execute(
            "INSERT INTO events (
                uuid,
                title,
                location,
                start_at,
                end_at,
                category,
                notes,
                reminder_minutes,
                recurrence_rule,
                recurrence_end,
                owner_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                event.uuid.to_string(),
                event.title.as_str(),
                event.location.as_deref(),
                event.start_at.format(DATETIME_FORMAT).to_string(),
                event.end_at.format(DATETIME_FORMAT).to_string(),
                category_to_db(event.category),
                event.notes.as_deref(),
                event.reminder_minutes,
                event.recurrence_rule.as_deref(),
                event
                    .recurrence_end
                    .map(|value| value.format(DATE_FORMAT).to_string()),
                event.owner_id.as_str(),
            ],
        )?;

        Ok(event.uuid)
    }

    fn update_event(&self, event: &Event) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE events
             SET
                title = ?1,
                location = ?2,
                start_at = ?3,
                end_at = ?4,
                category = ?5,
                notes = ?6,
                reminder_minutes = ?7,
                recurrence_rule = ?8,
                recurrence_end = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?10;",
            params![
                event.title.as_str(),
                event.location.as_deref(),
                event.start_at.format(DATETIME_FORMAT).to_string(),
                event.end_at.format(DATETIME_FORMAT).to_string(),
                category_to_db(event.category),
                event.notes.as_deref(),
                event.reminder_minutes,
                event.recurrence_rule.as_deref(),
                event
                    .recurrence_end
                    .map(|value| value.format(DATE_FORMAT).to_string()),
                event.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(event.uuid));
        }

        Ok(())
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn list_events(&self, owner_id: &str) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY start_at ASC, uuid ASC;"
        ))?;
        let events = collect_events(stmt.query([owner_id])?);
        events
    }

    fn events_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE owner_id = ?1
               AND substr(start_at, 1, 10) >= ?2
               AND substr(start_at, 1, 10) <= ?3
             ORDER BY start_at ASC, uuid ASC;"
        ))?;
        let events = collect_events(stmt.query(params![
            owner_id,
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        ])?);
        events
    }

    fn events_ending_in_range(&self, owner_id: &str, range: DateRange) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE owner_id = ?1
               AND substr(end_at, 1, 10) >= ?2
               AND substr(end_at, 1, 10) <= ?3
             ORDER BY end_at ASC, uuid ASC;"
        ))?;
        let events = collect_events(stmt.query(params![
            owner_id,
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        ])?);
        events
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn collect_events(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Event>> {
    let mut events = Vec::new();
    while let Some(row) = rows.next()? {
        events.push(parse_event_row(row)?);
    }
    Ok(events)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "events.uuid").map_err(RepoError::InvalidData)?;

    let category_text: String = row.get("category")?;
    let category = parse_category(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in events.category"
        ))
    })?;

    let start_text: String = row.get("start_at")?;
    let start_at = parse_datetime(&start_text, "events.start_at").map_err(RepoError::InvalidData)?;
    let end_text: String = row.get("end_at")?;
    let end_at = parse_datetime(&end_text, "events.end_at").map_err(RepoError::InvalidData)?;

    let recurrence_end = match row.get::<_, Option<String>>("recurrence_end")? {
        Some(value) => {
            Some(parse_date(&value, "events.recurrence_end").map_err(RepoError::InvalidData)?)
        }
        None => None,
    };

    Ok(Event {
        uuid,
        title: row.get("title")?,
        location: row.get("location")?,
        start_at,
        end_at,
        category,
        notes: row.get("notes")?,
        reminder_minutes: row.get("reminder_minutes")?,
        recurrence_rule: row.get("recurrence_rule")?,
        recurrence_end,
        owner_id: row.get("owner_id")?,
    })
}

fn category_to_db(category: EventCategory) -> &'static str {
    match category {
        EventCategory::Work => "work",
        EventCategory::Personal => "personal",
        EventCategory::Social => "social",
        EventCategory::Health => "health",
        EventCategory::Other => "other",
    }
}

fn parse_category(value: &str) -> Option<EventCategory> {
    match value {
        "work" => Some(EventCategory::Work),
        "personal" => Some(EventCategory::Personal),
        "social" => Some(EventCategory::Social),
        "health" => Some(EventCategory::Health),
        "other" => Some(EventCategory::Other),
        _ => None,
    }
}
