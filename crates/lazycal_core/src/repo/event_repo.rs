//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD and query APIs over the `events` table.
//! - Convert caller-local date bounds to UTC before querying.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Event::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Derived colors are never persisted; `color = 0` means unset.
//! - Every list query is ordered by `time_utc_ms ASC, id ASC`.

use crate::db::DbError;
use crate::local_time::local_days_range;
use crate::model::color::EventColor;
use crate::model::event::{Event, EventId, EventValidationError};
use crate::repo::{table_exists, table_has_column};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    location,
    time_utc_ms,
    duration_hours,
    frequency_days,
    occurrence_count,
    color
FROM events";

const EVENT_ORDER_SQL: &str = " ORDER BY time_utc_ms ASC, id ASC";

const REQUIRED_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "description",
    "location",
    "time_utc_ms",
    "duration_hours",
    "frequency_days",
    "occurrence_count",
    "color",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for event persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EventValidationError),
    Db(DbError),
    NotFound(EventId),
    InvalidData(String),
    InvalidArgument(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
            Self::InvalidArgument(message) => write!(f, "invalid query argument: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventValidationError> for RepoError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for event storage.
///
/// Date-based queries interpret their arguments as local calendar dates in
/// the repository's time zone.
pub trait EventRepository {
    /// Inserts a new row and returns the store-assigned id (`event.id` is ignored).
    fn insert(&self, event: &Event) -> RepoResult<EventId>;
    /// Re-inserts a previously persisted event under its original id.
    fn restore(&self, event: &Event) -> RepoResult<EventId>;
    fn get_by_id(&self, id: EventId) -> RepoResult<Option<Event>>;
    fn get_by_date(&self, date: NaiveDate) -> RepoResult<Vec<Event>>;
    fn get_by_month(&self, year: i32, month: u32) -> RepoResult<Vec<Event>>;
    /// Events on local days `start..=end`.
    fn get_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Event>>;
    /// Events starting in the half-open instant range `[start, end)`.
    fn get_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> RepoResult<Vec<Event>>;
    fn get_all(&self) -> RepoResult<Vec<Event>>;
    /// Case-insensitive substring search plus optional inclusive time range.
    ///
    /// Returns an empty list when `text` is blank and no bound is given.
    fn search(
        &self,
        text: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Event>>;
    /// Replaces every column of row `id` with `event`.
    fn update(&self, id: EventId, event: &Event) -> RepoResult<()>;
    fn delete(&self, id: EventId) -> RepoResult<()>;
    /// Deletes every row whose name equals `name` exactly.
    fn delete_by_name(&self, name: &str) -> RepoResult<usize>;
    fn ids_by_name(&self, name: &str) -> RepoResult<Vec<EventId>>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn, Tz: TimeZone = Local> {
    conn: &'conn Connection,
    tz: Tz,
}

impl<'conn> SqliteEventRepository<'conn, Local> {
    /// Constructs a repository using the system local time zone.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_timezone(conn, Local)
    }
}

impl<'conn, Tz: TimeZone> SqliteEventRepository<'conn, Tz> {
    /// Constructs a repository that interprets local dates in `tz`.
    ///
    /// # Errors
    /// - `MissingRequiredTable/Column` when the connection was not migrated.
    pub fn try_with_timezone(conn: &'conn Connection, tz: Tz) -> RepoResult<Self> {
        ensure_event_connection_ready(conn)?;
        Ok(Self { conn, tz })
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    fn query_events(&self, where_sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Event>> {
        let sql = format!("{EVENT_SELECT_SQL} {where_sql}{EVENT_ORDER_SQL};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn query_local_days(&self, first: NaiveDate, last: NaiveDate) -> RepoResult<Vec<Event>> {
        let (start, end) = local_days_range(&self.tz, first, last);
        self.get_by_time_range(start, end)
    }
}

impl<Tz: TimeZone> EventRepository for SqliteEventRepository<'_, Tz> {
    fn insert(&self, event: &Event) -> RepoResult<EventId> {
        event.validate()?;

        self.conn.execute(
            "INSERT INTO events (
                name,
                description,
                location,
                time_utc_ms,
                duration_hours,
                frequency_days,
                occurrence_count,
                color
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                event.name.as_str(),
                event.description.as_str(),
                event.location.as_str(),
                event.time.timestamp_millis(),
                event.duration_hours,
                event.frequency_days,
                event.occurrence_count,
                color_to_db(event.color),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn restore(&self, event: &Event) -> RepoResult<EventId> {
        if event.id <= 0 {
            return Err(RepoError::InvalidArgument(format!(
                "cannot restore event without a persisted id (got {})",
                event.id
            )));
        }
        event.validate()?;

        self.conn.execute(
            "INSERT INTO events (
                id,
                name,
                description,
                location,
                time_utc_ms,
                duration_hours,
                frequency_days,
                occurrence_count,
                color
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                event.id,
                event.name.as_str(),
                event.description.as_str(),
                event.location.as_str(),
                event.time.timestamp_millis(),
                event.duration_hours,
                event.frequency_days,
                event.occurrence_count,
                color_to_db(event.color),
            ],
        )?;

        Ok(event.id)
    }

    fn get_by_id(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut events = self.query_events("WHERE id = ?", vec![Value::Integer(id)])?;
        Ok(events.pop())
    }

    fn get_by_date(&self, date: NaiveDate) -> RepoResult<Vec<Event>> {
        self.query_local_days(date, date)
    }

    fn get_by_month(&self, year: i32, month: u32) -> RepoResult<Vec<Event>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            RepoError::InvalidArgument(format!("invalid month {year}-{month:02}"))
        })?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let last = next_first
            .and_then(|date| date.pred_opt())
            .ok_or_else(|| RepoError::InvalidArgument(format!("month out of range {year}-{month:02}")))?;
        self.query_local_days(first, last)
    }

    fn get_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Event>> {
        if end < start {
            return Ok(Vec::new());
        }
        self.query_local_days(start, end)
    }

    fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Event>> {
        self.query_events(
            "WHERE time_utc_ms >= ? AND time_utc_ms < ?",
            vec![
                Value::Integer(start.timestamp_millis()),
                Value::Integer(end.timestamp_millis()),
            ],
        )
    }

    fn get_all(&self) -> RepoResult<Vec<Event>> {
        self.query_events("", Vec::new())
    }

    fn search(
        &self,
        text: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> RepoResult<Vec<Event>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() && start.is_none() && end.is_none() {
            return Ok(Vec::new());
        }

        let mut where_sql = String::from("WHERE 1 = 1");
        let mut bind_values = Vec::new();
        if let Some(start) = start {
            where_sql.push_str(" AND time_utc_ms >= ?");
            bind_values.push(Value::Integer(start.timestamp_millis()));
        }
        if let Some(end) = end {
            where_sql.push_str(" AND time_utc_ms <= ?");
            bind_values.push(Value::Integer(end.timestamp_millis()));
        }

        let mut events = self.query_events(&where_sql, bind_values)?;
        // SQLite `lower()`/`LIKE` only fold ASCII, so text matching stays here.
        if !needle.is_empty() {
            events.retain(|event| matches_text(event, needle.as_str()));
        }
        Ok(events)
    }

    fn update(&self, id: EventId, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events
             SET
                name = ?1,
                description = ?2,
                location = ?3,
                time_utc_ms = ?4,
                duration_hours = ?5,
                frequency_days = ?6,
                occurrence_count = ?7,
                color = ?8
             WHERE id = ?9;",
            params![
                event.name.as_str(),
                event.description.as_str(),
                event.location.as_str(),
                event.time.timestamp_millis(),
                event.duration_hours,
                event.frequency_days,
                event.occurrence_count,
                color_to_db(event.color),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_by_name(&self, name: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE name = ?1;", [name])?;
        Ok(changed)
    }

    fn ids_by_name(&self, name: &str) -> RepoResult<Vec<EventId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM events WHERE name = ?1 ORDER BY time_utc_ms ASC, id ASC;")?;
        let mut rows = stmt.query([name])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

fn matches_text(event: &Event, needle: &str) -> bool {
    [
        event.name.as_str(),
        event.description.as_str(),
        event.location.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id: EventId = row.get("id")?;

    let time_ms: i64 = row.get("time_utc_ms")?;
    let time = DateTime::<Utc>::from_timestamp_millis(time_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{time_ms}` in events.time_utc_ms (id={id})"
        ))
    })?;

    let frequency_days = parse_count(row.get("frequency_days")?, "frequency_days", id)?;
    let occurrence_count = parse_count(row.get("occurrence_count")?, "occurrence_count", id)?;

    let color = match row.get::<_, i64>("color")? {
        0 => None,
        code => Some(EventColor::from_code(code).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid color `{code}` in events.color (id={id})"))
        })?),
    };

    let event = Event {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        location: row.get("location")?,
        time,
        duration_hours: row.get("duration_hours")?,
        frequency_days,
        occurrence_count,
        color,
    };
    event.validate()?;
    Ok(event)
}

fn parse_count(value: i64, column: &str, id: EventId) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid value `{value}` in events.{column} (id={id})"))
    })
}

fn color_to_db(color: Option<EventColor>) -> i64 {
    color.map_or(0, EventColor::code)
}

fn ensure_event_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "events")? {
        return Err(RepoError::MissingRequiredTable("events"));
    }
    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "events", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "events",
                column,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::matches_text;
    use crate::model::event::Event;
    use chrono::{TimeZone, Utc};

    #[test]
    fn text_match_is_case_insensitive_across_fields() {
        let mut event = Event::new(
            "Dentist",
            Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap(),
            1.0,
        );
        event.location = "Große Straße 4".to_string();
        event.description = "bring X-Ray".to_string();

        assert!(matches_text(&event, "dentist"));
        assert!(matches_text(&event, "straße"));
        assert!(matches_text(&event, "x-ray"));
        assert!(!matches_text(&event, "optician"));
    }
}
