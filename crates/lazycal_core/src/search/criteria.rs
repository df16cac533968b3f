//! Collaborator-facing search filters.
//!
//! # Responsibility
//! - Parse free-form date/time filter inputs (including `today`).
//! - Resolve them into a UTC search window for the event store.
//!
//! # Invariants
//! - Dates are `YYYY-MM-DD` or the case-insensitive token `today`.
//! - Times are `HH:MM`; a missing start time is `00:00`, a missing end time
//!   is `23:59:59`.
//! - A time given without its date applies to today.

use crate::local_time::local_to_utc;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODAY_TOKEN: &str = "today";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Result type for search criteria resolution.
pub type SearchResult<T> = Result<T, SearchError>;

/// Filter parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    InvalidDate(String),
    InvalidTime(String),
    /// Resolved end lies before the resolved start.
    InvertedRange,
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD or `today`")
            }
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
            Self::InvertedRange => write!(f, "search end must not be before search start"),
        }
    }
}

impl Error for SearchError {}

/// Raw search filters as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub query: String,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
}

impl SearchCriteria {
    /// Text-only search.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Search window resolved to UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSearch {
    pub text: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Resolves `criteria` against local `today` in time zone `tz`.
///
/// # Errors
/// - `InvalidDate` / `InvalidTime` for malformed inputs.
/// - `InvertedRange` when both bounds resolve and end precedes start.
pub fn resolve_criteria<Tz: TimeZone>(
    criteria: &SearchCriteria,
    today: NaiveDate,
    tz: &Tz,
) -> SearchResult<ResolvedSearch> {
    let start = resolve_bound(
        criteria.start_date.as_deref(),
        criteria.start_time.as_deref(),
        NaiveTime::MIN,
        today,
        tz,
    )?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    let end = resolve_bound(
        criteria.end_date.as_deref(),
        criteria.end_time.as_deref(),
        end_of_day,
        today,
        tz,
    )?;

    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(SearchError::InvertedRange);
        }
    }

    Ok(ResolvedSearch {
        text: criteria.query.trim().to_string(),
        start,
        end,
    })
}

fn resolve_bound<Tz: TimeZone>(
    date: Option<&str>,
    time: Option<&str>,
    default_time: NaiveTime,
    today: NaiveDate,
    tz: &Tz,
) -> SearchResult<Option<DateTime<Utc>>> {
    let date = non_blank(date);
    let time = non_blank(time);
    if date.is_none() && time.is_none() {
        return Ok(None);
    }

    let date = match date {
        Some(value) => parse_date(value, today)?,
        None => today,
    };
    let time = match time {
        Some(value) => parse_time(value)?,
        None => default_time,
    };
    Ok(Some(local_to_utc(tz, date.and_time(time))))
}

/// Parses `YYYY-MM-DD` or `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> SearchResult<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case(TODAY_TOKEN) {
        return Ok(today);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| SearchError::InvalidDate(trimmed.to_string()))
}

/// Parses `HH:MM`.
pub fn parse_time(value: &str) -> SearchResult<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| SearchError::InvalidTime(trimmed.to_string()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
