//! Event use-case service with undo/redo.
//!
//! # Responsibility
//! - Provide the mutation surface used by calendar screens.
//! - Record every successful mutation as a reversible `UndoAction`.
//! - Forward read queries to the repository unchanged.
//!
//! # Invariants
//! - Each history stack holds at most `HISTORY_CAPACITY` entries.
//! - Every successful mutation clears the redo stack; undo/redo replay never
//!   records new history.
//! - Series insertion is all-or-nothing.
//! - `BulkDelete` entries cannot be replayed and report
//!   `UndoError::UnsupportedBulkOperation`.
//! - A replayed entry whose row is already gone is discarded, so history
//!   below a bulk delete stays reachable.

use crate::local_time::local_date;
use crate::model::event::{Event, EventId, EventValidationError};
use crate::recurrence::expand_series;
use crate::repo::event_repo::{EventRepository, RepoError};
use crate::search::criteria::{resolve_criteria, SearchCriteria, SearchError};
use crate::service::history::{BoundedStack, UndoAction, UndoError, HISTORY_CAPACITY};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors surfaced by [`EventManager`].
#[derive(Debug)]
pub enum ManagerError {
    Validation(EventValidationError),
    NotFound(EventId),
    Repo(RepoError),
    Search(SearchError),
    History(UndoError),
    /// A series insert failed; every instance inserted before the failure
    /// was removed again.
    SeriesAborted {
        attempted: usize,
        persisted_before_failure: usize,
        source: Box<ManagerError>,
    },
}

impl ManagerError {
    /// `true` for conditions callers usually swallow silently
    /// (nothing to undo/redo).
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            Self::History(UndoError::NothingToUndo | UndoError::NothingToRedo)
        )
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::SeriesAborted {
                attempted,
                persisted_before_failure,
                source,
            } => write!(
                f,
                "series insert failed after {persisted_before_failure} of {attempted} instances and was rolled back: {source}"
            ),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::History(err) => Some(err),
            Self::SeriesAborted { source, .. } => Some(source.as_ref()),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<EventValidationError> for ManagerError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SearchError> for ManagerError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<UndoError> for ManagerError {
    fn from(value: UndoError) -> Self {
        Self::History(value)
    }
}

/// Event service facade owning the undo/redo history.
pub struct EventManager<R: EventRepository, Tz: TimeZone = Local> {
    repo: R,
    tz: Tz,
    undo_stack: BoundedStack<UndoAction>,
    redo_stack: BoundedStack<UndoAction>,
}

impl<R: EventRepository> EventManager<R, Local> {
    /// Creates a manager that resolves local dates in the system zone.
    pub fn new(repo: R) -> Self {
        Self::with_timezone(repo, Local)
    }
}

impl<R: EventRepository, Tz: TimeZone> EventManager<R, Tz> {
    /// Creates a manager that resolves local dates in `tz`.
    ///
    /// `tz` should match the zone the repository was built with.
    pub fn with_timezone(repo: R, tz: Tz) -> Self {
        Self {
            repo,
            tz,
            undo_stack: BoundedStack::new(HISTORY_CAPACITY),
            redo_stack: BoundedStack::new(HISTORY_CAPACITY),
        }
    }

    /// Inserts one event and returns the persisted row.
    pub fn add_event(&mut self, event: &Event) -> ManagerResult<Event> {
        event.validate()?;
        let id = self.repo.insert(event)?;
        let persisted = self.reload(id)?;
        self.record(UndoAction::Add {
            after: persisted.clone(),
        });
        info!("event=event_add module=manager status=ok id={id}");
        Ok(persisted)
    }

    /// Expands `template` into its series and persists every instance.
    ///
    /// # Contract
    /// - All-or-nothing: a failing insert removes the instances already
    ///   written and leaves history untouched.
    /// - On success each instance gets its own `Add` history entry.
    pub fn add_event_series(&mut self, template: &Event) -> ManagerResult<Vec<Event>> {
        template.validate()?;
        let instances = expand_series(template, &self.tz);
        let attempted = instances.len();
        let mut persisted = Vec::with_capacity(attempted);

        for instance in &instances {
            let inserted = self
                .repo
                .insert(instance)
                .map_err(ManagerError::from)
                .and_then(|id| self.reload(id));
            match inserted {
                Ok(event) => persisted.push(event),
                Err(err) => {
                    let persisted_before_failure = persisted.len();
                    self.rollback_series(&persisted);
                    warn!(
                        "event=event_series_add module=manager status=error attempted={attempted} persisted_before_failure={persisted_before_failure} error={err}"
                    );
                    return Err(ManagerError::SeriesAborted {
                        attempted,
                        persisted_before_failure,
                        source: Box::new(err),
                    });
                }
            }
        }

        for event in &persisted {
            self.record(UndoAction::Add {
                after: event.clone(),
            });
        }
        info!("event=event_series_add module=manager status=ok count={attempted}");
        Ok(persisted)
    }

    /// Deletes one event. Missing ids are a silent no-op.
    pub fn delete_event(&mut self, id: EventId) -> ManagerResult<()> {
        let Some(before) = self.repo.get_by_id(id)? else {
            debug!("event=event_delete module=manager status=noop id={id}");
            return Ok(());
        };
        self.repo.delete(id)?;
        self.record(UndoAction::Delete { before });
        info!("event=event_delete module=manager status=ok id={id}");
        Ok(())
    }

    /// Replaces every field of row `id` and returns the stored result.
    pub fn update_event(&mut self, id: EventId, event: &Event) -> ManagerResult<Event> {
        event.validate()?;
        let before = self.repo.get_by_id(id)?.ok_or(ManagerError::NotFound(id))?;
        self.repo.update(id, event)?;
        let after = self.reload(id)?;
        self.record(UndoAction::Edit {
            before,
            after: after.clone(),
        });
        info!("event=event_update module=manager status=ok id={id}");
        Ok(after)
    }

    /// Deletes every event named exactly `name`; returns the deleted count.
    ///
    /// The history entry keeps ids only, so it cannot be undone.
    pub fn delete_events_by_name(&mut self, name: &str) -> ManagerResult<usize> {
        let ids = self.repo.ids_by_name(name)?;
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.repo.delete_by_name(name)?;
        self.record(UndoAction::BulkDelete {
            name: name.to_string(),
            ids,
        });
        info!("event=event_bulk_delete module=manager status=ok count={deleted}");
        Ok(deleted)
    }

    /// Reverts the most recent action.
    ///
    /// # Errors
    /// - `History(NothingToUndo)` when there is no history.
    /// - `History(UnsupportedBulkOperation)` for bulk deletes; the entry
    ///   still moves to the redo stack so older history stays reachable.
    /// - `NotFound` when the row the entry targets is already gone (e.g.
    ///   removed by a later bulk delete); the stale entry is discarded.
    /// - Other repository errors; the entry then stays on the undo stack.
    pub fn undo(&mut self) -> ManagerResult<()> {
        let action = self.undo_stack.pop().ok_or(UndoError::NothingToUndo)?;
        let result = self.apply_inverse(&action);
        let settlement = Settlement::of(&result);
        match settlement {
            Settlement::Moved => {
                self.redo_stack.push(action.clone());
            }
            Settlement::Kept => {
                self.undo_stack.push(action.clone());
            }
            Settlement::Dropped => {}
        }
        log_replay("undo", &action, settlement, &result);
        result
    }

    /// Re-applies the most recently undone action.
    ///
    /// Error handling mirrors [`EventManager::undo`].
    pub fn redo(&mut self) -> ManagerResult<()> {
        let action = self.redo_stack.pop().ok_or(UndoError::NothingToRedo)?;
        let result = self.apply_forward(&action);
        let settlement = Settlement::of(&result);
        match settlement {
            Settlement::Moved => {
                self.undo_stack.push(action.clone());
            }
            Settlement::Kept => {
                self.redo_stack.push(action.clone());
            }
            Settlement::Dropped => {}
        }
        log_replay("redo", &action, settlement, &result);
        result
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the action `undo()` would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.peek().map(UndoAction::describe)
    }

    /// Label of the action `redo()` would re-apply.
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.peek().map(UndoAction::describe)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn get_event(&self, id: EventId) -> ManagerResult<Option<Event>> {
        Ok(self.repo.get_by_id(id)?)
    }

    pub fn events_by_date(&self, date: NaiveDate) -> ManagerResult<Vec<Event>> {
        Ok(self.repo.get_by_date(date)?)
    }

    pub fn events_by_month(&self, year: i32, month: u32) -> ManagerResult<Vec<Event>> {
        Ok(self.repo.get_by_month(year, month)?)
    }

    pub fn events_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ManagerResult<Vec<Event>> {
        Ok(self.repo.get_by_date_range(start, end)?)
    }

    pub fn all_events(&self) -> ManagerResult<Vec<Event>> {
        Ok(self.repo.get_all()?)
    }

    pub fn search(
        &self,
        text: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ManagerResult<Vec<Event>> {
        Ok(self.repo.search(text, start, end)?)
    }

    /// Searches using user-entered filters; `today` resolves in the
    /// manager's time zone.
    pub fn search_with_filters(&self, criteria: &SearchCriteria) -> ManagerResult<Vec<Event>> {
        let today = local_date(&self.tz, Utc::now());
        let resolved = resolve_criteria(criteria, today, &self.tz)?;
        self.search(resolved.text.as_str(), resolved.start, resolved.end)
    }

    /// Borrows the underlying repository for reads not wrapped here.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn reload(&self, id: EventId) -> ManagerResult<Event> {
        self.repo.get_by_id(id)?.ok_or(ManagerError::NotFound(id))
    }

    fn record(&mut self, action: UndoAction) {
        self.redo_stack.clear();
        if let Some(evicted) = self.undo_stack.push(action) {
            debug!(
                "event=history_evict module=manager kind={} capacity={}",
                evicted.kind(),
                self.undo_stack.capacity()
            );
        }
    }

    fn rollback_series(&self, persisted: &[Event]) {
        for event in persisted {
            if let Err(err) = self.repo.delete(event.id) {
                warn!(
                    "event=event_series_rollback module=manager status=error id={} error={}",
                    event.id, err
                );
            }
        }
    }

    fn apply_inverse(&self, action: &UndoAction) -> ManagerResult<()> {
        match action {
            UndoAction::Add { after } => self.repo.delete(after.id)?,
            UndoAction::Delete { before } => {
                self.repo.restore(before)?;
            }
            UndoAction::Edit { before, .. } => self.repo.update(before.id, before)?,
            UndoAction::BulkDelete { .. } => {
                return Err(UndoError::UnsupportedBulkOperation.into());
            }
        }
        Ok(())
    }

    fn apply_forward(&self, action: &UndoAction) -> ManagerResult<()> {
        match action {
            UndoAction::Add { after } => {
                self.repo.restore(after)?;
            }
            UndoAction::Delete { before } => self.repo.delete(before.id)?,
            UndoAction::Edit { after, .. } => self.repo.update(after.id, after)?,
            UndoAction::BulkDelete { .. } => {
                return Err(UndoError::UnsupportedBulkOperation.into());
            }
        }
        Ok(())
    }
}

/// Where a replayed history entry goes once its replay finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    /// Applied (or a bulk entry): moves to the opposite stack.
    Moved,
    /// Transient failure: stays on its stack for a retry.
    Kept,
    /// The target row no longer exists: the entry can never apply again.
    Dropped,
}

impl Settlement {
    fn of(result: &ManagerResult<()>) -> Self {
        match result {
            Ok(()) | Err(ManagerError::History(UndoError::UnsupportedBulkOperation)) => {
                Self::Moved
            }
            Err(ManagerError::NotFound(_)) => Self::Dropped,
            Err(_) => Self::Kept,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Moved => "moved",
            Self::Kept => "kept",
            Self::Dropped => "dropped",
        }
    }
}

fn log_replay(
    direction: &str,
    action: &UndoAction,
    settlement: Settlement,
    result: &ManagerResult<()>,
) {
    match result {
        Ok(()) => info!(
            "event=history_{direction} module=manager status=ok kind={}",
            action.kind()
        ),
        Err(err) => warn!(
            "event=history_{direction} module=manager status=error kind={} entry={} error={err}",
            action.kind(),
            settlement.as_str()
        ),
    }
}
