//! Core domain logic for LazyCal.
//! This crate is the single source of truth for event invariants.

pub mod calendar;
pub mod config;
pub mod db;
pub mod local_time;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod reminder;
pub mod repo;
pub mod search;
pub mod service;

pub use calendar::{snap_to_half_hour, Calendar, Day, Week};
pub use config::{ConfigError, CoreConfig, ReminderConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::color::EventColor;
pub use model::event::{Event, EventId, EventValidationError};
pub use recurrence::expand_series;
pub use reminder::{due_reminders, ReminderPoller, ReminderSink};
pub use repo::event_repo::{EventRepository, RepoError, RepoResult, SqliteEventRepository};
pub use repo::scratchpad_repo::{Scratchpad, ScratchpadRepository, SqliteScratchpadRepository};
pub use search::criteria::{resolve_criteria, ResolvedSearch, SearchCriteria, SearchError};
pub use service::event_manager::{EventManager, ManagerError, ManagerResult};
pub use service::history::{BoundedStack, UndoAction, UndoError, HISTORY_CAPACITY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
