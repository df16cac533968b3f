//! Recurring series expansion.
//!
//! # Responsibility
//! - Turn one authored event into its independent series instances.
//!
//! # Invariants
//! - Output length equals `occurrence_count` (a count of 0 yields one event).
//! - Instance `i` starts `i * frequency_days` local calendar days after the
//!   original; every other field, color included, is copied unchanged.
//! - Expansion performs no validation and no I/O.

use crate::local_time::local_to_utc;
use crate::model::event::Event;
use chrono::{DateTime, Days, TimeZone, Utc};

/// Expands `event` into its series, keeping the local wall-clock time.
///
/// With `occurrence_count <= 1` the result is exactly `[event.clone()]`
/// and `frequency_days` is ignored.
pub fn expand_series<Tz: TimeZone>(event: &Event, tz: &Tz) -> Vec<Event> {
    let count = event.occurrence_count.max(1);
    if count == 1 {
        return vec![event.clone()];
    }

    let local_start = event.time.with_timezone(tz).naive_local();
    (0..count)
        .map(|index| {
            let mut instance = event.clone();
            let offset_days = u64::from(index) * u64::from(event.frequency_days);
            instance.time = match local_start.checked_add_days(Days::new(offset_days)) {
                Some(local) => local_to_utc(tz, local),
                None => shift_utc_days(event.time, offset_days),
            };
            instance
        })
        .collect()
}

fn shift_utc_days(time: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    time.checked_add_days(Days::new(days))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
