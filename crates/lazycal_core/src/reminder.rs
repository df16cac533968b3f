//! Background reminder poller.
//!
//! # Responsibility
//! - Periodically look up events whose reminder time has arrived.
//! - Hand due events to a delivery sink (desktop notifications live outside
//!   core).
//!
//! # Invariants
//! - The poller only reads; it never mutates events or history.
//! - It owns a dedicated connection; SQLite locking serializes it against
//!   the foreground writer.
//! - Each `(id, start time)` pair is delivered at most once per poller;
//!   keys older than the poll window are forgotten.
//! - `stop()` (or dropping the handle) ends the thread promptly.

use crate::config::ReminderConfig;
use crate::model::event::{Event, EventId};
use crate::repo::event_repo::{EventRepository, SqliteEventRepository};
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;

const THREAD_NAME: &str = "lazycal-reminders";

/// Receives events whose reminder is due.
pub trait ReminderSink: Send {
    fn notify(&mut self, event: &Event);
}

impl<F> ReminderSink for F
where
    F: FnMut(&Event) + Send,
{
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}

/// Returns events whose reminder instant (`time - lead`) lies within
/// `slack` of `now`, in input order.
pub fn due_reminders(
    events: &[Event],
    now: DateTime<Utc>,
    lead: Duration,
    slack: Duration,
) -> Vec<&Event> {
    events
        .iter()
        .filter(|event| {
            let remind_at = event.time - lead;
            remind_at >= now - slack && remind_at <= now + slack
        })
        .collect()
}

/// Handle to a running reminder thread.
pub struct ReminderPoller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderPoller {
    /// Starts polling on a dedicated thread.
    ///
    /// `conn` must be a migrated connection to the same database the
    /// foreground writer uses (see `db::open_db`).
    ///
    /// # Errors
    /// - Returns the spawn error when the OS refuses to create the thread.
    pub fn spawn<S>(conn: Connection, config: ReminderConfig, sink: S) -> std::io::Result<Self>
    where
        S: ReminderSink + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let mut sink = sink;
                let mut delivered: HashSet<(EventId, i64)> = HashSet::new();
                info!("event=reminder_poller module=reminder status=start");
                loop {
                    poll_once(&conn, &config, &mut sink, &mut delivered);
                    match stop_rx.recv_timeout(config.poll_interval()) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=reminder_poller module=reminder status=stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signals the thread to stop and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=reminder_poller module=reminder status=error error_code=thread_panicked");
            }
        }
    }
}

impl Drop for ReminderPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_once<S: ReminderSink>(
    conn: &Connection,
    config: &ReminderConfig,
    sink: &mut S,
    delivered: &mut HashSet<(EventId, i64)>,
) {
    let now = Utc::now();
    let lead = config.lead();
    let slack = config.slack();

    let repo = match SqliteEventRepository::try_new(conn) {
        Ok(repo) => repo,
        Err(err) => {
            warn!("event=reminder_poll module=reminder status=error error={err}");
            return;
        }
    };
    let window_start = now + lead - slack;
    let window_end = now + lead + slack + Duration::seconds(1);
    let events = match repo.get_by_time_range(window_start, window_end) {
        Ok(events) => events,
        Err(err) => {
            warn!("event=reminder_poll module=reminder status=error error={err}");
            return;
        }
    };

    let mut fired = 0usize;
    for event in due_reminders(&events, now, lead, slack) {
        if delivered.insert((event.id, event.time.timestamp_millis())) {
            sink.notify(event);
            fired += 1;
        }
    }
    prune_delivered(delivered, window_start);
    debug!(
        "event=reminder_poll module=reminder status=ok candidates={} fired={fired} tracked={}",
        events.len(),
        delivered.len()
    );
}

/// Forgets delivered keys whose start lies before `window_start`; those
/// events can never be due again.
fn prune_delivered(delivered: &mut HashSet<(EventId, i64)>, window_start: DateTime<Utc>) {
    let cutoff_ms = window_start.timestamp_millis();
    delivered.retain(|&(_, start_ms)| start_ms >= cutoff_ms);
}
