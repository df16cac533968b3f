//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lazycal_core` linkage.
//! - Exercise one add/undo cycle against an in-memory database.

use chrono::Utc;
use lazycal_core::db::{migrations::latest_version, open_db_in_memory};
use lazycal_core::{Calendar, Event, EventManager, SqliteEventRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lazycal_core ping={}", lazycal_core::ping());
    println!("lazycal_core version={}", lazycal_core::core_version());

    match smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lazycal_core smoke=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    println!("lazycal_core schema_version={}", latest_version());

    let repo = SqliteEventRepository::try_new(&conn)?;
    let mut manager = EventManager::new(repo);
    let calendar = Calendar::now();
    let week = calendar.current_week();

    let probe = Event::new("smoke", Utc::now(), 0.5);
    manager.add_event(&probe)?;
    let visible = manager.events_by_date_range(week.start_date, week.end_date)?;
    manager.undo()?;

    println!(
        "lazycal_core week={}..{} visible_after_add={} remaining_after_undo={}",
        week.start_date,
        week.end_date,
        visible.len(),
        manager.all_events()?.len()
    );
    Ok(())
}
