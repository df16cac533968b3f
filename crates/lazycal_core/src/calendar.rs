//! Calendar cursor and week window.
//!
//! # Responsibility
//! - Track the current-day cursor used by every calendar view.
//! - Derive the Sunday-to-Saturday week window around the cursor.
//! - Provide date/time navigation independent of persistence.
//!
//! # Invariants
//! - After any mutation `week.end_date == week.start_date + 6 days` and
//!   `week.start_date` is a Sunday.
//! - The cursor is always snapped to a half-hour boundary and lies inside
//!   the week window.

use crate::local_time::local_date;
use crate::model::event::Event;
use chrono::{
    Datelike, Days, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike,
};

const DAYS_PER_WEEK: u64 = 7;
const SLOT_MINUTES: i64 = 30;

/// One local calendar day and the events starting on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub date: NaiveDate,
    pub events: Vec<Event>,
}

impl Day {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }
}

/// Seven consecutive days starting on a Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct Week {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<Day>,
}

impl Week {
    /// Builds the Sunday-to-Saturday window containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let back = u64::from(date.weekday().num_days_from_sunday());
        let start_date = date.checked_sub_days(Days::new(back)).unwrap_or(date);
        let days: Vec<Day> = start_date
            .iter_days()
            .take(DAYS_PER_WEEK as usize)
            .map(Day::empty)
            .collect();
        let end_date = days.last().map_or(start_date, |day| day.date);
        Self {
            start_date,
            end_date,
            days,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Snaps to the nearest half hour: minutes `0..=14` round down to `:00`,
/// `15..=44` go to `:30`, `45..=59` round up to the next hour.
pub fn snap_to_half_hour(time: NaiveDateTime) -> NaiveDateTime {
    let minute = time.minute();
    let hour_start = time
        .date()
        .and_time(NaiveTime::from_hms_opt(time.hour(), 0, 0).unwrap_or(NaiveTime::MIN));
    let offset = match minute {
        0..=14 => return hour_start,
        15..=44 => Duration::minutes(SLOT_MINUTES),
        _ => Duration::hours(1),
    };
    hour_start.checked_add_signed(offset).unwrap_or(hour_start)
}

/// Current-day cursor plus its derived week window.
#[derive(Debug, Clone)]
pub struct Calendar {
    current_day: NaiveDateTime,
    current_week: Week,
}

impl Calendar {
    /// Creates a calendar positioned at `cursor` (snapped to a half hour).
    pub fn new(cursor: NaiveDateTime) -> Self {
        let mut calendar = Self {
            current_day: cursor,
            current_week: Week::containing(cursor.date()),
        };
        calendar.update_week();
        calendar
    }

    /// Creates a calendar positioned at the local wall-clock time.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn current_day(&self) -> NaiveDateTime {
        self.current_day
    }

    pub fn current_week(&self) -> &Week {
        &self.current_week
    }

    /// Snaps the cursor to the nearest half hour.
    pub fn round_time(&mut self) {
        self.current_day = snap_to_half_hour(self.current_day);
    }

    /// Rounds the cursor and rebuilds the week window around it.
    ///
    /// Rounding runs first so a cursor at Saturday 23:50 lands on the next
    /// week's Sunday together with its window.
    pub fn update_week(&mut self) {
        self.round_time();
        self.current_week = Week::containing(self.current_day.date());
    }

    pub fn next_day(&mut self) {
        self.shift_days(1, true);
    }

    pub fn prev_day(&mut self) {
        self.shift_days(1, false);
    }

    pub fn next_week(&mut self) {
        self.shift_days(DAYS_PER_WEEK, true);
    }

    pub fn prev_week(&mut self) {
        self.shift_days(DAYS_PER_WEEK, false);
    }

    /// Moves the cursor forward by one 30-minute slot.
    pub fn next_time_slot(&mut self) {
        self.shift(Duration::minutes(SLOT_MINUTES));
    }

    /// Moves the cursor back by one 30-minute slot.
    pub fn prev_time_slot(&mut self) {
        self.shift(Duration::minutes(-SLOT_MINUTES));
    }

    /// Jumps to day 1 of the next month, keeping the time of day.
    pub fn next_month(&mut self) {
        self.jump_month(true);
    }

    /// Jumps to day 1 of the previous month, keeping the time of day.
    pub fn prev_month(&mut self) {
        self.jump_month(false);
    }

    /// Moves the cursor to the local wall-clock time.
    pub fn jump_to_now(&mut self) {
        self.jump_to(Local::now().naive_local());
    }

    /// Moves the cursor to `now`, rounded to the nearest half hour.
    pub fn jump_to(&mut self, now: NaiveDateTime) {
        self.current_day = now;
        self.update_week();
    }

    /// Moves to `date`, keeping the time of day.
    pub fn goto_date(&mut self, date: NaiveDate) {
        self.current_day = date.and_time(self.current_day.time());
        self.update_week();
    }

    /// Moves to `time` on the current date.
    pub fn goto_time(&mut self, time: NaiveTime) {
        self.current_day = self.current_day.date().and_time(time);
        self.update_week();
    }

    /// Returns the window day matching `time`'s date.
    ///
    /// `None` means `time` lies outside the current week.
    pub fn day_for(&self, time: NaiveDateTime) -> Option<&Day> {
        let date = time.date();
        self.current_week.days.iter().find(|day| day.date == date)
    }

    /// Replaces the window's events with `events`, bucketed by their local
    /// start date in `tz`. Events outside the window are ignored.
    pub fn fill_events<Tz: TimeZone>(&mut self, events: &[Event], tz: &Tz) {
        for day in &mut self.current_week.days {
            day.events.clear();
        }
        for event in events {
            let date = local_date(tz, event.time);
            if let Some(day) = self
                .current_week
                .days
                .iter_mut()
                .find(|day| day.date == date)
            {
                day.events.push(event.clone());
            }
        }
        for day in &mut self.current_week.days {
            day.events.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        }
    }

    fn shift(&mut self, delta: Duration) {
        if let Some(moved) = self.current_day.checked_add_signed(delta) {
            self.current_day = moved;
        }
        self.update_week();
    }

    fn shift_days(&mut self, days: u64, forward: bool) {
        let moved = if forward {
            self.current_day.checked_add_days(Days::new(days))
        } else {
            self.current_day.checked_sub_days(Days::new(days))
        };
        if let Some(moved) = moved {
            self.current_day = moved;
        }
        self.update_week();
    }

    fn jump_month(&mut self, forward: bool) {
        let first = self.current_day.date().with_day(1);
        let target = first.and_then(|date| {
            if forward {
                date.checked_add_months(Months::new(1))
            } else {
                date.checked_sub_months(Months::new(1))
            }
        });
        if let Some(date) = target {
            self.current_day = date.and_time(self.current_day.time());
        }
        self.update_week();
    }
}
