//! Local wall-clock to UTC conversion helpers.
//!
//! # Responsibility
//! - Turn caller-facing local dates/times into UTC instants for queries.
//!
//! # Invariants
//! - Ambiguous local times (DST fall-back) resolve to the earliest instant.
//! - Nonexistent local times (DST spring-forward) move forward to the first
//!   valid instant instead of failing.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const MAX_GAP_PROBE_MINUTES: i64 = 180;

/// Converts a local wall-clock time in `tz` to a UTC instant.
pub fn local_to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
        return resolved.with_timezone(&Utc);
    }

    // Spring-forward gaps are at most a few hours wide.
    let mut probe = local;
    for _ in 0..(MAX_GAP_PROBE_MINUTES / 15) {
        probe += Duration::minutes(15);
        if let Some(resolved) = tz.from_local_datetime(&probe).earliest() {
            return resolved.with_timezone(&Utc);
        }
    }
    local.and_utc()
}

/// UTC instant of local midnight at the start of `date`.
pub fn local_day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(tz, date.and_time(NaiveTime::MIN))
}

/// Half-open UTC range `[start, end)` covering local days `first..=last`.
pub fn local_days_range<Tz: TimeZone>(
    tz: &Tz,
    first: NaiveDate,
    last: NaiveDate,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_day_start(tz, first);
    let end = match last.succ_opt() {
        Some(next) => local_day_start(tz, next),
        None => DateTime::<Utc>::MAX_UTC,
    };
    (start, end)
}

/// Local calendar date of a UTC instant in `tz`.
pub fn local_date<Tz: TimeZone>(tz: &Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::{local_date, local_day_start, local_days_range, local_to_utc};
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    #[test]
    fn day_start_honors_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(
            local_day_start(&tz, date),
            Utc.with_ymd_and_hms(2024, 1, 7, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn days_range_is_half_open_over_inclusive_dates() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let (start, end) = local_days_range(&Utc, first, last);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn local_date_uses_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 1, 8, 3, 0, 0).unwrap();
        assert_eq!(
            local_date(&tz, instant),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        );
    }

    #[test]
    fn utc_zone_is_identity() {
        let naive = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(local_to_utc(&Utc, naive), naive.and_utc());
    }
}
