use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lazycal_core::db::open_db_in_memory;
use lazycal_core::{
    Event, EventColor, EventRepository, EventValidationError, RepoError, SqliteEventRepository,
};

fn utc(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hh, mm, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn event(name: &str, time: DateTime<Utc>) -> Event {
    Event::new(name, time, 1.0)
}

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let mut original = event("Dentist", utc(2024, 2, 3, 14, 30));
    original.description = "annual check".to_string();
    original.location = "Main St 5".to_string();
    original.duration_hours = 1.5;
    original.color = Some(EventColor::Blue);
    let id = repo.insert(&original).unwrap();
    assert!(id > 0);

    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, Event { id, ..original });
}

#[test]
fn unset_color_stays_unset_and_derives_from_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let id = repo.insert(&event("Gym", utc(2024, 2, 3, 7, 0))).unwrap();
    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.color, None);
    assert_eq!(loaded.color(), EventColor::from_name("Gym"));

    let stored: i64 = conn
        .query_row("SELECT color FROM events WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, 0);
}

#[test]
fn ids_increase_and_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let first = repo.insert(&event("a", utc(2024, 1, 1, 9, 0))).unwrap();
    let second = repo.insert(&event("b", utc(2024, 1, 1, 10, 0))).unwrap();
    repo.delete(second).unwrap();
    let third = repo.insert(&event("c", utc(2024, 1, 1, 11, 0))).unwrap();

    assert!(second > first);
    assert!(third > second);
}

#[test]
fn insert_rejects_invalid_events() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let mut bad = event("Too long", utc(2024, 1, 1, 9, 0));
    bad.duration_hours = 0.75;
    let err = repo.insert(&bad).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(EventValidationError::InvalidDuration(_))
    ));

    let blank = event("  ", utc(2024, 1, 1, 9, 0));
    assert!(matches!(
        repo.insert(&blank).unwrap_err(),
        RepoError::Validation(EventValidationError::EmptyName)
    ));
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn update_replaces_full_row_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let id = repo.insert(&event("Draft", utc(2024, 1, 1, 9, 0))).unwrap();
    let mut replacement = event("Final", utc(2024, 1, 2, 15, 0));
    replacement.location = "Office".to_string();
    replacement.color = Some(EventColor::Red);
    repo.update(id, &replacement).unwrap();

    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, Event { id, ..replacement.clone() });

    let err = repo.update(id + 100, &replacement).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id + 100));
}

#[test]
fn delete_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    assert!(matches!(repo.delete(42).unwrap_err(), RepoError::NotFound(42)));
}

#[test]
fn restore_keeps_original_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let id = repo.insert(&event("Lunch", utc(2024, 1, 1, 12, 0))).unwrap();
    let stored = repo.get_by_id(id).unwrap().unwrap();
    repo.delete(id).unwrap();

    assert_eq!(repo.restore(&stored).unwrap(), id);
    assert_eq!(repo.get_by_id(id).unwrap(), Some(stored.clone()));

    let unsaved = event("Unsaved", utc(2024, 1, 1, 12, 0));
    assert!(matches!(
        repo.restore(&unsaved).unwrap_err(),
        RepoError::InvalidArgument(_)
    ));
    assert!(matches!(repo.restore(&stored).unwrap_err(), RepoError::Db(_)));
}

#[test]
fn date_queries_are_ordered_and_bounded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    repo.insert(&event("late", utc(2024, 3, 10, 18, 0))).unwrap();
    repo.insert(&event("early", utc(2024, 3, 10, 8, 0))).unwrap();
    repo.insert(&event("midnight", utc(2024, 3, 11, 0, 0))).unwrap();
    repo.insert(&event("april", utc(2024, 4, 1, 9, 0))).unwrap();
    repo.insert(&event("feb", utc(2024, 2, 29, 23, 30))).unwrap();

    let names = |events: Vec<Event>| -> Vec<String> {
        events.into_iter().map(|event| event.name).collect()
    };

    assert_eq!(
        names(repo.get_by_date(date(2024, 3, 10)).unwrap()),
        vec!["early", "late"]
    );
    assert_eq!(
        names(repo.get_by_date_range(date(2024, 3, 10), date(2024, 3, 11)).unwrap()),
        vec!["early", "late", "midnight"]
    );
    assert!(repo
        .get_by_date_range(date(2024, 3, 11), date(2024, 3, 10))
        .unwrap()
        .is_empty());
    assert_eq!(
        names(repo.get_by_month(2024, 3).unwrap()),
        vec!["early", "late", "midnight"]
    );
    assert_eq!(names(repo.get_by_month(2024, 2).unwrap()), vec!["feb"]);
    assert_eq!(
        names(repo.get_all().unwrap()),
        vec!["feb", "early", "late", "midnight", "april"]
    );
}

#[test]
fn december_month_query_and_invalid_month() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    repo.insert(&event("nye", utc(2023, 12, 31, 22, 0))).unwrap();
    repo.insert(&event("new year", utc(2024, 1, 1, 0, 0))).unwrap();

    let december = repo.get_by_month(2023, 12).unwrap();
    assert_eq!(december.len(), 1);
    assert_eq!(december[0].name, "nye");

    assert!(matches!(
        repo.get_by_month(2024, 13).unwrap_err(),
        RepoError::InvalidArgument(_)
    ));
}

#[test]
fn local_date_bounds_are_converted_to_utc() {
    let conn = open_db_in_memory().unwrap();
    let tz = FixedOffset::east_opt(9 * 3600).unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, tz).unwrap();

    // 2024-05-01 20:00 UTC is 2024-05-02 05:00 at UTC+9.
    repo.insert(&event("morning", utc(2024, 5, 1, 20, 0))).unwrap();

    assert!(repo.get_by_date(date(2024, 5, 1)).unwrap().is_empty());
    let local_day = repo.get_by_date(date(2024, 5, 2)).unwrap();
    assert_eq!(local_day.len(), 1);
    assert_eq!(local_day[0].time, utc(2024, 5, 1, 20, 0));
}

#[test]
fn search_matches_text_case_insensitively_with_optional_range() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let mut yoga = event("Yoga", utc(2024, 1, 2, 7, 0));
    yoga.location = "Studio North".to_string();
    repo.insert(&yoga).unwrap();
    let mut review = event("Code review", utc(2024, 1, 5, 15, 0));
    review.description = "north wing meeting room".to_string();
    repo.insert(&review).unwrap();
    repo.insert(&event("Groceries", utc(2024, 1, 9, 18, 0))).unwrap();

    let hits = repo.search("NORTH", None, None).unwrap();
    assert_eq!(hits.len(), 2);

    let hits = repo
        .search("north", Some(utc(2024, 1, 3, 0, 0)), None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Code review");

    let ranged = repo
        .search("", Some(utc(2024, 1, 5, 15, 0)), Some(utc(2024, 1, 9, 18, 0)))
        .unwrap();
    assert_eq!(ranged.len(), 2, "range bounds are inclusive");

    assert!(repo.search("   ", None, None).unwrap().is_empty());
    assert!(repo.search("dentist", None, None).unwrap().is_empty());
}

#[test]
fn delete_by_name_matches_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    repo.insert(&event("Standup", utc(2024, 1, 8, 9, 0))).unwrap();
    repo.insert(&event("Standup", utc(2024, 1, 9, 9, 0))).unwrap();
    repo.insert(&event("standup", utc(2024, 1, 10, 9, 0))).unwrap();
    repo.insert(&event("Standup retro", utc(2024, 1, 11, 9, 0))).unwrap();

    assert_eq!(repo.ids_by_name("Standup").unwrap().len(), 2);
    assert_eq!(repo.delete_by_name("Standup").unwrap(), 2);
    assert_eq!(repo.delete_by_name("Standup").unwrap(), 0);
    assert_eq!(repo.get_all().unwrap().len(), 2);
}

#[test]
fn corrupt_color_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEventRepository::try_with_timezone(&conn, Utc).unwrap();

    let id = repo.insert(&event("Paint", utc(2024, 1, 1, 9, 0))).unwrap();
    conn.execute("UPDATE events SET color = 42 WHERE id = ?1;", [id])
        .unwrap();

    assert!(matches!(
        repo.get_by_id(id).unwrap_err(),
        RepoError::InvalidData(_)
    ));
}
