use chrono::{Datelike, NaiveDate, Weekday};
use schedule_engine::calendar::{CalendarException, CalendarSet, WorkCalendar};
use schedule_engine::error::{CalendarOwner, ScheduleError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2024-01-06 is a Saturday, 2024-01-07 is a Sunday
    assert!(!cal.is_working_day(d(2024, 1, 6)));
    assert!(!cal.is_working_day(d(2024, 1, 7)));
    assert!(cal.is_working_day(d(2024, 1, 1)));
}

#[test]
fn add_working_days_skips_weekend_both_ways() {
    let cal = WorkCalendar::standard();
    let fri = d(2024, 1, 5);
    let next = cal.add_working_days(fri, 1);
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!(next, d(2024, 1, 8));
    assert_eq!(cal.add_working_days(next, -1), fri);
    assert_eq!(cal.add_working_days(d(2024, 1, 1), 4), fri);
}

#[test]
fn zero_offset_leaves_date_alone() {
    let cal = WorkCalendar::standard();
    let sat = d(2024, 1, 6);
    assert_eq!(cal.add_working_days(sat, 0), sat);
    // Any real offset lands on a working day.
    assert_eq!(cal.add_working_days(sat, 1), d(2024, 1, 8));
    assert_eq!(cal.add_working_days(sat, -1), d(2024, 1, 5));
}

#[test]
fn working_days_between_inverts_add() {
    let cal = WorkCalendar::standard();
    let wed = d(2024, 1, 10);
    for n in -12..=12 {
        let moved = cal.add_working_days(wed, n);
        assert_eq!(cal.working_days_between(wed, moved), n, "offset {n}");
    }
}

#[test]
fn holiday_exception_overrides_weekday() {
    let mut cal = WorkCalendar::standard();
    cal.add_holiday(d(2024, 1, 3));
    assert!(!cal.is_working_day(d(2024, 1, 3)));
    assert_eq!(cal.add_working_days(d(2024, 1, 2), 1), d(2024, 1, 4));
    assert_eq!(cal.working_days_between(d(2024, 1, 2), d(2024, 1, 4)), 1);
}

#[test]
fn working_day_exception_opens_a_weekend() {
    let mut cal = WorkCalendar::standard();
    cal.add_exception(CalendarException::working_day(d(2024, 1, 6)).named("catch-up Saturday"));
    assert!(cal.is_working_day(d(2024, 1, 6)));
    assert_eq!(cal.add_working_days(d(2024, 1, 5), 1), d(2024, 1, 6));
    assert!(cal.remove_exception(d(2024, 1, 6)).is_some());
    assert!(!cal.is_working_day(d(2024, 1, 6)));
}

#[test]
fn recurring_holidays_cover_each_year() {
    let mut cal = WorkCalendar::standard();
    cal.add_recurring_holiday(12, 25, 2024, 2026);
    cal.add_recurring_weekday_holiday(11, Weekday::Thu, 4, 2024, 2024);
    assert!(!cal.is_working_day(d(2024, 12, 25)));
    assert!(!cal.is_working_day(d(2026, 12, 25)));
    // Fourth Thursday of November 2024.
    assert!(!cal.is_working_day(d(2024, 11, 28)));
    assert!(cal.is_working_day(d(2024, 11, 21)));
}

#[test]
fn range_and_count_match() {
    let cal = WorkCalendar::default();
    let start = d(2024, 1, 1); // Mon
    let end = d(2024, 1, 12); // Fri of the following week
    let days = cal.working_days_in_range(start, end);
    assert_eq!(days.len() as i64, cal.count_working_days(start, end));
    assert_eq!(days.len(), 10);
    assert_eq!(days.first().copied(), Some(start));
    assert_eq!(days.last().copied(), Some(end));
}

#[test]
fn alignment_returns_working_days() {
    let cal = WorkCalendar::standard();
    assert_eq!(cal.align_forward(d(2024, 1, 6)), d(2024, 1, 8));
    assert_eq!(cal.align_backward(d(2024, 1, 6)), d(2024, 1, 5));
    assert_eq!(cal.align_forward(d(2024, 1, 3)), d(2024, 1, 3));
}

#[test]
fn custom_week_and_round_trip_through_json() {
    let mut cal = WorkCalendar::custom(
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ],
        [d(2024, 1, 1)],
    )
    .unwrap();
    cal.set_name("Site crew");
    assert!(cal.is_working_day(d(2024, 1, 6)));
    assert!(!cal.is_working_day(d(2024, 1, 1)));

    let json = serde_json::to_string(&cal).unwrap();
    let back: WorkCalendar = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cal);
    assert_eq!(back.name(), "Site crew");
}

#[test]
fn empty_work_week_is_rejected() {
    assert!(WorkCalendar::custom([], []).is_err());
    let mut cal = WorkCalendar::standard();
    assert!(cal.set_working_days(&[]).is_err());
    assert!(cal.is_working_day(d(2024, 1, 1)));

    let parsed: Result<WorkCalendar, _> = serde_json::from_str(r#"{"working_days":[]}"#);
    assert!(parsed.is_err());
}

#[test]
fn calendar_set_protects_default() {
    let mut set = CalendarSet::default();
    assert_eq!(set.default_id(), "standard");
    set.insert("night", WorkCalendar::standard());
    assert_eq!(set.len(), 2);
    assert!(set.remove("night").is_ok());
    assert_eq!(
        set.remove("standard"),
        Err(ScheduleError::CalendarInUse {
            calendar_id: "standard".into(),
            owner: CalendarOwner::Project,
        })
    );
    assert_eq!(
        set.set_default("missing"),
        Err(ScheduleError::UnknownCalendar("missing".into()))
    );
}
