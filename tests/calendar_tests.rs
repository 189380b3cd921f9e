use chrono::{NaiveDate, Weekday};
use staffing_planner::calendar::{WorkCalendar, WorkCalendarConfig};
use staffing_planner::{Period, PlanningError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.is_available(d(2025, 1, 6)));
}

#[test]
fn business_days_per_month() {
    let cal = WorkCalendar::default();
    assert_eq!(cal.business_days(2025, 1).unwrap(), 23);
    assert_eq!(cal.business_days(2025, 2).unwrap(), 20);
    // Leap February
    assert_eq!(cal.business_days(2024, 2).unwrap(), 21);
    assert_eq!(cal.business_days(2025, 6).unwrap(), 21);
}

#[test]
fn invalid_month_is_rejected() {
    let cal = WorkCalendar::default();
    assert!(matches!(
        cal.business_days(2025, 13),
        Err(PlanningError::InvalidInput(_))
    ));
}

#[test]
fn holidays_reduce_business_days() {
    let mut cal = WorkCalendar::default();
    cal.add_holidays(&[d(2025, 1, 1), d(2025, 1, 4)]);
    // The Saturday holiday changes nothing.
    assert_eq!(cal.business_days(2025, 1).unwrap(), 22);
}

#[test]
fn six_day_week() {
    let mut cal = WorkCalendar::default();
    cal.set_working_days(vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ]);
    assert_eq!(cal.working_days_per_week(), 6);
    assert!(cal.is_available(d(2025, 1, 4)));
    assert_eq!(cal.business_days_in(Period::new(2025, 1).unwrap()), 27);
}

#[test]
fn config_round_trip_preserves_calendar() {
    let cal = WorkCalendar::custom(
        [Weekday::Sun, Weekday::Mon, Weekday::Mon],
        [d(2025, 3, 3)],
    )
    .unwrap();
    let config = cal.to_config();
    assert_eq!(config.working_days(), &[Weekday::Mon, Weekday::Sun]);
    assert_eq!(config.holidays(), &[d(2025, 3, 3)]);

    let json = serde_json::to_string(&config).unwrap();
    let parsed: WorkCalendarConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(WorkCalendar::from_config(&parsed), cal);
}

#[test]
fn empty_working_week_is_a_config_error() {
    let err = WorkCalendarConfig::new(Vec::<Weekday>::new(), Vec::new()).unwrap_err();
    assert!(matches!(err, PlanningError::InvalidConfig { .. }));
}
