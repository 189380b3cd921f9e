use chrono::NaiveDate;
use staffing_planner::intraday::dominant_period;
use staffing_planner::tables::{read_aht_table, read_events, read_volume_table};
use staffing_planner::{
    BulkPlan, ErrorKind, Period, PlanningConfig, PlanningError, Planner, RawEvent, Tier,
};

const VOLUME: &str = "\
period,primary_email,primary_chat,secondary_email,secondary_chat
2025-01,9000,3000,400,100
";

const AHT: &str = "\
period,primary_email,primary_chat,secondary_email,secondary_chat
2025-01,600,300,1800,1200
";

const EVENTS: &str = "\
timestamp,team,subject
2025-01-06 09:15:00,FLS Email,a
2025-01-06 09:40:00,FLS Chat,b
2025-01-06 10:05:00,FLS Email,c
2025-01-06 14:30:00,SLS Escalation,d
2025-01-07 09:05:00,FLS Email,e
2025-01-07 23:59:00,L2 Billing,f
2025-01-08T00:10:00,FLS Chat,g
";

fn setup() -> (Planner, BulkPlan) {
    let planner = Planner::new(PlanningConfig::default()).unwrap();
    let volume = read_volume_table(VOLUME.as_bytes()).unwrap();
    let aht = read_aht_table(AHT.as_bytes()).unwrap();
    let bulk = planner.aggregate(&volume, &aht).unwrap();
    (planner, bulk)
}

#[test]
fn arrival_rates_reproduce_event_counts() {
    let (planner, bulk) = setup();
    let events = read_events(EVENTS.as_bytes()).unwrap();
    let plan = planner.disaggregate(&events, &bulk).unwrap();

    assert_eq!(plan.period, Period::new(2025, 1).unwrap());
    assert_eq!(plan.observed_days, 3);
    assert_eq!(plan.event_counts.primary, 5);
    assert_eq!(plan.event_counts.secondary, 2);
    assert_eq!(plan.buckets.len(), 48);

    for tier in Tier::ALL {
        let rate_sum: f64 = plan.tier_buckets(tier).map(|b| b.arrival_rate).sum();
        let reproduced = (rate_sum * f64::from(plan.observed_days)).round() as u64;
        assert_eq!(reproduced, *plan.event_counts.get(tier), "{tier}");
    }
}

#[test]
fn buckets_are_placed_by_hour_and_tier() {
    let (planner, bulk) = setup();
    let events = read_events(EVENTS.as_bytes()).unwrap();
    let plan = planner.disaggregate(&events, &bulk).unwrap();

    let nine = plan.bucket(9, Tier::Primary).unwrap();
    assert!((nine.arrival_rate - 1.0).abs() < 1e-9);
    // Channel split follows the bulk volume ratio 9000:3000.
    let email: f64 = nine.channels.iter().find(|c| c.channel.as_str() == "email").unwrap().arrival_rate;
    assert!((email - 0.75).abs() < 1e-9);

    assert!(plan.bucket(14, Tier::Secondary).unwrap().arrival_rate > 0.0);
    assert_eq!(plan.bucket(3, Tier::Primary).unwrap().arrival_rate, 0.0);
    assert_eq!(plan.bucket(3, Tier::Primary).unwrap().headcount_target, 0);
}

#[test]
fn low_arrival_hours_are_capped_by_the_arrival_count() {
    let (planner, bulk) = setup();
    let events = read_events(EVENTS.as_bytes()).unwrap();
    let plan = planner.disaggregate(&events, &bulk).unwrap();
    for bucket in &plan.buckets {
        assert!(f64::from(bucket.headcount_actual) <= bucket.arrival_rate.ceil());
        assert!(f64::from(bucket.headcount_target) <= bucket.arrival_rate.ceil());
    }
}

#[test]
fn monthly_headcount_comes_from_the_bulk_row() {
    let (planner, bulk) = setup();
    let events = read_events(EVENTS.as_bytes()).unwrap();
    let plan = planner.disaggregate(&events, &bulk).unwrap();
    let row = &bulk.rows[0];
    assert_eq!(plan.monthly_total(), row.total_headcount);
    assert_eq!(plan.hourly_totals().len(), 24);
    assert_eq!(plan.target_curve().len(), 24);
}

#[test]
fn micro_without_bulk_for_the_period_names_the_period() {
    let (planner, bulk) = setup();
    let ts = NaiveDate::from_ymd_opt(2025, 3, 3)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let events = vec![RawEvent::new(ts, "FLS")];
    let err = planner.disaggregate(&events, &bulk).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingPrerequisite);
    match err {
        PlanningError::MissingPrerequisite { period } => {
            assert_eq!(period, Period::new(2025, 3).unwrap())
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = planner
        .disaggregate(&events, &BulkPlan::default())
        .unwrap_err();
    assert!(err.to_string().contains("2025-03"));
}

#[test]
fn empty_event_feed_is_rejected() {
    let (planner, bulk) = setup();
    let err = planner.disaggregate(&[], &bulk).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn bad_timestamp_aborts_the_read() {
    let csv = "timestamp,team\n2025-01-06 09:15,FLS\nnot-a-time,FLS\n";
    let err = read_events(csv.as_bytes()).unwrap_err();
    match err {
        PlanningError::Parse { row, .. } => assert_eq!(row, Some(3)),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn dominant_period_prefers_the_busiest_month() {
    let at = |m, d| {
        RawEvent::new(
            NaiveDate::from_ymd_opt(2025, m, d).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            "FLS",
        )
    };
    let events = vec![at(1, 31), at(2, 1), at(2, 2), at(1, 30)];
    // Tie goes to the earlier month.
    assert_eq!(dominant_period(&events), Period::new(2025, 1));
    let events = vec![at(1, 31), at(2, 1), at(2, 2)];
    assert_eq!(dominant_period(&events), Period::new(2025, 2));
    assert_eq!(dominant_period(&[]), None);
}

fn busy_hour_events() -> Vec<RawEvent> {
    let mut csv = String::from("timestamp,team\n");
    for minute in 0..60 {
        csv.push_str(&format!("2025-01-06 10:{minute:02}:00,FLS\n"));
    }
    read_events(csv.as_bytes()).unwrap()
}

fn busy_hour_plan(weekly_downtime_minutes: f64) -> staffing_planner::IntradayPlan {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = PlanningConfig {
        weekly_downtime_minutes,
        ..PlanningConfig::default()
    };
    let planner = Planner::new(config).unwrap();
    // Historical email AHT of 15 minutes against a 10 minute target.
    let volume = read_volume_table(
        "period,primary_email,primary_chat,secondary_email,secondary_chat\n2025-01,3000,1000,0,0\n"
            .as_bytes(),
    )
    .unwrap();
    let aht = read_aht_table(
        "period,primary_email,primary_chat,secondary_email,secondary_chat\n2025-01,900,600,1800,1200\n"
            .as_bytes(),
    )
    .unwrap();
    let bulk = planner.aggregate(&volume, &aht).unwrap();
    planner.disaggregate(&busy_hour_events(), &bulk).unwrap()
}

#[test]
fn busy_hour_headcount_follows_channel_split_downtime_and_target_aht() {
    let plan = busy_hour_plan(960.0);
    // 10 % shrinkage plus 960 of 2400 weekly minutes.
    assert!((plan.combined_shrinkage - 0.5).abs() < 1e-12);

    let bucket = plan.bucket(10, Tier::Primary).unwrap();
    assert_eq!(bucket.arrival_rate, 60.0);
    let email = &bucket.channels[0];
    let chat = &bucket.channels[1];
    assert!((email.arrival_rate - 45.0).abs() < 1e-9);
    assert!((chat.arrival_rate - 15.0).abs() < 1e-9);

    // (45 * 900 + 15 * 600) / 3600 / 2 = 6.875 agents logged in, 13.75 scheduled.
    assert_eq!(bucket.headcount_actual, 14);
    // (45 * 600 + 15 * 600) / 3600 / 2 = 5.0 agents logged in, 10.0 scheduled.
    assert_eq!(bucket.headcount_target, 10);

    let quiet = plan.bucket(11, Tier::Primary).unwrap();
    assert_eq!(quiet.headcount_actual, 0);
    assert_eq!(plan.bucket(10, Tier::Secondary).unwrap().headcount_target, 0);
}

#[test]
fn weekly_downtime_raises_hourly_headcount() {
    let without = busy_hour_plan(0.0);
    assert!((without.combined_shrinkage - 0.10).abs() < 1e-12);
    let bucket = without.bucket(10, Tier::Primary).unwrap();
    // 6.875 / 0.9 and 5.0 / 0.9.
    assert_eq!(bucket.headcount_actual, 8);
    assert_eq!(bucket.headcount_target, 6);

    let with = busy_hour_plan(960.0);
    let busy = with.bucket(10, Tier::Primary).unwrap();
    assert!(busy.headcount_actual > bucket.headcount_actual);
    assert!(busy.headcount_target > bucket.headcount_target);
}
