use staffing_planner::tables::{read_aht_table, read_volume_table};
use staffing_planner::{
    Channel, ErrorKind, Period, PlanningConfig, PlanningError, Planner, Tier,
};

const VOLUME: &str = "\
period,primary_email,primary_chat,secondary_email,secondary_chat
2025-01,9000,2691,350,120
2025-02,\"8,500\",2400,300,100
2025-03,9400,2800,0,0
";

const AHT: &str = "\
period,primary_email,primary_chat,secondary_email,secondary_chat
Feb 2025,3600,900,1800,1200
2025-03-01,3700,950,1850,1250
April 2025,3650,920,1820,1210
";

fn planner() -> Planner {
    Planner::new(PlanningConfig::default()).unwrap()
}

#[test]
fn aggregator_emits_only_periods_in_both_tables() {
    let volume = read_volume_table(VOLUME.as_bytes()).unwrap();
    let aht = read_aht_table(AHT.as_bytes()).unwrap();
    let plan = planner().aggregate(&volume, &aht).unwrap();

    assert_eq!(
        plan.periods(),
        vec![Period::new(2025, 2).unwrap(), Period::new(2025, 3).unwrap()]
    );
    assert_eq!(
        plan.unmatched_periods,
        vec![Period::new(2025, 1).unwrap(), Period::new(2025, 4).unwrap()]
    );
}

#[test]
fn aggregation_is_idempotent() {
    let volume = read_volume_table(VOLUME.as_bytes()).unwrap();
    let aht = read_aht_table(AHT.as_bytes()).unwrap();
    let planner = planner();
    let first = planner.aggregate(&volume, &aht).unwrap();
    let second = planner.aggregate(&volume, &aht).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rows_carry_capacity_workload_and_headcount() {
    let volume = read_volume_table(VOLUME.as_bytes()).unwrap();
    let aht = read_aht_table(AHT.as_bytes()).unwrap();
    let plan = planner().aggregate(&volume, &aht).unwrap();

    let feb = plan.find(Period::new(2025, 2).unwrap()).unwrap();
    assert_eq!(feb.business_days, 20);
    assert!((feb.capacity_hours - 20.0 * 8.0 * 0.9).abs() < 1e-9);

    let email = feb.channel(Tier::Primary, Channel::Email).unwrap();
    assert_eq!(email.raw_volume, 8500.0);
    assert!((email.workload_hours - 8500.0 * 3600.0 / 3600.0 / 2.0).abs() < 1e-9);

    let primary = feb.tier(Tier::Primary).unwrap();
    let expected = ((8500.0 * 3600.0 + 2400.0 * 900.0) / 3600.0 / 2.0 / feb.capacity_hours).ceil();
    assert_eq!(primary.headcount, expected as u32);
    assert_eq!(
        feb.total_headcount,
        primary.headcount + feb.tier(Tier::Secondary).unwrap().headcount
    );

    // Secondary has no volume in March.
    let mar = plan.find(Period::new(2025, 3).unwrap()).unwrap();
    assert_eq!(mar.tier(Tier::Secondary).unwrap().headcount, 0);
    assert_eq!(
        mar.headcount_change,
        Some(i64::from(mar.total_headcount) - i64::from(feb.total_headcount))
    );
}

#[test]
fn duplicate_period_is_a_parse_error_with_row() {
    let csv = "period,primary_email,primary_chat,secondary_email,secondary_chat\n\
               2025-01,1,1,1,1\n\
               Jan 2025,2,2,2,2\n";
    let err = read_volume_table(csv.as_bytes()).unwrap_err();
    match err {
        PlanningError::Parse { row, .. } => assert_eq!(row, Some(3)),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_period_is_reported() {
    let csv = "period,primary_email,primary_chat,secondary_email,secondary_chat\n\
               Smarch 2025,1,1,1,1\n";
    let err = read_volume_table(csv.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("Smarch 2025"));
}

#[test]
fn missing_column_names_the_column() {
    let csv = "period,primary_email,primary_chat,secondary_email\n2025-01,1,1,1\n";
    let err = read_aht_table(csv.as_bytes()).unwrap_err();
    match err {
        PlanningError::MissingColumn { column, .. } => assert_eq!(column, "secondary_chat"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn period_column_must_come_first() {
    let csv = "primary_email,period,primary_chat,secondary_email,secondary_chat\n1,2025-01,1,1,1\n";
    let err = read_volume_table(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, PlanningError::Parse { .. }));
}

#[test]
fn empty_tables_give_an_empty_plan() {
    let header = "period,primary_email,primary_chat,secondary_email,secondary_chat\n";
    let volume = read_volume_table(header.as_bytes()).unwrap();
    let aht = read_aht_table(header.as_bytes()).unwrap();
    let plan = planner().aggregate(&volume, &aht).unwrap();
    assert!(plan.rows.is_empty());
    assert!(plan.unmatched_periods.is_empty());
}
