use crate::bulk::{BulkPlan, BulkRow};
use crate::error::{PlanningError, PlanningResult};
use crate::intraday::{HourlyBucket, IntradayPlan};
use crate::model::{Channel, Tier};
use crate::roster::{AgentShift, Roster, ShiftBlock, day_name};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct BulkPlanSnapshot {
    version: u32,
    plan: BulkPlan,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Writes a bulk result so the intraday step can be run later against it.
pub fn save_bulk_plan_json<P: AsRef<Path>>(plan: &BulkPlan, path: P) -> PlanningResult<()> {
    let file = File::create(path)?;
    let snapshot = BulkPlanSnapshot {
        version: SNAPSHOT_VERSION,
        plan: plan.clone(),
    };
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_bulk_plan_json<P: AsRef<Path>>(path: P) -> PlanningResult<BulkPlan> {
    let file = File::open(path)?;
    let snapshot: BulkPlanSnapshot = serde_json::from_reader(file)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PlanningError::InvalidInput(format!(
            "unsupported bulk snapshot version {}",
            snapshot.version
        )));
    }
    let mut periods: Vec<_> = snapshot.plan.periods();
    periods.sort();
    periods.dedup();
    if periods.len() != snapshot.plan.rows.len() {
        return Err(PlanningError::InvalidInput(
            "bulk snapshot contains duplicate periods".into(),
        ));
    }
    Ok(snapshot.plan)
}

#[derive(Serialize)]
struct BulkCsvRecord {
    period: String,
    business_days: u32,
    capacity_hours: f64,
    primary_email_volume: f64,
    primary_chat_volume: f64,
    secondary_email_volume: f64,
    secondary_chat_volume: f64,
    primary_workload_hours: f64,
    secondary_workload_hours: f64,
    primary_headcount: u32,
    secondary_headcount: u32,
    total_headcount: u32,
    headcount_change: String,
}

impl From<&BulkRow> for BulkCsvRecord {
    fn from(row: &BulkRow) -> Self {
        let volume = |tier, channel| row.channel(tier, channel).map(|c| c.volume).unwrap_or(0.0);
        let workload = |tier| row.tier(tier).map(|t| t.workload_hours).unwrap_or(0.0);
        let headcount = |tier| row.tier(tier).map(|t| t.headcount).unwrap_or(0);
        Self {
            period: row.period.key(),
            business_days: row.business_days,
            capacity_hours: row.capacity_hours,
            primary_email_volume: volume(Tier::Primary, Channel::Email),
            primary_chat_volume: volume(Tier::Primary, Channel::Chat),
            secondary_email_volume: volume(Tier::Secondary, Channel::Email),
            secondary_chat_volume: volume(Tier::Secondary, Channel::Chat),
            primary_workload_hours: workload(Tier::Primary),
            secondary_workload_hours: workload(Tier::Secondary),
            primary_headcount: headcount(Tier::Primary),
            secondary_headcount: headcount(Tier::Secondary),
            total_headcount: row.total_headcount,
            headcount_change: row
                .headcount_change
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct HourlyCsvRecord {
    hour: u32,
    tier: &'static str,
    arrival_rate: f64,
    email_arrival_rate: f64,
    chat_arrival_rate: f64,
    headcount_actual: u32,
    headcount_target: u32,
}

impl From<&HourlyBucket> for HourlyCsvRecord {
    fn from(bucket: &HourlyBucket) -> Self {
        let rate = |channel| {
            bucket
                .channels
                .iter()
                .find(|c| c.channel == channel)
                .map(|c| c.arrival_rate)
                .unwrap_or(0.0)
        };
        Self {
            hour: bucket.hour,
            tier: bucket.tier.as_str(),
            arrival_rate: bucket.arrival_rate,
            email_arrival_rate: rate(Channel::Email),
            chat_arrival_rate: rate(Channel::Chat),
            headcount_actual: bucket.headcount_actual,
            headcount_target: bucket.headcount_target,
        }
    }
}

#[derive(Serialize)]
struct ShiftCsvRecord {
    agent: u32,
    tier: String,
    shift_start: String,
    shift_end: String,
    off_days: String,
    downtime_day: &'static str,
    downtime_slot: String,
    lunch: String,
}

impl From<&AgentShift> for ShiftCsvRecord {
    fn from(shift: &AgentShift) -> Self {
        Self {
            agent: shift.agent,
            tier: shift.tier.map(|t| t.to_string()).unwrap_or_default(),
            shift_start: format_hour(shift.start_hour),
            shift_end: format_hour(shift.end_hour),
            off_days: shift
                .off_days
                .iter()
                .map(|d| day_name(*d))
                .collect::<Vec<_>>()
                .join(";"),
            downtime_day: day_name(shift.downtime_day),
            downtime_slot: format_hour(shift.downtime_hour),
            lunch: format_hour(shift.break_hour),
        }
    }
}

#[derive(Serialize)]
struct BlockCsvRecord {
    block: usize,
    start: String,
    end: String,
    weight: f64,
    suggested_agents: u32,
}

impl From<&ShiftBlock> for BlockCsvRecord {
    fn from(block: &ShiftBlock) -> Self {
        Self {
            block: block.index,
            start: format_hour(block.start_hour),
            end: format_hour(block.end_hour),
            weight: block.weight,
            suggested_agents: block.suggested_agents,
        }
    }
}

fn format_hour(hour: u32) -> String {
    format!("{:02}:00", hour % 24)
}

fn write_records<W, T, R>(writer: W, items: &[T]) -> PlanningResult<()>
where
    W: Write,
    R: Serialize + for<'a> From<&'a T>,
{
    let mut writer = csv::Writer::from_writer(writer);
    for item in items {
        writer.serialize(R::from(item))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_bulk_csv<W: Write>(plan: &BulkPlan, writer: W) -> PlanningResult<()> {
    write_records::<_, _, BulkCsvRecord>(writer, &plan.rows)
}

pub fn write_hourly_csv<W: Write>(plan: &IntradayPlan, writer: W) -> PlanningResult<()> {
    write_records::<_, _, HourlyCsvRecord>(writer, &plan.buckets)
}

pub fn write_roster_csv<W: Write>(roster: &Roster, writer: W) -> PlanningResult<()> {
    write_records::<_, _, ShiftCsvRecord>(writer, &roster.agents)
}

pub fn write_blocks_csv<W: Write>(blocks: &[ShiftBlock], writer: W) -> PlanningResult<()> {
    write_records::<_, _, BlockCsvRecord>(writer, blocks)
}

pub fn save_bulk_csv<P: AsRef<Path>>(plan: &BulkPlan, path: P) -> PlanningResult<()> {
    write_bulk_csv(plan, File::create(path)?)
}

pub fn save_hourly_csv<P: AsRef<Path>>(plan: &IntradayPlan, path: P) -> PlanningResult<()> {
    write_hourly_csv(plan, File::create(path)?)
}

pub fn save_roster_csv<P: AsRef<Path>>(roster: &Roster, path: P) -> PlanningResult<()> {
    write_roster_csv(roster, File::create(path)?)
}

pub fn save_blocks_csv<P: AsRef<Path>>(blocks: &[ShiftBlock], path: P) -> PlanningResult<()> {
    write_blocks_csv(blocks, File::create(path)?)
}
