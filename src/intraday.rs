use crate::bulk::{BulkPlan, BulkRow};
use crate::calendar::WorkCalendar;
use crate::capacity;
use crate::config::PlanningConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::model::{Channel, Period, PerTier, Tier};
use crate::sizing::{self, ceil_count};
use crate::tables::RawEvent;
use crate::workload;
use chrono::{NaiveDate, Timelike};
use log::{debug, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelArrival {
    pub channel: Channel,
    /// Average events per day in this hour attributed to the channel.
    pub arrival_rate: f64,
}

/// Demand and staffing for one hour of the day and one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub tier: Tier,
    /// Average events per day observed in this hour.
    pub arrival_rate: f64,
    pub channels: Vec<ChannelArrival>,
    /// Headcount at the tier's historical AHT.
    pub headcount_actual: u32,
    /// Headcount at the configured target AHT.
    pub headcount_target: u32,
}

/// Cross-tier totals for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyTotal {
    pub hour: u32,
    pub arrival_rate: f64,
    pub headcount_actual: u32,
    pub headcount_target: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayPlan {
    pub period: Period,
    /// Distinct calendar dates present in the event data.
    pub observed_days: u32,
    pub event_counts: PerTier<u64>,
    pub combined_shrinkage: f64,
    /// Monthly headcount per tier taken from the matching bulk row.
    pub monthly_headcount: PerTier<u32>,
    /// 24 buckets per tier, primary first, each ordered by hour.
    pub buckets: Vec<HourlyBucket>,
}

impl IntradayPlan {
    pub fn tier_buckets(&self, tier: Tier) -> impl Iterator<Item = &HourlyBucket> {
        self.buckets.iter().filter(move |b| b.tier == tier)
    }

    pub fn bucket(&self, hour: u32, tier: Tier) -> Option<&HourlyBucket> {
        self.buckets
            .iter()
            .find(|b| b.hour == hour && b.tier == tier)
    }

    pub fn monthly_total(&self) -> u32 {
        self.monthly_headcount.primary + self.monthly_headcount.secondary
    }

    pub fn hourly_totals(&self) -> Vec<HourlyTotal> {
        (0..HOURS_PER_DAY as u32)
            .map(|hour| {
                let in_hour = self.buckets.iter().filter(|b| b.hour == hour);
                in_hour.fold(
                    HourlyTotal {
                        hour,
                        arrival_rate: 0.0,
                        headcount_actual: 0,
                        headcount_target: 0,
                    },
                    |acc, b| HourlyTotal {
                        hour,
                        arrival_rate: acc.arrival_rate + b.arrival_rate,
                        headcount_actual: acc.headcount_actual + b.headcount_actual,
                        headcount_target: acc.headcount_target + b.headcount_target,
                    },
                )
            })
            .collect()
    }

    /// Target headcount per hour summed across tiers; the demand curve used
    /// to weight shift blocks.
    pub fn target_curve(&self) -> Vec<f64> {
        self.hourly_totals()
            .iter()
            .map(|t| f64::from(t.headcount_target))
            .collect()
    }

    /// Hour with the highest cross-tier target headcount (earliest on ties).
    pub fn peak_hour(&self) -> Option<HourlyTotal> {
        self.hourly_totals()
            .into_iter()
            .reduce(|best, t| if t.headcount_target > best.headcount_target { t } else { best })
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let hours: Vec<u32> = self.buckets.iter().map(|b| b.hour).collect();
        let tiers: Vec<&str> = self.buckets.iter().map(|b| b.tier.as_str()).collect();
        let rates: Vec<f64> = self.buckets.iter().map(|b| b.arrival_rate).collect();
        let mut columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("hour"), hours).into_column(),
            Series::new(PlSmallStr::from_static("tier"), tiers).into_column(),
            Series::new(PlSmallStr::from_static("arrival_rate"), rates).into_column(),
        ];
        for channel in Channel::ALL {
            let values: Vec<f64> = self
                .buckets
                .iter()
                .map(|b| {
                    b.channels
                        .iter()
                        .find(|c| c.channel == channel)
                        .map(|c| c.arrival_rate)
                        .unwrap_or(0.0)
                })
                .collect();
            columns.push(Series::new(format!("{channel}_arrival_rate").into(), values).into_column());
        }
        let actual: Vec<u32> = self.buckets.iter().map(|b| b.headcount_actual).collect();
        let target: Vec<u32> = self.buckets.iter().map(|b| b.headcount_target).collect();
        columns.push(Series::new(PlSmallStr::from_static("headcount_actual"), actual).into_column());
        columns.push(Series::new(PlSmallStr::from_static("headcount_target"), target).into_column());
        DataFrame::new(columns)
    }
}

/// The month holding most of the events; ties go to the earliest month.
pub fn dominant_period(events: &[RawEvent]) -> Option<Period> {
    let mut counts: BTreeMap<Period, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(Period::from_date(event.timestamp.date())).or_default() += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(period, _)| period)
}

/// Events per (hour, tier), counted with a polars group-by.
fn hourly_counts(events: &[RawEvent], markers: &[String]) -> PlanningResult<BTreeMap<(u32, Tier), u64>> {
    let hours: Vec<i32> = events.iter().map(|e| e.timestamp.hour() as i32).collect();
    let tiers: Vec<&str> = events
        .iter()
        .map(|e| Tier::classify(&e.team, markers).as_str())
        .collect();
    let frame = DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("hour"), hours).into_column(),
        Series::new(PlSmallStr::from_static("tier"), tiers).into_column(),
    ])?;

    let grouped = frame
        .lazy()
        .group_by([col("hour"), col("tier")])
        .agg([len().cast(DataType::Int64).alias("events")])
        .collect()?;

    let hour_ca = grouped.column("hour")?.i32()?;
    let tier_ca = grouped.column("tier")?.str()?;
    let count_ca = grouped.column("events")?.i64()?;

    let mut counts = BTreeMap::new();
    for idx in 0..grouped.height() {
        let (Some(hour), Some(tier), Some(count)) =
            (hour_ca.get(idx), tier_ca.get(idx), count_ca.get(idx))
        else {
            continue;
        };
        let tier = Tier::from_str(tier).ok_or_else(|| {
            PlanningError::InvalidInput(format!("unexpected tier label '{tier}' after grouping"))
        })?;
        counts.insert((hour as u32, tier), count.max(0) as u64);
    }
    Ok(counts)
}

/// Staffing for one hour and tier under a given AHT per channel.
fn hour_headcount(
    arrivals: &[ChannelArrival],
    aht_seconds: impl Fn(Channel) -> f64,
    concurrency: f64,
    shrinkage: f64,
    cap: Option<f64>,
) -> u32 {
    // Work hours arriving per clock hour equal the agents that must be logged in.
    let logged_in: f64 = arrivals
        .iter()
        .map(|a| workload::workload_hours(a.arrival_rate, aht_seconds(a.channel), concurrency))
        .sum();
    let scheduled = sizing::inflate_for_shrinkage(logged_in, shrinkage);
    match cap {
        Some(raw) if raw > 0.0 => scheduled.min(ceil_count(raw)),
        Some(_) => 0,
        None => scheduled,
    }
}

/// Splits a bulk period's headcount into an hour-of-day demand curve using
/// the arrival pattern of raw events.
///
/// `bulk` must contain a row for the period the events belong to; otherwise
/// the call fails with [`PlanningError::MissingPrerequisite`].
pub fn disaggregate(
    events: &[RawEvent],
    bulk: &BulkPlan,
    config: &PlanningConfig,
    calendar: &WorkCalendar,
) -> PlanningResult<IntradayPlan> {
    let period = dominant_period(events)
        .ok_or_else(|| PlanningError::parse("event feed", None, "no events to disaggregate"))?;
    let row = bulk.require(period)?;

    let outside = events
        .iter()
        .filter(|e| Period::from_date(e.timestamp.date()) != period)
        .count();
    if outside > 0 {
        warn!("{outside} event(s) fall outside {period} but are included in the arrival pattern");
    }

    disaggregate_row(events, row, config, calendar)
}

/// Same as [`disaggregate`] with the bulk row already selected.
pub fn disaggregate_row(
    events: &[RawEvent],
    row: &BulkRow,
    config: &PlanningConfig,
    calendar: &WorkCalendar,
) -> PlanningResult<IntradayPlan> {
    if events.is_empty() {
        return Err(PlanningError::parse("event feed", None, "no events to disaggregate"));
    }

    let days: BTreeSet<NaiveDate> = events.iter().map(|e| e.timestamp.date()).collect();
    let observed_days = days.len() as u32;
    let counts = hourly_counts(events, &config.secondary_markers)?;

    let week_minutes =
        capacity::minutes_per_work_week(config.shift_hours, calendar.working_days_per_week());
    let combined_shrinkage = capacity::combined_shrinkage(
        config.shrinkage_rate,
        config.weekly_downtime_minutes,
        week_minutes,
    );
    if combined_shrinkage >= 1.0 {
        warn!("combined shrinkage {combined_shrinkage:.3} leaves no productive time; hourly headcount forced to zero");
    }

    let mut event_counts = PerTier::<u64>::default();
    let mut buckets = Vec::with_capacity(HOURS_PER_DAY * Tier::ALL.len());
    for tier in Tier::ALL {
        let split = row.channel_split(tier);
        let concurrency = config.concurrency_for(tier);
        let targets = config.target_aht_minutes.get(tier);

        for hour in 0..HOURS_PER_DAY as u32 {
            let count = counts.get(&(hour, tier)).copied().unwrap_or(0);
            *event_counts.get_mut(tier) += count;
            let arrival_rate = count as f64 / f64::from(observed_days);
            let channels: Vec<ChannelArrival> = split
                .iter()
                .map(|(channel, share)| ChannelArrival {
                    channel: *channel,
                    arrival_rate: arrival_rate * share,
                })
                .collect();

            let cap = config.low_volume_cap.cap_for(tier, arrival_rate);
            let headcount_actual = hour_headcount(
                &channels,
                |channel| row.channel(tier, channel).map(|c| c.aht_seconds).unwrap_or(0.0),
                concurrency,
                combined_shrinkage,
                cap,
            );
            let headcount_target = hour_headcount(
                &channels,
                |channel| targets.get(channel) * 60.0,
                concurrency,
                combined_shrinkage,
                cap,
            );

            buckets.push(HourlyBucket {
                hour,
                tier,
                arrival_rate,
                channels,
                headcount_actual,
                headcount_target,
            });
        }
        debug!(
            "{} {tier}: {} events over {observed_days} day(s)",
            row.period,
            event_counts.get(tier)
        );
    }

    let monthly_headcount = PerTier::new(
        row.tier(Tier::Primary).map(|t| t.headcount).unwrap_or(0),
        row.tier(Tier::Secondary).map(|t| t.headcount).unwrap_or(0),
    );
    info!(
        "intraday plan for {}: {} events, {observed_days} day(s), combined shrinkage {combined_shrinkage:.3}",
        row.period,
        events.len()
    );

    Ok(IntradayPlan {
        period: row.period,
        observed_days,
        event_counts,
        combined_shrinkage,
        monthly_headcount,
        buckets,
    })
}
