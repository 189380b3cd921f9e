use crate::calendar::WorkCalendar;
use crate::config::PlanningConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::model::{Channel, Period, Tier};
use crate::sizing::{self, TierHeadcount};
use crate::tables::PeriodRecord;
use crate::workload::{self, ChannelWorkload};
use log::{debug, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One channel's inputs and derived workload within a bulk row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelLoad {
    pub tier: Tier,
    pub channel: Channel,
    pub raw_volume: f64,
    /// Volume after the growth uplift.
    pub volume: f64,
    pub aht_seconds: f64,
    pub workload_hours: f64,
}

/// Headcount for one joined period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRow {
    pub period: Period,
    pub business_days: u32,
    pub capacity_hours: f64,
    pub channels: Vec<ChannelLoad>,
    pub tiers: Vec<TierHeadcount>,
    pub total_volume: f64,
    pub total_headcount: u32,
    /// Change against the previous row, `None` for the first period.
    pub headcount_change: Option<i64>,
}

impl BulkRow {
    pub fn tier(&self, tier: Tier) -> Option<&TierHeadcount> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    pub fn channel(&self, tier: Tier, channel: Channel) -> Option<&ChannelLoad> {
        self.channels
            .iter()
            .find(|c| c.tier == tier && c.channel == channel)
    }

    /// Share of the tier's grown volume per channel. A tier without volume
    /// splits evenly.
    pub fn channel_split(&self, tier: Tier) -> Vec<(Channel, f64)> {
        let total: f64 = self
            .channels
            .iter()
            .filter(|c| c.tier == tier)
            .map(|c| c.volume)
            .sum();
        let count = self.channels.iter().filter(|c| c.tier == tier).count();
        self.channels
            .iter()
            .filter(|c| c.tier == tier)
            .map(|c| {
                let share = if total > 0.0 {
                    c.volume / total
                } else {
                    1.0 / count as f64
                };
                (c.channel, share)
            })
            .collect()
    }
}

/// Ordered bulk results plus the periods the join dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkPlan {
    pub rows: Vec<BulkRow>,
    /// Periods present in only one of the two tables. They are excluded from
    /// `rows` without raising an error.
    #[serde(default)]
    pub unmatched_periods: Vec<Period>,
}

impl BulkPlan {
    pub fn find(&self, period: Period) -> Option<&BulkRow> {
        self.rows.iter().find(|r| r.period == period)
    }

    pub fn require(&self, period: Period) -> PlanningResult<&BulkRow> {
        self.find(period)
            .ok_or(PlanningError::MissingPrerequisite { period })
    }

    pub fn periods(&self) -> Vec<Period> {
        self.rows.iter().map(|r| r.period).collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let periods: Vec<String> = self.rows.iter().map(|r| r.period.key()).collect();
        let business_days: Vec<u32> = self.rows.iter().map(|r| r.business_days).collect();
        let capacity: Vec<f64> = self.rows.iter().map(|r| r.capacity_hours).collect();
        let total_volume: Vec<f64> = self.rows.iter().map(|r| r.total_volume).collect();

        let mut columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("period"), periods).into_column(),
            Series::new(PlSmallStr::from_static("business_days"), business_days).into_column(),
            Series::new(PlSmallStr::from_static("capacity_hours"), capacity).into_column(),
        ];
        for tier in Tier::ALL {
            for channel in Channel::ALL {
                let volume: Vec<f64> = self
                    .rows
                    .iter()
                    .map(|r| r.channel(tier, channel).map(|c| c.volume).unwrap_or(0.0))
                    .collect();
                let aht: Vec<f64> = self
                    .rows
                    .iter()
                    .map(|r| r.channel(tier, channel).map(|c| c.aht_seconds).unwrap_or(0.0))
                    .collect();
                columns.push(Series::new(format!("{tier}_{channel}_volume").into(), volume).into_column());
                columns.push(Series::new(format!("{tier}_{channel}_aht").into(), aht).into_column());
            }
        }
        columns.push(Series::new(PlSmallStr::from_static("total_volume"), total_volume).into_column());
        for tier in Tier::ALL {
            let hc: Vec<u32> = self
                .rows
                .iter()
                .map(|r| r.tier(tier).map(|t| t.headcount).unwrap_or(0))
                .collect();
            columns.push(Series::new(format!("{tier}_headcount").into(), hc).into_column());
        }
        let total: Vec<u32> = self.rows.iter().map(|r| r.total_headcount).collect();
        columns.push(Series::new(PlSmallStr::from_static("total_headcount"), total).into_column());
        let change: Vec<Option<i64>> = self.rows.iter().map(|r| r.headcount_change).collect();
        columns.push(Series::new(PlSmallStr::from_static("headcount_change"), change).into_column());

        DataFrame::new(columns)
    }
}

const KEY: &str = "period";

fn value_column(prefix: &str, tier: Tier, channel: Channel) -> String {
    format!("{prefix}_{tier}_{channel}")
}

fn table_frame(prefix: &str, records: &[PeriodRecord]) -> PolarsResult<DataFrame> {
    let keys: Vec<String> = records.iter().map(|r| r.period.key()).collect();
    let mut columns = vec![Series::new(PlSmallStr::from_static(KEY), keys).into_column()];
    for tier in Tier::ALL {
        for channel in Channel::ALL {
            let values: Vec<f64> = records.iter().map(|r| r.value(tier, channel)).collect();
            columns.push(
                Series::new(value_column(prefix, tier, channel).into(), values).into_column(),
            );
        }
    }
    DataFrame::new(columns)
}

/// Inner-joins the two tables on the period key. Output rows keep only
/// periods present on both sides.
fn join_tables(volume: &[PeriodRecord], aht: &[PeriodRecord]) -> PolarsResult<DataFrame> {
    let left = table_frame("volume", volume)?;
    let right = table_frame("aht", aht)?;
    left.lazy()
        .join(
            right.lazy(),
            [col(KEY)],
            [col(KEY)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()
}

struct JoinedRow {
    period: Period,
    channels: Vec<ChannelWorkload>,
}

fn joined_rows(joined: &DataFrame) -> PlanningResult<Vec<JoinedRow>> {
    let keys = joined.column(KEY)?.str()?;
    let mut rows = Vec::with_capacity(joined.height());
    for idx in 0..joined.height() {
        let raw_key = keys.get(idx).unwrap_or_default();
        let period: Period = raw_key
            .parse()
            .map_err(|msg: String| PlanningError::parse("joined tables", None, msg))?;

        let mut channels = Vec::with_capacity(4);
        for tier in Tier::ALL {
            for channel in Channel::ALL {
                let volume = joined
                    .column(&value_column("volume", tier, channel))?
                    .f64()?
                    .get(idx)
                    .unwrap_or(0.0);
                let aht = joined
                    .column(&value_column("aht", tier, channel))?
                    .f64()?
                    .get(idx)
                    .unwrap_or(0.0);
                channels.push(ChannelWorkload::new(tier, channel, volume, aht));
            }
        }
        rows.push(JoinedRow { period, channels });
    }
    Ok(rows)
}

fn unmatched(volume: &[PeriodRecord], aht: &[PeriodRecord]) -> Vec<Period> {
    let left: BTreeSet<Period> = volume.iter().map(|r| r.period).collect();
    let right: BTreeSet<Period> = aht.iter().map(|r| r.period).collect();
    left.symmetric_difference(&right).copied().collect()
}

fn check_unique(input: &str, records: &[PeriodRecord]) -> PlanningResult<()> {
    let mut seen = BTreeSet::new();
    for (idx, record) in records.iter().enumerate() {
        if !seen.insert(record.period) {
            return Err(PlanningError::parse(
                input,
                // Same numbering as the table readers: header is line 1.
                Some(idx + 2),
                format!("duplicate period {}", record.period),
            ));
        }
    }
    Ok(())
}

/// Joins the volume and AHT tables by period and sizes every joined period.
///
/// Rows are ordered chronologically. Periods present in only one table are
/// dropped and listed in [`BulkPlan::unmatched_periods`].
pub fn aggregate(
    volume: &[PeriodRecord],
    aht: &[PeriodRecord],
    config: &PlanningConfig,
    calendar: &WorkCalendar,
) -> PlanningResult<BulkPlan> {
    check_unique("volume table", volume)?;
    check_unique("AHT table", aht)?;

    let joined = join_tables(volume, aht)?;
    let mut inputs = joined_rows(&joined)?;
    inputs.sort_by_key(|row| row.period);

    let unmatched_periods = unmatched(volume, aht);
    if !unmatched_periods.is_empty() {
        let listed = unmatched_periods
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        warn!("periods missing from one of the tables were excluded: {listed}");
    }

    let mut rows: Vec<BulkRow> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let sizing = sizing::size_period(input.period, &input.channels, config, calendar);
        let channels: Vec<ChannelLoad> = input
            .channels
            .iter()
            .map(|raw| {
                let grown = raw.grown(config.growth_rate);
                ChannelLoad {
                    tier: raw.tier,
                    channel: raw.channel,
                    raw_volume: raw.volume,
                    volume: grown.volume,
                    aht_seconds: raw.aht_seconds,
                    workload_hours: workload::workload_hours(
                        grown.volume,
                        grown.aht_seconds,
                        config.concurrency_for(raw.tier),
                    ),
                }
            })
            .collect();
        let total_volume = channels.iter().map(|c| c.volume).sum();
        let headcount_change = rows
            .last()
            .map(|prev| i64::from(sizing.total_headcount) - i64::from(prev.total_headcount));
        debug!(
            "{}: business_days={} capacity={:.2}h headcount={}",
            sizing.period, sizing.business_days, sizing.capacity_hours, sizing.total_headcount
        );
        rows.push(BulkRow {
            period: sizing.period,
            business_days: sizing.business_days,
            capacity_hours: sizing.capacity_hours,
            channels,
            tiers: sizing.tiers,
            total_volume,
            total_headcount: sizing.total_headcount,
            headcount_change,
        });
    }

    info!(
        "bulk aggregation sized {} period(s), {} unmatched",
        rows.len(),
        unmatched_periods.len()
    );
    Ok(BulkPlan {
        rows,
        unmatched_periods,
    })
}
