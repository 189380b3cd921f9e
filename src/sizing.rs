use crate::calendar::WorkCalendar;
use crate::capacity;
use crate::config::PlanningConfig;
use crate::model::{Period, Tier};
use crate::workload::{self, ChannelWorkload};
use log::debug;
use serde::{Deserialize, Serialize};

const RELATIVE_EPSILON: f64 = 1e-12;

/// `ceil` that ignores floating point noise just above a whole number.
/// Any positive value below one still needs one agent.
pub(crate) fn ceil_count(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    let whole = if rounded >= 1.0 && (value - rounded).abs() <= rounded * RELATIVE_EPSILON {
        rounded
    } else {
        value.ceil()
    };
    whole.min(f64::from(u32::MAX)) as u32
}

/// Integer agents needed to cover `workload_hours` with agents that each
/// deliver `capacity_hours`.
///
/// With a cap input, the result never exceeds `ceil(raw_volume)`, and a raw
/// volume of zero means zero agents.
pub fn headcount(workload_hours: f64, capacity_hours: f64, raw_volume_cap: Option<f64>) -> u32 {
    if !capacity_hours.is_finite() || capacity_hours <= 0.0 {
        return 0;
    }
    let base = ceil_count(workload_hours / capacity_hours);
    match raw_volume_cap {
        Some(raw) if raw > 0.0 => ceil_count(raw).min(base),
        Some(_) => 0,
        None => base,
    }
}

/// Scheduled agents needed so that `logged_in_agents` remain after shrinkage:
/// `ceil(logged_in_agents / (1 - shrinkage))`. Shrinkage at or above 100 % gives 0.
pub fn inflate_for_shrinkage(logged_in_agents: f64, shrinkage: f64) -> u32 {
    if !shrinkage.is_finite() || shrinkage >= 1.0 {
        return 0;
    }
    ceil_count(logged_in_agents / (1.0 - shrinkage.max(0.0)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHeadcount {
    pub tier: Tier,
    /// Volume after growth, summed across the tier's channels.
    pub volume: f64,
    pub workload_hours: f64,
    pub capacity_hours: f64,
    pub headcount: u32,
}

/// Headcount for one calendar period from aggregate volume and AHT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSizing {
    pub period: Period,
    pub business_days: u32,
    pub capacity_hours: f64,
    pub tiers: Vec<TierHeadcount>,
    pub total_headcount: u32,
}

impl PeriodSizing {
    pub fn tier(&self, tier: Tier) -> Option<&TierHeadcount> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

/// Sizes every tier for `period`. `channels` carry raw volumes; growth is
/// applied here.
pub fn size_period(
    period: Period,
    channels: &[ChannelWorkload],
    config: &PlanningConfig,
    calendar: &WorkCalendar,
) -> PeriodSizing {
    let business_days = calendar.business_days_in(period);
    let capacity_hours =
        capacity::effective_hours(business_days, config.shift_hours, config.shrinkage_rate);

    let grown: Vec<ChannelWorkload> = channels
        .iter()
        .map(|c| c.grown(config.growth_rate))
        .collect();

    let tiers: Vec<TierHeadcount> = Tier::ALL
        .into_iter()
        .map(|tier| {
            let volume = workload::tier_volume(&grown, tier);
            let workload_hours =
                workload::tier_workload(&grown, tier, config.concurrency_for(tier));
            let cap = config.low_volume_cap.cap_for(tier, volume);
            let headcount = headcount(workload_hours, capacity_hours, cap);
            debug!(
                "{period} {tier}: volume={volume:.2} workload={workload_hours:.2}h capacity={capacity_hours:.2}h headcount={headcount}"
            );
            TierHeadcount {
                tier,
                volume,
                workload_hours,
                capacity_hours,
                headcount,
            }
        })
        .collect();

    let total_headcount = tiers.iter().map(|t| t.headcount).sum();
    PeriodSizing {
        period,
        business_days,
        capacity_hours,
        tiers,
        total_headcount,
    }
}
