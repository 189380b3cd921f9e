use crate::config::RosterConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::model::{PerTier, Tier};
use chrono::Weekday;
use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayPlan {
    Off,
    /// Regular working day with a lunch hour.
    Work { lunch_hour: u32 },
    /// Working day whose break slot is spent on coaching/meetings.
    Downtime { downtime_hour: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentShift {
    /// 1-based.
    pub agent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    pub start_hour: u32,
    pub end_hour: u32,
    pub off_days: [Weekday; 2],
    pub downtime_day: Weekday,
    pub break_hour: u32,
    pub downtime_hour: u32,
}

impl AgentShift {
    pub fn works_on(&self, day: Weekday) -> bool {
        !self.off_days.contains(&day)
    }

    pub fn day_plan(&self, day: Weekday) -> DayPlan {
        if !self.works_on(day) {
            DayPlan::Off
        } else if day == self.downtime_day {
            DayPlan::Downtime {
                downtime_hour: self.downtime_hour,
            }
        } else {
            DayPlan::Work {
                lunch_hour: self.break_hour,
            }
        }
    }

    pub fn week(&self) -> Vec<(Weekday, DayPlan)> {
        WEEK.iter().map(|day| (*day, self.day_plan(*day))).collect()
    }
}

/// Produces one agent's weekly template from its index. Implementations must
/// be deterministic.
pub trait ShiftAssignmentStrategy {
    fn assign(&self, agent: u32, total_agents: u32) -> AgentShift;
}

fn shift_template(agent: u32, start_hour: u32, config: &RosterConfig) -> AgentShift {
    let off_first = WEEK[(agent % 7) as usize];
    let off_second = WEEK[((agent + 1) % 7) as usize];
    AgentShift {
        agent,
        tier: None,
        start_hour,
        end_hour: (start_hour + config.shift_length_hours) % 24,
        off_days: [off_first, off_second],
        // First day after the two off-days; always a working day.
        downtime_day: WEEK[((agent + 2) % 7) as usize],
        break_hour: (start_hour + config.lunch_offset_hours) % 24,
        downtime_hour: (start_hour + config.downtime_offset_hours) % 24,
    }
}

/// Cycles agents through the configured start hours and spreads off-days by
/// `agent mod 7`. Off-day coverage is not balanced for every headcount.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicAssignment {
    config: RosterConfig,
}

impl CyclicAssignment {
    pub fn new(config: RosterConfig) -> Self {
        Self { config }
    }
}

impl Default for CyclicAssignment {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}

impl ShiftAssignmentStrategy for CyclicAssignment {
    fn assign(&self, agent: u32, _total_agents: u32) -> AgentShift {
        let hours = &self.config.start_hours;
        let start_hour = if hours.is_empty() {
            0
        } else {
            hours[(agent.saturating_sub(1) as usize) % hours.len()] % 24
        };
        shift_template(agent, start_hour, &self.config)
    }
}

/// Starts agents in the shift blocks they were allocated to: the first
/// `blocks[0].suggested_agents` agents start at the first block, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockAssignment {
    config: RosterConfig,
    starts: Vec<u32>,
}

impl BlockAssignment {
    pub fn new(config: RosterConfig, blocks: &[ShiftBlock]) -> Self {
        let starts = blocks
            .iter()
            .flat_map(|b| std::iter::repeat(b.start_hour).take(b.suggested_agents as usize))
            .collect();
        Self { config, starts }
    }
}

impl ShiftAssignmentStrategy for BlockAssignment {
    fn assign(&self, agent: u32, total_agents: u32) -> AgentShift {
        let idx = agent.saturating_sub(1) as usize;
        match self.starts.get(idx) {
            Some(start) => shift_template(agent, *start, &self.config),
            // More agents than allocated: fall back to the cyclic pattern.
            None => CyclicAssignment::new(self.config.clone()).assign(agent, total_agents),
        }
    }
}

/// A start-time block with its share of total headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftBlock {
    pub index: usize,
    pub start_hour: u32,
    pub end_hour: u32,
    /// Summed hourly demand inside the block.
    pub weight: f64,
    pub suggested_agents: u32,
}

/// Splits `total_headcount` across `block_count` equal start-time blocks in
/// proportion to the hourly demand that falls in each block.
///
/// Each block is rounded half to even, then the signed remainder is moved
/// onto the first block so allocations sum to `total_headcount`. If that
/// would leave the first block negative the call fails with
/// [`PlanningError::BlockReconciliation`].
pub fn reconcile_blocks(
    hourly_demand: &[f64],
    block_count: u32,
    total_headcount: u32,
) -> PlanningResult<Vec<ShiftBlock>> {
    if block_count == 0 || 24 % block_count != 0 {
        return Err(PlanningError::invalid_config(
            "roster.block_count",
            format!("must divide 24 (got {block_count})"),
        ));
    }
    if hourly_demand.len() != 24 {
        return Err(PlanningError::InvalidInput(format!(
            "hourly demand must have 24 values (got {})",
            hourly_demand.len()
        )));
    }

    let width = 24 / block_count;
    let weights: Vec<f64> = (0..block_count)
        .map(|b| {
            let start = (b * width) as usize;
            hourly_demand[start..start + width as usize]
                .iter()
                .map(|d| if d.is_finite() { d.max(0.0) } else { 0.0 })
                .sum()
        })
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let mut allocations: Vec<i64> = weights
        .iter()
        .map(|w| {
            if total_weight > 0.0 {
                (w / total_weight * f64::from(total_headcount)).round_ties_even() as i64
            } else {
                0
            }
        })
        .collect();

    let remainder = i64::from(total_headcount) - allocations.iter().sum::<i64>();
    debug!("block rounding remainder {remainder} applied to block 0");
    allocations[0] += remainder;

    let mut blocks = Vec::with_capacity(block_count as usize);
    for (index, (weight, allocation)) in weights.into_iter().zip(allocations).enumerate() {
        if allocation < 0 {
            return Err(PlanningError::BlockReconciliation {
                block: index,
                allocation,
            });
        }
        let start_hour = index as u32 * width;
        blocks.push(ShiftBlock {
            index,
            start_hour,
            end_hour: (start_hour + width) % 24,
            weight,
            suggested_agents: allocation as u32,
        });
    }
    Ok(blocks)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub agents: Vec<AgentShift>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<ShiftBlock>>,
}

impl Roster {
    pub fn total_agents(&self) -> usize {
        self.agents.len()
    }

    /// Agents working on each weekday, Monday first.
    pub fn coverage_by_day(&self) -> Vec<(Weekday, usize)> {
        WEEK.iter()
            .map(|day| (*day, self.agents.iter().filter(|a| a.works_on(*day)).count()))
            .collect()
    }

    /// Agents on shift during each clock hour on `day`, excluding anyone on
    /// their break or downtime slot.
    pub fn hourly_coverage(&self, day: Weekday) -> Vec<u32> {
        let mut coverage = vec![0u32; 24];
        for agent in &self.agents {
            let break_slot = match agent.day_plan(day) {
                DayPlan::Off => continue,
                DayPlan::Work { lunch_hour } => lunch_hour,
                DayPlan::Downtime { downtime_hour } => downtime_hour,
            };
            let length = (agent.end_hour + 24 - agent.start_hour) % 24;
            let length = if length == 0 { 24 } else { length };
            for offset in 0..length {
                let hour = (agent.start_hour + offset) % 24;
                if hour != break_slot {
                    coverage[hour as usize] += 1;
                }
            }
        }
        coverage
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let agents: Vec<u32> = self.agents.iter().map(|a| a.agent).collect();
        let tiers: Vec<Option<&str>> = self
            .agents
            .iter()
            .map(|a| a.tier.map(|t| t.as_str()))
            .collect();
        let starts: Vec<String> = self
            .agents
            .iter()
            .map(|a| format!("{:02}:00", a.start_hour))
            .collect();
        let ends: Vec<String> = self
            .agents
            .iter()
            .map(|a| format!("{:02}:00", a.end_hour))
            .collect();
        let off: Vec<String> = self
            .agents
            .iter()
            .map(|a| format!("{}, {}", day_name(a.off_days[0]), day_name(a.off_days[1])))
            .collect();
        let downtime: Vec<&str> = self.agents.iter().map(|a| day_name(a.downtime_day)).collect();
        let breaks: Vec<String> = self
            .agents
            .iter()
            .map(|a| format!("{:02}:00", a.break_hour))
            .collect();

        DataFrame::new(vec![
            Series::new(PlSmallStr::from_static("agent"), agents).into_column(),
            Series::new(PlSmallStr::from_static("tier"), tiers).into_column(),
            Series::new(PlSmallStr::from_static("shift_start"), starts).into_column(),
            Series::new(PlSmallStr::from_static("shift_end"), ends).into_column(),
            Series::new(PlSmallStr::from_static("off_days"), off).into_column(),
            Series::new(PlSmallStr::from_static("downtime_day"), downtime).into_column(),
            Series::new(PlSmallStr::from_static("lunch"), breaks).into_column(),
        ])
    }
}

pub fn blocks_dataframe(blocks: &[ShiftBlock]) -> PolarsResult<DataFrame> {
    let labels: Vec<String> = blocks
        .iter()
        .map(|b| format!("{:02}:00-{:02}:00", b.start_hour, b.end_hour))
        .collect();
    let weights: Vec<f64> = blocks.iter().map(|b| b.weight).collect();
    let agents: Vec<u32> = blocks.iter().map(|b| b.suggested_agents).collect();
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("block"), labels).into_column(),
        Series::new(PlSmallStr::from_static("weight"), weights).into_column(),
        Series::new(PlSmallStr::from_static("suggested_agents"), agents).into_column(),
    ])
}

/// Builds one weekly template per agent. With a per-tier split, the first
/// `primary` agents are primary and the rest secondary; the split must sum
/// to `total_headcount`.
pub fn build_roster(
    total_headcount: u32,
    per_tier: Option<PerTier<u32>>,
    strategy: &dyn ShiftAssignmentStrategy,
) -> PlanningResult<Roster> {
    if let Some(split) = per_tier {
        let sum = split.primary + split.secondary;
        if sum != total_headcount {
            return Err(PlanningError::InvalidInput(format!(
                "per-tier headcount {sum} does not match total {total_headcount}"
            )));
        }
    }

    let agents = (1..=total_headcount)
        .map(|agent| {
            let mut shift = strategy.assign(agent, total_headcount);
            shift.agent = agent;
            shift.tier = per_tier.map(|split| {
                if agent <= split.primary {
                    Tier::Primary
                } else {
                    Tier::Secondary
                }
            });
            shift
        })
        .collect();

    info!("roster built for {total_headcount} agent(s)");
    Ok(Roster {
        agents,
        blocks: None,
    })
}
