use crate::calendar::WorkCalendarConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::model::{ChannelPair, Period, PerTier, Tier};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Which computations clamp headcount by the raw interaction count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapPolicy {
    Disabled,
    AllTiers,
    SecondaryOnly,
    /// Cap only when the raw volume is below the threshold.
    BelowVolume { threshold: f64 },
}

impl CapPolicy {
    pub fn applies(&self, tier: Tier, raw_volume: f64) -> bool {
        match self {
            CapPolicy::Disabled => false,
            CapPolicy::AllTiers => true,
            CapPolicy::SecondaryOnly => tier == Tier::Secondary,
            CapPolicy::BelowVolume { threshold } => raw_volume < *threshold,
        }
    }

    /// Returns the cap input for the sizing formula when the policy applies.
    pub fn cap_for(&self, tier: Tier, raw_volume: f64) -> Option<f64> {
        self.applies(tier, raw_volume).then_some(raw_volume)
    }
}

impl Default for CapPolicy {
    fn default() -> Self {
        CapPolicy::AllTiers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Candidate shift start hours, cycled by agent index.
    pub start_hours: Vec<u32>,
    /// Paid shift length including the break hour.
    pub shift_length_hours: u32,
    pub lunch_offset_hours: u32,
    pub downtime_offset_hours: u32,
    /// Number of start-time blocks the day is split into. Must divide 24.
    pub block_count: u32,
    /// Largest roster that will be built in one call.
    pub max_agents: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            start_hours: vec![0, 4, 8, 12, 16, 20],
            shift_length_hours: 9,
            lunch_offset_hours: 4,
            downtime_offset_hours: 1,
            block_count: 12,
            max_agents: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub shift_hours: f64,
    /// Fraction of paid time lost to breaks, training and absence (0.10 = 10 %).
    pub shrinkage_rate: f64,
    /// Uplift applied to historical volume (0.05 = 5 %).
    pub growth_rate: f64,
    pub concurrency: PerTier<f64>,
    pub weekly_downtime_minutes: f64,
    pub target_aht_minutes: PerTier<ChannelPair<f64>>,
    pub low_volume_cap: CapPolicy,
    pub year_bounds: (i32, i32),
    pub secondary_markers: Vec<String>,
    pub calendar: WorkCalendarConfig,
    pub roster: RosterConfig,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            shift_hours: 8.0,
            shrinkage_rate: 0.10,
            growth_rate: 0.0,
            concurrency: PerTier::new(2.0, 1.5),
            weekly_downtime_minutes: 0.0,
            target_aht_minutes: PerTier::new(
                ChannelPair::new(10.0, 10.0),
                ChannelPair::new(25.0, 25.0),
            ),
            low_volume_cap: CapPolicy::default(),
            year_bounds: (2024, 2030),
            secondary_markers: vec![
                "SLS".to_string(),
                "L2".to_string(),
                "Tier 2".to_string(),
                "Escalation".to_string(),
            ],
            calendar: WorkCalendarConfig::default(),
            roster: RosterConfig::default(),
        }
    }
}

impl PlanningConfig {
    /// Builds a config from the percentage inputs a form would collect.
    pub fn from_percentages(shrinkage_pct: f64, growth_pct: f64, shift_hours: f64) -> Self {
        Self {
            shrinkage_rate: shrinkage_pct / 100.0,
            growth_rate: growth_pct / 100.0,
            shift_hours,
            ..Self::default()
        }
    }

    pub fn concurrency_for(&self, tier: Tier) -> f64 {
        *self.concurrency.get(tier)
    }

    pub fn validate(&self) -> PlanningResult<()> {
        if !self.shift_hours.is_finite() || self.shift_hours <= 0.0 {
            return Err(PlanningError::invalid_config(
                "shift_hours",
                format!("must be positive (got {})", self.shift_hours),
            ));
        }
        if !(0.0..1.0).contains(&self.shrinkage_rate) {
            return Err(PlanningError::invalid_config(
                "shrinkage_rate",
                format!("must be in [0, 1) (got {})", self.shrinkage_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.growth_rate) {
            return Err(PlanningError::invalid_config(
                "growth_rate",
                format!("must be in [0, 1] (got {})", self.growth_rate),
            ));
        }
        for tier in Tier::ALL {
            let c = self.concurrency_for(tier);
            if !c.is_finite() || c <= 0.0 {
                return Err(PlanningError::invalid_config(
                    "concurrency",
                    format!("{tier} concurrency must be positive (got {c})"),
                ));
            }
            let targets = self.target_aht_minutes.get(tier);
            if targets.email < 0.0 || targets.chat < 0.0 {
                return Err(PlanningError::invalid_config(
                    "target_aht_minutes",
                    format!("{tier} target AHT must not be negative"),
                ));
            }
        }
        if !self.weekly_downtime_minutes.is_finite() || self.weekly_downtime_minutes < 0.0 {
            return Err(PlanningError::invalid_config(
                "weekly_downtime_minutes",
                format!("must not be negative (got {})", self.weekly_downtime_minutes),
            ));
        }
        if self.year_bounds.0 > self.year_bounds.1 {
            return Err(PlanningError::invalid_config(
                "year_bounds",
                format!("{} is after {}", self.year_bounds.0, self.year_bounds.1),
            ));
        }
        if self.calendar.working_days().is_empty() {
            return Err(PlanningError::invalid_config(
                "calendar.working_days",
                "at least one working day is required",
            ));
        }

        let roster = &self.roster;
        if roster.start_hours.is_empty() {
            return Err(PlanningError::invalid_config(
                "roster.start_hours",
                "at least one start hour is required",
            ));
        }
        if let Some(hour) = roster.start_hours.iter().find(|h| **h > 23) {
            return Err(PlanningError::invalid_config(
                "roster.start_hours",
                format!("start hour {hour} is outside 0-23"),
            ));
        }
        if roster.shift_length_hours == 0 || roster.shift_length_hours > 24 {
            return Err(PlanningError::invalid_config(
                "roster.shift_length_hours",
                "must be between 1 and 24",
            ));
        }
        if roster.lunch_offset_hours >= roster.shift_length_hours
            || roster.downtime_offset_hours >= roster.shift_length_hours
        {
            return Err(PlanningError::invalid_config(
                "roster",
                "lunch and downtime offsets must fall inside the shift",
            ));
        }
        if roster.block_count == 0 || 24 % roster.block_count != 0 {
            return Err(PlanningError::invalid_config(
                "roster.block_count",
                format!("must divide 24 (got {})", roster.block_count),
            ));
        }
        if roster.max_agents == 0 {
            return Err(PlanningError::invalid_config(
                "roster.max_agents",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Rejects periods outside the configured planning horizon.
    pub fn validate_period(&self, period: Period) -> PlanningResult<()> {
        let (start, end) = self.year_bounds;
        if period.year() < start || period.year() > end {
            return Err(PlanningError::invalid_config(
                "year_bounds",
                format!("{period} is outside {start}-{end}"),
            ));
        }
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> PlanningResult<Self> {
        let file = File::open(path)?;
        let config: PlanningConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> PlanningResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
