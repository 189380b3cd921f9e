use crate::bulk::{self, BulkPlan};
use crate::calendar::WorkCalendar;
use crate::config::PlanningConfig;
use crate::error::{PlanningError, PlanningResult};
use crate::intraday::{self, HourlyTotal, IntradayPlan};
use crate::model::{Period, PerTier};
use crate::roster::{self, BlockAssignment, CyclicAssignment, Roster, ShiftAssignmentStrategy};
use crate::sizing::{self, PeriodSizing};
use crate::tables::{PeriodRecord, RawEvent};
use crate::workload::ChannelWorkload;
use chrono::Weekday;
use log::info;
use serde::{Deserialize, Serialize};

/// How agents are placed on start hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    #[default]
    Cyclic,
    /// Start agents according to demand-weighted shift blocks.
    Blocks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub period_count: usize,
    pub unmatched_count: usize,
    pub latest_period: Option<Period>,
    pub latest_headcount: Option<u32>,
    pub peak_headcount: Option<u32>,
    pub intraday_period: Option<Period>,
    pub peak_hour: Option<HourlyTotal>,
    pub roster_agents: Option<usize>,
    pub thinnest_day: Option<(Weekday, usize)>,
}

impl PlanSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("periods={}", self.period_count));
        if self.unmatched_count > 0 {
            parts.push(format!("unmatched={}", self.unmatched_count));
        }
        if let (Some(period), Some(headcount)) = (self.latest_period, self.latest_headcount) {
            parts.push(format!("latest={period}:{headcount}"));
        }
        if let Some(peak) = self.peak_headcount {
            parts.push(format!("peak={peak}"));
        }
        if let Some(period) = self.intraday_period {
            parts.push(format!("intraday={period}"));
        }
        if let Some(hour) = self.peak_hour {
            parts.push(format!(
                "peak_hour={:02}:00({})",
                hour.hour, hour.headcount_target
            ));
        }
        if let Some(agents) = self.roster_agents {
            parts.push(format!("agents={agents}"));
        }
        if let Some((day, count)) = self.thinnest_day {
            parts.push(format!("thinnest={}:{count}", roster::day_name(day)));
        }
        parts.join(", ")
    }
}

/// Holds one run's configuration and calendar so callers don't thread them
/// through every call. Carries no results between calls.
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlanningConfig,
    calendar: WorkCalendar,
}

impl Planner {
    pub fn new(config: PlanningConfig) -> PlanningResult<Self> {
        config.validate()?;
        let calendar = WorkCalendar::from_config(&config.calendar);
        Ok(Self { config, calendar })
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn size_period(
        &self,
        period: Period,
        channels: &[ChannelWorkload],
    ) -> PlanningResult<PeriodSizing> {
        self.config.validate_period(period)?;
        Ok(sizing::size_period(
            period,
            channels,
            &self.config,
            &self.calendar,
        ))
    }

    pub fn aggregate(
        &self,
        volume: &[PeriodRecord],
        aht: &[PeriodRecord],
    ) -> PlanningResult<BulkPlan> {
        bulk::aggregate(volume, aht, &self.config, &self.calendar)
    }

    pub fn disaggregate(
        &self,
        events: &[RawEvent],
        bulk: &BulkPlan,
    ) -> PlanningResult<IntradayPlan> {
        intraday::disaggregate(events, bulk, &self.config, &self.calendar)
    }

    /// Roster for an explicit headcount using the cyclic start-hour pattern.
    pub fn build_roster(
        &self,
        total_headcount: u32,
        per_tier: Option<PerTier<u32>>,
    ) -> PlanningResult<Roster> {
        self.check_roster_size(total_headcount)?;
        let strategy = CyclicAssignment::new(self.config.roster.clone());
        roster::build_roster(total_headcount, per_tier, &strategy)
    }

    fn check_roster_size(&self, total_headcount: u32) -> PlanningResult<()> {
        let limit = self.config.roster.max_agents;
        if total_headcount > limit {
            return Err(PlanningError::InvalidInput(format!(
                "roster of {total_headcount} agents exceeds the configured limit of {limit}"
            )));
        }
        Ok(())
    }

    /// Roster sized from an intraday result. Shift blocks are always
    /// reconciled against the target curve and attached to the roster.
    pub fn roster_for(&self, plan: &IntradayPlan, mode: AssignmentMode) -> PlanningResult<Roster> {
        let total = plan.monthly_total();
        self.check_roster_size(total)?;
        let blocks =
            roster::reconcile_blocks(&plan.target_curve(), self.config.roster.block_count, total)?;
        let strategy: Box<dyn ShiftAssignmentStrategy> = match mode {
            AssignmentMode::Cyclic => Box::new(CyclicAssignment::new(self.config.roster.clone())),
            AssignmentMode::Blocks => {
                Box::new(BlockAssignment::new(self.config.roster.clone(), &blocks))
            }
        };
        let mut roster =
            roster::build_roster(total, Some(plan.monthly_headcount), strategy.as_ref())?;
        roster.blocks = Some(blocks);
        info!(
            "roster for {} built with {} assignment",
            plan.period,
            match mode {
                AssignmentMode::Cyclic => "cyclic",
                AssignmentMode::Blocks => "block",
            }
        );
        Ok(roster)
    }

    pub fn summary(
        &self,
        bulk: &BulkPlan,
        intraday: Option<&IntradayPlan>,
        roster: Option<&Roster>,
    ) -> PlanSummary {
        let latest = bulk.rows.last();
        PlanSummary {
            period_count: bulk.rows.len(),
            unmatched_count: bulk.unmatched_periods.len(),
            latest_period: latest.map(|r| r.period),
            latest_headcount: latest.map(|r| r.total_headcount),
            peak_headcount: bulk.rows.iter().map(|r| r.total_headcount).max(),
            intraday_period: intraday.map(|p| p.period),
            peak_hour: intraday.and_then(IntradayPlan::peak_hour),
            roster_agents: roster.map(Roster::total_agents),
            thinnest_day: roster.and_then(|r| {
                r.coverage_by_day()
                    .into_iter()
                    .min_by_key(|(_, count)| *count)
            }),
        }
    }
}
