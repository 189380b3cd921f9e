pub mod bulk;
pub mod calendar;
pub mod capacity;
pub mod config;
pub mod error;
pub mod intraday;
pub mod model;
pub mod output;
pub mod planner;
pub mod roster;
pub mod sizing;
pub mod tables;
pub mod workload;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use bulk::{BulkPlan, BulkRow, ChannelLoad, aggregate};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::{CapPolicy, PlanningConfig, RosterConfig};
pub use error::{ErrorKind, PlanningError, PlanningResult};
pub use intraday::{HourlyBucket, HourlyTotal, IntradayPlan, disaggregate};
pub use model::{Channel, ChannelPair, PerTier, Period, Tier};
pub use output::{
    load_bulk_plan_json, save_blocks_csv, save_bulk_csv, save_bulk_plan_json, save_hourly_csv,
    save_roster_csv,
};
pub use planner::{AssignmentMode, PlanSummary, Planner};
pub use roster::{
    AgentShift, BlockAssignment, CyclicAssignment, Roster, ShiftAssignmentStrategy, ShiftBlock,
    build_roster, reconcile_blocks,
};
pub use sizing::{PeriodSizing, TierHeadcount, headcount, size_period};
pub use tables::{PeriodRecord, RawEvent};
pub use workload::ChannelWorkload;
