use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AssignmentMode, BulkPlan, ErrorKind, IntradayPlan, PerTier, Period, PeriodSizing,
    PlanningConfig, PlanningError, Planner, Roster, tables,
    workload::ChannelWorkload,
};

/// Defaults used when a request carries no `config`. Results are never
/// stored between requests.
#[derive(Clone)]
pub struct AppState {
    defaults: Arc<PlanningConfig>,
}

impl AppState {
    pub fn new(defaults: PlanningConfig) -> Self {
        Self {
            defaults: Arc::new(defaults),
        }
    }

    fn planner(&self, config: Option<PlanningConfig>) -> Result<Planner, ApiError> {
        let config = config.unwrap_or_else(|| self.defaults.as_ref().clone());
        Ok(Planner::new(config)?)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PlanningConfig::default())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Unprocessable(String),
    MissingPrerequisite(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlanningError> for ApiError {
    fn from(value: PlanningError) -> Self {
        let message = value.to_string();
        match value.kind() {
            ErrorKind::Configuration => ApiError::Invalid(message),
            ErrorKind::Parse => ApiError::Unprocessable(message),
            ErrorKind::MissingPrerequisite => ApiError::MissingPrerequisite(message),
            ErrorKind::Internal => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "parse_error", message)
            }
            ApiError::MissingPrerequisite(message) => {
                (StatusCode::CONFLICT, "missing_prerequisite", message)
            }
            ApiError::Internal(message) => {
                warn!("request failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SizeRequest {
    #[serde(default)]
    pub config: Option<PlanningConfig>,
    pub period: Period,
    pub channels: Vec<ChannelWorkload>,
}

/// Tables are sent as delimited text in the same layout the file loaders
/// accept.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub config: Option<PlanningConfig>,
    pub volume_csv: String,
    pub aht_csv: String,
}

#[derive(Debug, Deserialize)]
pub struct IntradayRequest {
    #[serde(default)]
    pub config: Option<PlanningConfig>,
    pub events_csv: String,
    pub bulk: BulkPlan,
}

/// Either an intraday result to size from, or an explicit headcount.
#[derive(Debug, Deserialize)]
pub struct RosterRequest {
    #[serde(default)]
    pub config: Option<PlanningConfig>,
    #[serde(default)]
    pub intraday: Option<IntradayPlan>,
    #[serde(default)]
    pub total_headcount: Option<u32>,
    #[serde(default)]
    pub per_tier: Option<PerTier<u32>>,
    #[serde(default)]
    pub mode: AssignmentMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RosterResponse {
    pub roster: Roster,
    pub coverage_by_day: Vec<DayCoverage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayCoverage {
    pub day: String,
    pub agents: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/size", post(size))
        .route("/bulk", post(bulk))
        .route("/intraday", post(intraday))
        .route("/roster", post(roster))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, defaults: PlanningConfig) -> std::io::Result<()> {
    let app = router(AppState::new(defaults));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn size(
    State(state): State<AppState>,
    Json(request): Json<SizeRequest>,
) -> Result<Json<PeriodSizing>, ApiError> {
    let planner = state.planner(request.config)?;
    let sizing = planner.size_period(request.period, &request.channels)?;
    Ok(Json(sizing))
}

async fn bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkPlan>, ApiError> {
    let planner = state.planner(request.config)?;
    let volume = tables::read_volume_table(request.volume_csv.as_bytes())?;
    let aht = tables::read_aht_table(request.aht_csv.as_bytes())?;
    let plan = planner.aggregate(&volume, &aht)?;
    Ok(Json(plan))
}

async fn intraday(
    State(state): State<AppState>,
    Json(request): Json<IntradayRequest>,
) -> Result<Json<IntradayPlan>, ApiError> {
    let planner = state.planner(request.config)?;
    let events = tables::read_events(request.events_csv.as_bytes())?;
    let plan = planner.disaggregate(&events, &request.bulk)?;
    Ok(Json(plan))
}

async fn roster(
    State(state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> Result<Json<RosterResponse>, ApiError> {
    let planner = state.planner(request.config)?;
    let roster = match (request.intraday, request.total_headcount) {
        (Some(plan), None) => planner.roster_for(&plan, request.mode)?,
        (None, Some(total)) => {
            if request.mode == AssignmentMode::Blocks {
                return Err(ApiError::invalid(
                    "block assignment needs an intraday result",
                ));
            }
            planner.build_roster(total, request.per_tier)?
        }
        _ => {
            return Err(ApiError::invalid(
                "provide exactly one of 'intraday' or 'total_headcount'",
            ));
        }
    };
    let coverage_by_day = roster
        .coverage_by_day()
        .into_iter()
        .map(|(day, agents)| DayCoverage {
            day: crate::roster::day_name(day).to_string(),
            agents,
        })
        .collect();
    Ok(Json(RosterResponse {
        roster,
        coverage_by_day,
    }))
}

