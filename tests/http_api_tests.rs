#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use staffing_planner::{BulkPlan, IntradayPlan, PeriodSizing, http_api};
use tower::util::ServiceExt;

const VOLUME: &str = "period,primary_email,primary_chat,secondary_email,secondary_chat\n2025-01,9000,2691,350,120\n";
const AHT: &str = "period,primary_email,primary_chat,secondary_email,secondary_chat\n2025-01,600,300,1800,1200\n";
const EVENTS: &str = "timestamp,team\n2025-01-06 09:00,FLS\n2025-01-06 09:20,FLS\n2025-01-07 14:00,SLS\n2025-01-07 14:30,FLS\n";

fn new_router() -> axum::Router {
    http_api::router(http_api::AppState::default())
}

async fn post_json(app: axum::Router, uri: &str, payload: Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn size_endpoint_returns_headcount() {
    let payload = json!({
        "period": "2025-01",
        "channels": [
            { "tier": "primary", "channel": "email", "volume": 11691.0, "aht_seconds": 3731.0 }
        ]
    });
    let (status, bytes) = post_json(new_router(), "/size", payload).await;
    assert_eq!(status, StatusCode::OK);
    let sizing: PeriodSizing = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(sizing.business_days, 23);
    assert_eq!(sizing.total_headcount, 37);
}

#[tokio::test]
async fn invalid_config_is_a_bad_request() {
    let payload = json!({
        "config": { "shrinkage_rate": 1.0 },
        "period": "2025-01",
        "channels": []
    });
    let (status, bytes) = post_json(new_router(), "/size", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn bulk_then_intraday_then_roster() {
    let app = new_router();
    let (status, bytes) = post_json(
        app.clone(),
        "/bulk",
        json!({ "volume_csv": VOLUME, "aht_csv": AHT }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bulk: BulkPlan = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(bulk.rows.len(), 1);

    let (status, bytes) = post_json(
        app.clone(),
        "/intraday",
        json!({ "events_csv": EVENTS, "bulk": bulk }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let intraday: IntradayPlan = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(intraday.buckets.len(), 48);

    let (status, bytes) = post_json(
        app,
        "/roster",
        json!({ "intraday": intraday, "mode": "blocks" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["roster"]["agents"].as_array().unwrap().len() as u64,
        u64::from(intraday.monthly_total())
    );
    assert_eq!(body["coverage_by_day"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn intraday_without_matching_bulk_is_a_conflict() {
    let (status, bytes) = post_json(
        new_router(),
        "/intraday",
        json!({ "events_csv": EVENTS, "bulk": BulkPlan::default() }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "missing_prerequisite");
    assert!(body["message"].as_str().unwrap().contains("2025-01"));
}

#[tokio::test]
async fn malformed_table_is_unprocessable() {
    let (status, bytes) = post_json(
        new_router(),
        "/bulk",
        json!({ "volume_csv": "period,primary_email\n2025-01,1\n", "aht_csv": AHT }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "parse_error");
}

#[tokio::test]
async fn roster_needs_exactly_one_source() {
    let (status, _) = post_json(new_router(), "/roster", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = post_json(new_router(), "/roster", json!({ "total_headcount": 7 })).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let coverage = body["coverage_by_day"].as_array().unwrap();
    assert!(coverage.iter().all(|d| d["agents"] == 5));
}

#[tokio::test]
async fn oversized_roster_request_is_rejected() {
    let (status, bytes) = post_json(
        new_router(),
        "/roster",
        json!({ "total_headcount": u32::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().unwrap().contains("limit of 10000"));
}

#[tokio::test]
async fn unreconcilable_blocks_surface_as_internal_error() {
    // Two single-event hours with 7 agents: each block rounds 3.5 to 4, so the
    // empty first block would have to give one back.
    let events = "timestamp,team\n2025-01-06 09:00,FLS\n2025-01-07 15:00,FLS\n";
    let app = new_router();
    let (_, bytes) = post_json(
        app.clone(),
        "/bulk",
        json!({ "volume_csv": VOLUME, "aht_csv": AHT }),
    )
    .await;
    let bulk: BulkPlan = serde_json::from_slice(&bytes).unwrap();
    let (status, bytes) = post_json(
        app.clone(),
        "/intraday",
        json!({ "events_csv": events, "bulk": bulk }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let intraday: IntradayPlan = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(intraday.monthly_total(), 7);

    let (status, bytes) = post_json(
        app,
        "/roster",
        json!({ "intraday": intraday, "mode": "cyclic" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().unwrap().contains("shift block 0"));
}
