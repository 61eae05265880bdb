use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use praxis_core::ServiceError;

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "month".to_string()
}

pub async fn stats(
    State(svc): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc
        .dashboard_stats(&params.period)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

pub async fn chart(
    State(svc): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let points = svc
        .dashboard_chart(&params.period)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "points": points })))
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    5
}

pub async fn upcoming(
    State(svc): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let entries = svc
        .dashboard_upcoming(params.limit)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

pub async fn leads_by_source(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let sources = svc.leads_by_source().map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "sources": sources })))
}

pub async fn recent_activity(
    State(svc): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let activity = svc
        .recent_activity(params.limit)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "activity": activity })))
}
