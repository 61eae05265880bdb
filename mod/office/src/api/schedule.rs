use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use auth::model::AuthUser;
use praxis_core::ServiceError;

use crate::api::AppState;
use crate::model::CreateScheduleEntry;
use crate::service::schedule::ScheduleFilter;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub lawyer_id: Option<i64>,
}

pub async fn list(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let filter = ScheduleFilter {
        from: params.from,
        to: params.to,
        kind: params.kind,
        status: params.status,
        client_id: params.client_id,
        lawyer_id: params.lawyer_id,
    };
    let entries = svc.list_schedule(&filter).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

pub async fn get(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let entry = svc.get_schedule_entry(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "entry": entry })))
}

pub async fn create(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateScheduleEntry>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let entry = svc
        .create_schedule_entry(input, user.id)
        .map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "schedule entry created",
            "entry": entry,
        })),
    ))
}

pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CreateScheduleEntry>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let entry = svc
        .update_schedule_entry(id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "schedule entry updated",
        "entry": entry,
    })))
}

pub async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_schedule_entry(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "schedule entry deleted" })))
}

pub async fn today(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let entries = svc.schedule_today().map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    #[serde(default = "default_upcoming_limit")]
    pub limit: u32,
}

fn default_upcoming_limit() -> u32 {
    5
}

pub async fn upcoming(
    State(svc): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let entries = svc
        .schedule_upcoming(params.limit)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}
