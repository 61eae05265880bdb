use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use auth::model::AuthUser;
use praxis_core::{Pagination, ServiceError};

use crate::api::AppState;
use crate::model::{CreateAppointment, UpdateAppointment};
use crate::service::appointments::AppointmentFilter;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

pub async fn list(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let filter = AppointmentFilter {
        search: params.search,
        status: params.status,
        from: params.from,
        to: params.to,
        page: params.page,
        limit: params.limit,
    };
    let (appointments, total) = svc
        .list_appointments(&filter)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "appointments": appointments,
        "pagination": Pagination::new(params.page, params.limit, total),
    })))
}

pub async fn get(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let appointment = svc.get_appointment(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "appointment": appointment })))
}

pub async fn create(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateAppointment>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let appointment = svc
        .create_appointment(input, user.id)
        .map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "appointment created",
            "appointment": appointment,
        })),
    ))
}

pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateAppointment>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let appointment = svc
        .update_appointment(id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "appointment updated",
        "appointment": appointment,
    })))
}

pub async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_appointment(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "appointment deleted" })))
}

pub async fn stats(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc.appointment_stats().map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}
