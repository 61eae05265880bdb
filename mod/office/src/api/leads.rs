use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use auth::model::AuthUser;
use praxis_core::{Pagination, ServiceError};

use crate::api::AppState;
use crate::model::{CreateLead, UpdateLead};
use crate::service::leads::LeadFilter;

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
    pub platform: Option<String>,
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
    let filter = LeadFilter {
        search: params.search,
        status: params.status,
        platform: params.platform,
        page: params.page,
        limit: params.limit,
    };
    let (leads, total) = svc.list_leads(&filter).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "leads": leads,
        "pagination": Pagination::new(params.page, params.limit, total),
    })))
}

pub async fn get(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let lead = svc.get_lead(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "lead": lead })))
}

pub async fn create(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateLead>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let lead = svc.create_lead(input, user.id).map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "lead created",
            "lead": lead,
        })),
    ))
}

pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateLead>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let lead = svc.update_lead(&id, input).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "lead updated",
        "lead": lead,
    })))
}

/// Lead → client conversion; transactional in the service.
pub async fn convert(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let client = svc.convert_lead(&id, user.id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "lead converted to client",
        "client": client,
    })))
}

pub async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_lead(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "lead deleted" })))
}

pub async fn stats(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc.lead_stats().map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

pub async fn funnel(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let funnel = svc.lead_funnel().map_err(ServiceError::from)?;
    let stages: Vec<serde_json::Value> = funnel
        .into_iter()
        .map(|(status, count)| serde_json::json!({"status": status, "count": count}))
        .collect();
    Ok(Json(serde_json::json!({ "funnel": stages })))
}
