//! Profile endpoints for the authenticated user.

use axum::extract::{Extension, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use praxis_core::ServiceError;

use crate::api::{client_meta, AppState};
use crate::model::{AuthUser, ChangePasswordRequest, UpdateProfileRequest};

pub async fn get_profile(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let profile = svc.get_user(user.id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(profile).unwrap_or_default()))
}

pub async fn update_profile(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let profile = svc
        .update_profile(user.id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "profile updated",
        "user": profile,
    })))
}

pub async fn change_password(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(input): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let (ip, user_agent) = client_meta(&headers);
    svc.change_password(user.id, input, ip.as_deref(), user_agent.as_deref())
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "password changed" })))
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    /// Another user's activity — admins only (ownership gate).
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default = "default_activity_limit")]
    pub limit: u32,
}

fn default_activity_limit() -> u32 {
    20
}

pub async fn activity(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let target = params.user_id.unwrap_or(user.id);
    user.require_owner_or_admin(target)?;

    let entries = svc
        .list_activity(target, params.limit.min(100))
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "activity": entries })))
}

/// Self-deactivation (soft delete).
pub async fn deactivate(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let (ip, user_agent) = client_meta(&headers);
    svc.deactivate_user(user.id, ip.as_deref(), user_agent.as_deref())
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "account deactivated" })))
}
