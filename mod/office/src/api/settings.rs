use axum::extract::{Extension, State};
use axum::Json;

use auth::model::AuthUser;
use praxis_core::ServiceError;

use crate::api::AppState;
use crate::model::UpdateSettings;

pub async fn get(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let settings = svc.get_settings(user.id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(settings).unwrap_or_default()))
}

pub async fn update(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<UpdateSettings>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let settings = svc
        .update_settings(user.id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "settings updated",
        "settings": settings,
    })))
}

/// Notification flags only — a narrower view of the same row.
pub async fn get_notifications(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let settings = svc.get_settings(user.id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "email_notifications": settings.email_notifications,
        "whatsapp_notifications": settings.whatsapp_notifications,
    })))
}

pub async fn update_notifications(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<UpdateSettings>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let narrowed = UpdateSettings {
        email_notifications: input.email_notifications,
        whatsapp_notifications: input.whatsapp_notifications,
        ..Default::default()
    };
    let settings = svc
        .update_settings(user.id, narrowed)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "notification settings updated",
        "email_notifications": settings.email_notifications,
        "whatsapp_notifications": settings.whatsapp_notifications,
    })))
}
