use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use auth::model::{AuthUser, Role};
use praxis_core::ServiceError;

use crate::api::AppState;
use crate::model::{CreateLawyer, UpdateLawyer};

pub async fn list(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let lawyers = svc.list_lawyers().map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "lawyers": lawyers })))
}

/// Lawyer accounts are managed by admins and office staff only.
pub async fn create(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateLawyer>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    user.require_role(&[Role::Admin, Role::Office])?;

    let (lawyer, temp_password) = svc.create_lawyer(input).map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "lawyer created",
            "lawyer": lawyer,
            "temporary_password": temp_password,
        })),
    ))
}

pub async fn update(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateLawyer>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    user.require_role(&[Role::Admin, Role::Office])?;

    let lawyer = svc.update_lawyer(id, input).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "lawyer updated",
        "lawyer": lawyer,
    })))
}

pub async fn deactivate(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    user.require_role(&[Role::Admin, Role::Office])?;

    svc.deactivate_lawyer(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "lawyer deactivated" })))
}
