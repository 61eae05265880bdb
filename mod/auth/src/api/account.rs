//! POST /auth/login, POST /auth/register, GET /auth/me.

use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use praxis_core::ServiceError;

use crate::api::{client_meta, AppState};
use crate::model::{AuthUser, LoginRequest, RegisterRequest};

/// Authenticate and return `{token, user}`. The user object never
/// carries a password field.
pub async fn login(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let (ip, user_agent) = client_meta(&headers);
    let (token, user) = svc
        .login(input, ip.as_deref(), user_agent.as_deref())
        .map_err(ServiceError::from)?;

    Ok(Json(serde_json::json!({
        "token": token,
        "user": user,
    })))
}

/// Create a new account. 409 when the email is already registered.
pub async fn register(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let (ip, user_agent) = client_meta(&headers);
    let user = svc
        .register(input, ip.as_deref(), user_agent.as_deref())
        .map_err(ServiceError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "user created",
            "user": user,
        })),
    ))
}

/// The authenticated user's own record.
pub async fn me(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = svc.get_user(user.id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "user": user })))
}
