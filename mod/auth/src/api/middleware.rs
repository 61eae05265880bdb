//! Bearer-token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies it, loads the user
//! row and attaches [`AuthUser`] to request extensions. Terminal states
//! each answer differently: missing header is 401, invalid and expired
//! tokens are 403 (with distinguishable messages), unknown or
//! deactivated users are 401.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::model::AuthUser;
use crate::service::{AuthService, TokenError};

/// Why a request was rejected before reaching its handler.
#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    TokenInvalid(String),
    TokenExpired,
    UnknownUser,
    Inactive,
    Internal(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AuthRejection::MissingToken => {
                (StatusCode::UNAUTHORIZED, "access token required".to_string())
            }
            AuthRejection::TokenInvalid(e) => {
                (StatusCode::FORBIDDEN, format!("invalid token: {}", e))
            }
            AuthRejection::TokenExpired => (StatusCode::FORBIDDEN, "token expired".to_string()),
            AuthRejection::UnknownUser => (StatusCode::UNAUTHORIZED, "user not found".to_string()),
            AuthRejection::Inactive => {
                (StatusCode::UNAUTHORIZED, "user is deactivated".to_string())
            }
            AuthRejection::Internal(e) => {
                tracing::error!("authentication failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        let body = serde_json::json!({ "error": msg });
        (status, axum::Json(body)).into_response()
    }
}

/// Middleware guarding every protected route.
pub async fn authenticate(
    State(svc): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let token = extract_bearer(request.headers()).ok_or(AuthRejection::MissingToken)?;

    let claims = svc.verify_token(token).map_err(|e| match e {
        TokenError::Expired => AuthRejection::TokenExpired,
        TokenError::Invalid(msg) => AuthRejection::TokenInvalid(msg),
    })?;

    // The token is only an assertion; the user row is the truth about
    // whether the account still exists and is active.
    let user = svc
        .load_user(claims.sub)
        .map_err(|e| AuthRejection::Internal(e.to_string()))?
        .ok_or(AuthRejection::UnknownUser)?;

    if !user.active {
        return Err(AuthRejection::Inactive);
    }

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    });

    Ok(next.run(request).await)
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
