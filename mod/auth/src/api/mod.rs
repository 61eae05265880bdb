mod account;
pub mod middleware;
mod profile;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

pub use middleware::authenticate;

/// Build the auth API router. Paths are absolute.
///
/// Login and register are public; everything else sits behind the
/// authentication middleware.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    let public = Router::new()
        .route("/auth/login", post(account::login))
        .route("/auth/register", post(account::register));

    let protected = Router::new()
        .route("/auth/me", get(account::me))
        .route(
            "/profile",
            get(profile::get_profile)
                .put(profile::update_profile)
                .delete(profile::deactivate),
        )
        .route("/profile/password", put(profile::change_password))
        .route("/profile/activity", get(profile::activity))
        .route_layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::authenticate,
        ));

    Router::new().merge(public).merge(protected).with_state(svc)
}

/// Best-effort client address and user agent for audit entries.
pub(crate) fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    (ip, user_agent)
}
