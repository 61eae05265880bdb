mod appointments;
mod clients;
mod dashboard;
mod lawyers;
mod leads;
mod schedule;
mod settings;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use auth::service::AuthService;

use crate::service::OfficeService;

/// Shared application state.
pub type AppState = Arc<OfficeService>;

/// Build the office API router. Every route requires authentication;
/// role gates are applied per handler.
pub fn build_router(svc: Arc<OfficeService>, auth_svc: Arc<AuthService>) -> Router {
    Router::new()
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/{id}",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route("/clients/search/autocomplete", get(clients::autocomplete))
        .route("/clients/stats/overview", get(clients::stats))
        .route("/crm/leads", get(leads::list).post(leads::create))
        .route(
            "/crm/leads/{id}",
            get(leads::get).put(leads::update).delete(leads::delete),
        )
        .route("/crm/leads/{id}/convert", post(leads::convert))
        .route("/crm/stats", get(leads::stats))
        .route("/crm/funnel", get(leads::funnel))
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/{id}",
            get(appointments::get)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/appointments/stats/overview", get(appointments::stats))
        .route("/schedule", get(schedule::list).post(schedule::create))
        .route(
            "/schedule/{id}",
            get(schedule::get)
                .put(schedule::update)
                .delete(schedule::delete),
        )
        .route("/schedule/today", get(schedule::today))
        .route("/schedule/upcoming", get(schedule::upcoming))
        .route("/lawyers", get(lawyers::list).post(lawyers::create))
        .route(
            "/lawyers/{id}",
            put(lawyers::update).delete(lawyers::deactivate),
        )
        .route("/settings", get(settings::get).put(settings::update))
        .route(
            "/settings/notifications",
            get(settings::get_notifications).put(settings::update_notifications),
        )
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/chart", get(dashboard::chart))
        .route("/dashboard/upcoming", get(dashboard::upcoming))
        .route("/dashboard/leads-by-source", get(dashboard::leads_by_source))
        .route("/dashboard/recent-activity", get(dashboard::recent_activity))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_svc,
            auth::api::authenticate,
        ))
        .with_state(svc)
}
