use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use auth::model::AuthUser;
use praxis_core::{Pagination, ServiceError};

use crate::api::AppState;
use crate::model::{CreateClient, UpdateClient};
use crate::service::clients::ClientFilter;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub person_type: Option<String>,
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
    let filter = ClientFilter {
        search: params.search,
        person_type: params.person_type,
        page: params.page,
        limit: params.limit,
    };
    let (clients, total) = svc.list_clients(&filter).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "clients": clients,
        "pagination": Pagination::new(params.page, params.limit, total),
    })))
}

pub async fn get(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let client = svc.get_client(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "client": client })))
}

pub async fn create(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateClient>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let client = svc
        .create_client(input, user.id)
        .map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "client created",
            "client": client,
        })),
    ))
}

pub async fn update(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateClient>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let client = svc.update_client(id, input).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "message": "client updated",
        "client": client,
    })))
}

pub async fn delete(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    use auth::model::Role;
    user.require_role(&[Role::Admin, Role::Office])?;

    svc.delete_client(id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "message": "client deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

pub async fn autocomplete(
    State(svc): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let clients = svc
        .autocomplete_clients(&params.q)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "clients": clients })))
}

pub async fn stats(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc.client_stats().map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}
