//! Office module — the practice-management business resources.
//!
//! # Resources
//!
//! - **Client** — the office's client roster
//! - **Lead** — CRM pipeline entries, convertible into clients
//! - **Appointment** — client sessions with optional lawyer assignment
//! - **Schedule entry** — the calendar, with lawyer conflict detection
//! - **Lawyer** — user accounts joined with professional records
//! - **Settings** — per-user preferences
//! - **Dashboard** — aggregation queries over all of the above

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use auth::service::AuthService;
use praxis_core::Module;

use crate::service::OfficeService;

/// Office module implementing the Module trait.
pub struct OfficeModule {
    service: Arc<OfficeService>,
    auth: Arc<AuthService>,
}

impl OfficeModule {
    /// Create a new OfficeModule. The auth service provides password
    /// hashing for lawyer accounts and the authentication middleware.
    pub fn new(
        sql: Arc<dyn praxis_sql::SqlStore>,
        auth: Arc<AuthService>,
    ) -> Result<Self, praxis_core::ServiceError> {
        let service = OfficeService::new(sql, Arc::clone(&auth))
            .map_err(praxis_core::ServiceError::from)?;
        Ok(Self { service, auth })
    }

    /// Get a reference to the underlying OfficeService.
    pub fn service(&self) -> &Arc<OfficeService> {
        &self.service
    }
}

impl Module for OfficeModule {
    fn name(&self) -> &str {
        "office"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone(), self.auth.clone())
    }
}
