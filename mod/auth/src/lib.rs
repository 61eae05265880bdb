//! Auth module — credentials, session tokens and access control.
//!
//! # Responsibilities
//!
//! - **Credentials** — bcrypt password hashing and verification
//! - **Tokens** — stateless JWT issuance and verification
//! - **Middleware** — bearer-token authentication for every protected
//!   route, plus role and ownership gates
//! - **Accounts** — register/login/me and profile endpoints over the
//!   `users` table, with an append-only `audit_log`
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(sql, AuthConfig::default())?;
//! let router = module.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use praxis_core::Module;

use crate::service::{AuthConfig, AuthService};

/// Auth module implementing the Module trait.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule, initializing the users/audit schema.
    pub fn new(
        sql: Arc<dyn praxis_sql::SqlStore>,
        config: AuthConfig,
    ) -> Result<Self, praxis_core::ServiceError> {
        let service = AuthService::new(sql, config)
            .map_err(praxis_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
