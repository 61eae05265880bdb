//! Bootstrap — startup checks and first-run admin seeding.
//!
//! When praxisd starts:
//! 1. Verify the configuration is complete — refuse to start otherwise.
//! 2. If the users table is empty, create the configured administrator.

use std::sync::Arc;

use tracing::info;

use auth::model::{RegisterRequest, Role};
use auth::service::AuthService;

use crate::config::ServerConfig;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!(
            "JWT secret is empty. Set [jwt].secret in the config file \
             or the PRAXIS_JWT_SECRET environment variable."
        );
    }
    if config.auth.bcrypt_cost < 4 || config.auth.bcrypt_cost > 31 {
        anyhow::bail!(
            "bcrypt cost {} is out of range (4..=31)",
            config.auth.bcrypt_cost
        );
    }
    Ok(())
}

/// Seed the first administrator account on an empty database.
pub fn ensure_admin_user(
    auth_svc: &Arc<AuthService>,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    if auth_svc.count_users().map_err(|e| anyhow::anyhow!(e))? > 0 {
        return Ok(());
    }

    if config.admin.email.is_empty() || config.admin.password.is_empty() {
        anyhow::bail!(
            "The database has no users and no [admin] seed credentials are \
             configured. Set [admin].email and [admin].password (or the \
             PRAXIS_ADMIN_EMAIL / PRAXIS_ADMIN_PASSWORD environment variables)."
        );
    }

    let admin = auth_svc
        .register(
            RegisterRequest {
                name: "Administrator".into(),
                email: config.admin.email.clone(),
                password: config.admin.password.clone(),
                role: Some(Role::Admin),
            },
            None,
            None,
        )
        .map_err(|e| anyhow::anyhow!("failed to seed admin user: {}", e))?;

    info!("Seeded administrator account {} (id {})", admin.email, admin.id);
    Ok(())
}
