pub mod appointments;
pub mod clients;
pub mod dashboard;
pub mod lawyers;
pub mod leads;
pub mod schedule;
pub mod schema;
pub mod settings;

use std::sync::Arc;

use thiserror::Error;

use auth::service::AuthService;
use praxis_sql::{QueryErrorKind, SqlError, SqlExecutor, SqlStore};

/// Office service error type.
#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SqlError> for OfficeError {
    fn from(e: SqlError) -> Self {
        match e.kind() {
            Some(QueryErrorKind::UniqueViolation) => OfficeError::Conflict(e.to_string()),
            Some(QueryErrorKind::ForeignKeyViolation) => {
                OfficeError::Validation("related record not found".into())
            }
            Some(QueryErrorKind::NotNullViolation) => {
                OfficeError::Validation("required field missing".into())
            }
            _ => OfficeError::Storage(e.to_string()),
        }
    }
}

impl From<auth::service::AuthError> for OfficeError {
    fn from(e: auth::service::AuthError) -> Self {
        use auth::service::AuthError;
        match e {
            AuthError::NotFound(m) => OfficeError::NotFound(m),
            AuthError::Conflict(m) => OfficeError::Conflict(m),
            AuthError::Validation(m) => OfficeError::Validation(m),
            AuthError::Storage(m) => OfficeError::Storage(m),
            other => OfficeError::Internal(other.to_string()),
        }
    }
}

impl From<OfficeError> for praxis_core::ServiceError {
    fn from(e: OfficeError) -> Self {
        match e {
            OfficeError::NotFound(m) => praxis_core::ServiceError::NotFound(m),
            OfficeError::Conflict(m) => praxis_core::ServiceError::Conflict(m),
            OfficeError::Validation(m) => praxis_core::ServiceError::Validation(m),
            OfficeError::Storage(m) => praxis_core::ServiceError::Storage(m),
            OfficeError::Internal(m) => praxis_core::ServiceError::Internal(m),
        }
    }
}

/// The Office service. Business CRUD over the shared SQL store; leans
/// on the auth service for password hashing when creating lawyer
/// accounts.
pub struct OfficeService {
    pub(crate) sql: Arc<dyn SqlStore>,
    pub(crate) auth: Arc<AuthService>,
}

impl OfficeService {
    /// Create a new OfficeService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SqlStore>,
        auth: Arc<AuthService>,
    ) -> Result<Arc<Self>, OfficeError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, auth }))
    }

    /// The auth service this module shares a database with.
    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    /// Run a COUNT query and unwrap the single `cnt` column.
    pub(crate) fn count(
        &self,
        sql: &str,
        params: &[praxis_sql::Value],
    ) -> Result<i64, OfficeError> {
        let rows = self.sql.query(sql, params)?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0))
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use auth::model::{RegisterRequest, Role};
    use auth::service::{AuthConfig, AuthService};
    use praxis_sql::SqliteStore;

    use super::OfficeService;

    /// Fresh in-memory service pair for tests.
    pub fn test_service() -> Arc<OfficeService> {
        let sql: Arc<dyn praxis_sql::SqlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let auth = AuthService::new(
            Arc::clone(&sql),
            AuthConfig {
                bcrypt_cost: 4,
                ..Default::default()
            },
        )
        .unwrap();
        OfficeService::new(sql, auth).unwrap()
    }

    /// Register a user and return its id.
    pub fn seed_user(svc: &OfficeService, email: &str, role: Role) -> i64 {
        svc.auth
            .register(
                RegisterRequest {
                    name: "Seed User".into(),
                    email: email.into(),
                    password: "secret1".into(),
                    role: Some(role),
                },
                None,
                None,
            )
            .unwrap()
            .id
    }
}
