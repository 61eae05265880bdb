pub mod credentials;
pub mod schema;
pub mod token;
pub mod user;

use std::sync::Arc;

use thiserror::Error;

use praxis_sql::{QueryErrorKind, SqlError, SqlStore};

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    /// The hashing primitive itself failed.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// A stored hash is not a recognizable bcrypt encoding.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SqlError> for AuthError {
    fn from(e: SqlError) -> Self {
        match e.kind() {
            Some(QueryErrorKind::UniqueViolation) => AuthError::Conflict(e.to_string()),
            Some(QueryErrorKind::ForeignKeyViolation) => {
                AuthError::Validation("related record not found".into())
            }
            Some(QueryErrorKind::NotNullViolation) => {
                AuthError::Validation("required field missing".into())
            }
            _ => AuthError::Storage(e.to_string()),
        }
    }
}

impl From<AuthError> for praxis_core::ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                praxis_core::ServiceError::Unauthorized("invalid credentials".into())
            }
            AuthError::NotFound(m) => praxis_core::ServiceError::NotFound(m),
            AuthError::Conflict(m) => praxis_core::ServiceError::Conflict(m),
            AuthError::Validation(m) => praxis_core::ServiceError::Validation(m),
            AuthError::Hashing(m) | AuthError::MalformedHash(m) | AuthError::Internal(m) => {
                praxis_core::ServiceError::Internal(m)
            }
            AuthError::Storage(m) => praxis_core::ServiceError::Storage(m),
        }
    }
}

/// Session token verification failure. The two modes are distinct so the
/// middleware can answer differently for each.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, bad encoding, or any payload tampering.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Well-formed and correctly signed, but past its expiry.
    #[error("token expired")]
    Expired,
}

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Token lifetime in seconds (default: 7 days).
    pub token_ttl_secs: i64,
    /// bcrypt work factor (default: 12, i.e. 2^12 rounds).
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "praxis-dev-secret-change-me".to_string(),
            token_ttl_secs: 604_800, // 7 days
            bcrypt_cost: 12,
        }
    }
}

/// The Auth service. Holds the storage backend and configuration.
pub struct AuthService {
    pub(crate) sql: Arc<dyn SqlStore>,
    pub(crate) config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService, initializing the DB schema.
    pub fn new(sql: Arc<dyn SqlStore>, config: AuthConfig) -> Result<Arc<Self>, AuthError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, config }))
    }

    /// The storage handle, for modules that share the same database.
    pub fn sql(&self) -> &Arc<dyn SqlStore> {
        &self.sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_error_kinds_translate() {
        let dup = SqlError::query(QueryErrorKind::UniqueViolation, "dup email");
        assert!(matches!(AuthError::from(dup), AuthError::Conflict(_)));

        let fk = SqlError::query(QueryErrorKind::ForeignKeyViolation, "no such row");
        assert!(matches!(AuthError::from(fk), AuthError::Validation(_)));

        let other = SqlError::Connection("gone".into());
        assert!(matches!(AuthError::from(other), AuthError::Storage(_)));
    }

    #[test]
    fn invalid_credentials_maps_to_401() {
        let se: praxis_core::ServiceError = AuthError::InvalidCredentials.into();
        assert_eq!(se.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        // Uniform message — no account enumeration.
        assert_eq!(se.to_string(), "invalid credentials");
    }
}
