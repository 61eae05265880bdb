//! Password hashing and verification.
//!
//! bcrypt with a configurable work factor (default 12). The comparison
//! inside `bcrypt::verify` is constant-time, so a mismatch leaks no
//! information about where the difference is.

use bcrypt::BcryptError;

use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Hash a plaintext password for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.config.bcrypt_cost)
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` for a non-matching password; errs only when
    /// the stored hash is not a recognizable bcrypt encoding.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        match bcrypt::verify(password, hash) {
            Ok(matches) => Ok(matches),
            Err(
                e @ (BcryptError::InvalidHash(_)
                | BcryptError::InvalidPrefix(_)
                | BcryptError::InvalidBase64(_)),
            ) => Err(AuthError::MalformedHash(e.to_string())),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use praxis_sql::SqliteStore;

    use crate::service::{AuthConfig, AuthError, AuthService};

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        // Minimum cost keeps the test suite fast; production default is 12.
        let config = AuthConfig {
            bcrypt_cost: 4,
            ..Default::default()
        };
        AuthService::new(sql, config).unwrap()
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let svc = test_service();
        let hash = svc.hash_password("secret1").unwrap();
        assert_ne!(hash, "secret1");
        assert!(svc.verify_password("secret1", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let svc = test_service();
        let hash = svc.hash_password("secret1").unwrap();
        assert!(!svc.verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let svc = test_service();
        let a = svc.hash_password("secret1").unwrap();
        let b = svc.hash_password("secret1").unwrap();
        assert_ne!(a, b);
        assert!(svc.verify_password("secret1", &a).unwrap());
        assert!(svc.verify_password("secret1", &b).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let svc = test_service();
        let err = svc.verify_password("secret1", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, AuthError::MalformedHash(_)));
    }

    #[test]
    fn hash_encodes_configured_cost() {
        let svc = test_service();
        let hash = svc.hash_password("secret1").unwrap();
        // bcrypt encodings carry the cost: $2b$04$...
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$04$"));
    }
}
