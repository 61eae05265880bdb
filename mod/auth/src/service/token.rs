//! Session token issuance and verification.
//!
//! Stateless HS256 JWTs binding {user id, role, issued-at, expiry}.
//! Nothing is persisted; validity is signature + expiry alone.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::model::{Claims, Role};
use crate::service::{AuthService, TokenError};

impl AuthService {
    /// Issue a signed token for a user.
    pub fn issue_token(&self, user_id: i64, role: Role) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.config.token_ttl_secs,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Verify and decode a token.
    ///
    /// `TokenError::Expired` only when the signature checked out and the
    /// expiry has passed; any tampering is `TokenError::Invalid`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use praxis_sql::SqliteStore;

    use crate::model::{Claims, Role};
    use crate::service::{AuthConfig, AuthService, TokenError};

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = AuthConfig {
            bcrypt_cost: 4,
            ..Default::default()
        };
        AuthService::new(sql, config).unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let svc = test_service();
        let token = svc.issue_token(42, Role::Lawyer).unwrap();

        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Lawyer);
        assert_eq!(claims.exp, claims.iat + 604_800);
    }

    #[test]
    fn expired_token_is_expired_not_invalid() {
        let svc = test_service();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 42,
            role: Role::Lawyer,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = svc.sign(&claims).unwrap();

        let err = svc.verify_token(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let svc = test_service();
        let token = svc.issue_token(42, Role::Lawyer).unwrap();

        // Flip one character inside the payload segment.
        let mut bytes = token.into_bytes();
        let dot = bytes.iter().position(|&b| b == b'.').unwrap();
        let idx = dot + 2;
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let err = svc.verify_token(&tampered).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let svc = test_service();
        let err = svc.verify_token("this.is.not.a.valid.jwt").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let svc = test_service();

        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let other = AuthService::new(
            sql,
            AuthConfig {
                jwt_secret: "a-different-secret".to_string(),
                bcrypt_cost: 4,
                ..Default::default()
            },
        )
        .unwrap();

        let token = other.issue_token(42, Role::Admin).unwrap();
        let err = svc.verify_token(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
