use std::str::FromStr;

use praxis_core::now_rfc3339;
use praxis_sql::{Row, SqlExecutor, Value};

use crate::model::{
    AuditEntry, ChangePasswordRequest, LoginRequest, PublicUser, RegisterRequest, Role,
    UpdateProfileRequest, User,
};
use crate::service::{AuthError, AuthService};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, active, created_at, updated_at";

fn user_from_row(row: &Row) -> Result<User, AuthError> {
    let role = row
        .get_str("role")
        .ok_or_else(|| AuthError::Internal("missing role column".into()))
        .and_then(|r| Role::from_str(r).map_err(AuthError::Internal))?;

    Ok(User {
        id: row
            .get_i64("id")
            .ok_or_else(|| AuthError::Internal("missing id column".into()))?,
        email: row.get_string("email").unwrap_or_default(),
        name: row.get_string("name").unwrap_or_default(),
        password_hash: row.get_string("password_hash").unwrap_or_default(),
        role,
        active: row.get_bool("active").unwrap_or(false),
        created_at: row.get_string("created_at").unwrap_or_default(),
        updated_at: row.get_string("updated_at").unwrap_or_default(),
    })
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    // Same bar as the frontend: something@something.something
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AuthError::Validation("invalid email address".into()));
    }
    Ok(email)
}

impl AuthService {
    /// Register a new user. Enforces unique email, hashes the password,
    /// writes an audit entry.
    pub fn register(
        &self,
        input: RegisterRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<PublicUser, AuthError> {
        let name = input.name.trim().to_string();
        if name.len() < 2 {
            return Err(AuthError::Validation(
                "name must be at least 2 characters".into(),
            ));
        }
        let email = normalize_email(&input.email)?;
        if input.password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        let role = input.role.unwrap_or(Role::Office);

        // Email is unique across active and inactive users.
        let existing = self.sql.query(
            "SELECT id FROM users WHERE email = ?1",
            &[Value::from(email.as_str())],
        )?;
        if !existing.is_empty() {
            return Err(AuthError::Conflict("email already registered".into()));
        }

        let password_hash = self.hash_password(&input.password)?;
        let now = now_rfc3339();
        let id = self.sql.insert(
            "INSERT INTO users (email, name, password_hash, role, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            &[
                Value::from(email.as_str()),
                Value::from(name.as_str()),
                Value::from(password_hash),
                Value::from(role.as_str()),
                Value::from(true),
                Value::from(now.as_str()),
                Value::from(now.as_str()),
            ],
        )?;

        self.record_audit(id, "REGISTER", ip, user_agent)?;

        Ok(PublicUser {
            id,
            name,
            email,
            role,
            created_at: now,
        })
    }

    /// Authenticate by email/password and issue a session token.
    ///
    /// Unknown email and wrong password both come back as
    /// `InvalidCredentials` — the response never says which field failed.
    pub fn login(
        &self,
        input: LoginRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(String, PublicUser), AuthError> {
        let email = normalize_email(&input.email)?;

        let rows = self.sql.query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND active = 1"),
            &[Value::from(email.as_str())],
        )?;
        let user = match rows.first() {
            Some(row) => user_from_row(row)?,
            None => return Err(AuthError::InvalidCredentials),
        };

        if !self.verify_password(&input.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .issue_token(user.id, user.role)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.record_audit(user.id, "LOGIN", ip, user_agent)?;

        Ok((token, user.to_public()))
    }

    /// Load a full user row by id, used by the authentication middleware
    /// on every request. Returns inactive users too — the middleware
    /// distinguishes "unknown" from "deactivated".
    pub fn load_user(&self, id: i64) -> Result<Option<User>, AuthError> {
        let rows = self.sql.query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            &[Value::from(id)],
        )?;
        rows.first().map(user_from_row).transpose()
    }

    /// Public view of a user.
    pub fn get_user(&self, id: i64) -> Result<PublicUser, AuthError> {
        self.load_user(id)?
            .map(|u| u.to_public())
            .ok_or_else(|| AuthError::NotFound(format!("user {} not found", id)))
    }

    /// Update the caller's name and/or email.
    pub fn update_profile(
        &self,
        id: i64,
        input: UpdateProfileRequest,
    ) -> Result<PublicUser, AuthError> {
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.len() < 2 {
                return Err(AuthError::Validation(
                    "name must be at least 2 characters".into(),
                ));
            }
            params.push(Value::from(name));
            sets.push(format!("name = ?{}", params.len()));
        }

        if let Some(email) = input.email {
            let email = normalize_email(&email)?;
            let taken = self.sql.query(
                "SELECT id FROM users WHERE email = ?1 AND id != ?2",
                &[Value::from(email.as_str()), Value::from(id)],
            )?;
            if !taken.is_empty() {
                return Err(AuthError::Conflict("email already registered".into()));
            }
            params.push(Value::from(email));
            sets.push(format!("email = ?{}", params.len()));
        }

        if sets.is_empty() {
            return Err(AuthError::Validation("no fields to update".into()));
        }

        params.push(Value::from(now_rfc3339()));
        sets.push(format!("updated_at = ?{}", params.len()));

        params.push(Value::from(id));
        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );

        let affected = self.sql.exec(&sql, &params)?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("user {} not found", id)));
        }

        self.get_user(id)
    }

    /// Change the caller's password after re-verifying the current one.
    pub fn change_password(
        &self,
        id: i64,
        input: ChangePasswordRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), AuthError> {
        if input.new_password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        let user = self
            .load_user(id)?
            .ok_or_else(|| AuthError::NotFound(format!("user {} not found", id)))?;

        if !self.verify_password(&input.current_password, &user.password_hash)? {
            return Err(AuthError::Validation("current password is incorrect".into()));
        }

        let new_hash = self.hash_password(&input.new_password)?;
        self.sql.exec(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            &[
                Value::from(new_hash),
                Value::from(now_rfc3339()),
                Value::from(id),
            ],
        )?;

        self.record_audit(id, "PASSWORD_CHANGE", ip, user_agent)?;
        Ok(())
    }

    /// Soft-delete: flip the active flag. The row (and its audit trail)
    /// stays.
    pub fn deactivate_user(
        &self,
        id: i64,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), AuthError> {
        let affected = self.sql.exec(
            "UPDATE users SET active = 0, updated_at = ?1 WHERE id = ?2",
            &[Value::from(now_rfc3339()), Value::from(id)],
        )?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("user {} not found", id)));
        }
        self.record_audit(id, "DEACTIVATE", ip, user_agent)?;
        Ok(())
    }

    /// Append an audit entry. Never updated or deleted.
    pub fn record_audit(
        &self,
        user_id: i64,
        action: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), AuthError> {
        self.sql.exec(
            "INSERT INTO audit_log (user_id, action, ip_address, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            &[
                Value::from(user_id),
                Value::from(action),
                Value::from(ip.map(str::to_string)),
                Value::from(user_agent.map(str::to_string)),
                Value::from(now_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Recent audit entries for a user, newest first.
    pub fn list_activity(&self, user_id: i64, limit: u32) -> Result<Vec<AuditEntry>, AuthError> {
        let rows = self.sql.query(
            "SELECT id, user_id, action, ip_address, user_agent, created_at
             FROM audit_log WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
            &[Value::from(user_id), Value::from(limit as i64)],
        )?;

        rows.iter()
            .map(|row| {
                Ok(AuditEntry {
                    id: row
                        .get_i64("id")
                        .ok_or_else(|| AuthError::Internal("missing id column".into()))?,
                    user_id: row.get_i64("user_id").unwrap_or_default(),
                    action: row.get_string("action").unwrap_or_default(),
                    ip_address: row.get_string("ip_address"),
                    user_agent: row.get_string("user_agent"),
                    created_at: row.get_string("created_at").unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Total number of users, active or not. Used by first-start seeding.
    pub fn count_users(&self) -> Result<i64, AuthError> {
        let rows = self.sql.query("SELECT COUNT(*) AS cnt FROM users", &[])?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use praxis_sql::SqliteStore;

    use super::*;
    use crate::service::AuthConfig;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = AuthConfig {
            bcrypt_cost: 4,
            ..Default::default()
        };
        AuthService::new(sql, config).unwrap()
    }

    fn register(svc: &AuthService, email: &str, password: &str, role: Role) -> PublicUser {
        svc.register(
            RegisterRequest {
                name: "Test User".into(),
                email: email.into(),
                password: password.into(),
                role: Some(role),
            },
            Some("127.0.0.1"),
            Some("tests"),
        )
        .unwrap()
    }

    #[test]
    fn register_then_login() {
        let svc = test_service();
        let user = register(&svc, "a@x.com", "secret1", Role::Lawyer);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::Lawyer);

        let (token, logged_in) = svc
            .login(
                LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret1".into(),
                },
                None,
                None,
            )
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(logged_in.role, Role::Lawyer);

        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Lawyer);
    }

    #[test]
    fn login_failures_are_uniform() {
        let svc = test_service();
        register(&svc, "a@x.com", "secret1", Role::Office);

        let wrong_password = svc
            .login(
                LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret2".into(),
                },
                None,
                None,
            )
            .unwrap_err();
        let unknown_email = svc
            .login(
                LoginRequest {
                    email: "b@x.com".into(),
                    password: "secret1".into(),
                },
                None,
                None,
            )
            .unwrap_err();

        // Same error either way — no account enumeration.
        assert_eq!(wrong_password.to_string(), "invalid credentials");
        assert_eq!(unknown_email.to_string(), "invalid credentials");
    }

    #[test]
    fn deactivated_user_cannot_login() {
        let svc = test_service();
        let user = register(&svc, "a@x.com", "secret1", Role::Office);
        svc.deactivate_user(user.id, None, None).unwrap();

        let err = svc
            .login(
                LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret1".into(),
                },
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn duplicate_email_conflicts_even_when_inactive() {
        let svc = test_service();
        let user = register(&svc, "a@x.com", "secret1", Role::Office);
        svc.deactivate_user(user.id, None, None).unwrap();

        let err = svc
            .register(
                RegisterRequest {
                    name: "Other".into(),
                    email: "A@X.com".into(),
                    password: "secret1".into(),
                    role: None,
                },
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn register_validation() {
        let svc = test_service();
        let short_password = svc.register(
            RegisterRequest {
                name: "Ok".into(),
                email: "a@x.com".into(),
                password: "12345".into(),
                role: None,
            },
            None,
            None,
        );
        assert!(matches!(short_password, Err(AuthError::Validation(_))));

        let bad_email = svc.register(
            RegisterRequest {
                name: "Ok".into(),
                email: "not-an-email".into(),
                password: "secret1".into(),
                role: None,
            },
            None,
            None,
        );
        assert!(matches!(bad_email, Err(AuthError::Validation(_))));
    }

    #[test]
    fn change_password_requires_current() {
        let svc = test_service();
        let user = register(&svc, "a@x.com", "secret1", Role::Office);

        let err = svc
            .change_password(
                user.id,
                ChangePasswordRequest {
                    current_password: "wrong".into(),
                    new_password: "secret2".into(),
                },
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        svc.change_password(
            user.id,
            ChangePasswordRequest {
                current_password: "secret1".into(),
                new_password: "secret2".into(),
            },
            None,
            None,
        )
        .unwrap();

        // Old password no longer works, new one does.
        assert!(svc
            .login(
                LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret1".into()
                },
                None,
                None
            )
            .is_err());
        assert!(svc
            .login(
                LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret2".into()
                },
                None,
                None
            )
            .is_ok());
    }

    #[test]
    fn update_profile_checks_email_uniqueness() {
        let svc = test_service();
        let a = register(&svc, "a@x.com", "secret1", Role::Office);
        register(&svc, "b@x.com", "secret1", Role::Office);

        let err = svc
            .update_profile(
                a.id,
                UpdateProfileRequest {
                    name: None,
                    email: Some("b@x.com".into()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let updated = svc
            .update_profile(
                a.id,
                UpdateProfileRequest {
                    name: Some("Renamed".into()),
                    email: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[test]
    fn audit_trail_records_actions() {
        let svc = test_service();
        let user = register(&svc, "a@x.com", "secret1", Role::Office);
        svc.login(
            LoginRequest {
                email: "a@x.com".into(),
                password: "secret1".into(),
            },
            Some("10.0.0.1"),
            Some("test-agent"),
        )
        .unwrap();

        let entries = svc.list_activity(user.id, 10).unwrap();
        let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
        assert!(actions.contains(&"REGISTER"));
        assert!(actions.contains(&"LOGIN"));

        let login = entries.iter().find(|e| e.action == "LOGIN").unwrap();
        assert_eq!(login.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(login.user_agent.as_deref(), Some("test-agent"));
    }
}
