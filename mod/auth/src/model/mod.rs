use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use praxis_core::ServiceError;

/// User role. A closed set; stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access, bypasses ownership checks.
    Admin,
    /// Office staff.
    Office,
    /// Lawyer.
    Lawyer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Office => "office",
            Role::Lawyer => "lawyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "office" => Ok(Role::Office),
            "lawyer" => Ok(Role::Lawyer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A full user row. Internal only — never serialized, so the password
/// hash cannot leak into a response.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at.clone(),
        }
    }
}

/// The user shape returned by the API. No password field, ever.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

/// The authenticated requester, attached to request extensions by the
/// authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Role gate: reject unless the requester's role is in the allow-list.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ServiceError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "insufficient role for this operation".into(),
            ))
        }
    }

    /// Ownership gate: admins may access anything; everyone else only
    /// resources keyed by their own user id.
    pub fn require_owner_or_admin(&self, owner_id: i64) -> Result<(), ServiceError> {
        if self.role == Role::Admin || self.id == owner_id {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "you can only access your own resources".into(),
            ))
        }
    }
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: i64,
    /// Role at issuance time.
    pub role: Role,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Request body for POST /auth/login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for POST /auth/register.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `office` when omitted.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Request body for PUT /profile.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body for PUT /profile/password.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// One append-only audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: Role) -> AuthUser {
        AuthUser {
            id: 7,
            email: "u@x.com".into(),
            name: "U".into(),
            role,
        }
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::Admin, Role::Office, Role::Lawyer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Lawyer).unwrap(), "\"lawyer\"");
        let r: Role = serde_json::from_str("\"office\"").unwrap();
        assert_eq!(r, Role::Office);
    }

    #[test]
    fn require_role_gate() {
        let user = auth_user(Role::Lawyer);
        assert!(user.require_role(&[Role::Lawyer, Role::Admin]).is_ok());
        assert!(user.require_role(&[Role::Admin]).is_err());
        assert!(user.require_role(&[]).is_err());
    }

    #[test]
    fn owner_or_admin_gate() {
        let admin = auth_user(Role::Admin);
        assert!(admin.require_owner_or_admin(999).is_ok());

        let lawyer = auth_user(Role::Lawyer);
        assert!(lawyer.require_owner_or_admin(7).is_ok());
        let err = lawyer.require_owner_or_admin(8).unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }
}
