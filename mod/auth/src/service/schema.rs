use praxis_sql::{Backend, SqlExecutor, SqlStore};

use crate::service::AuthError;

/// Initialize the auth schema (users + audit log).
///
/// The DDL differs between backends only in the autoincrement primary
/// key spelling; everything else is shared. Timestamps are RFC 3339
/// TEXT, written by the application.
pub fn init_schema(sql: &dyn SqlStore) -> Result<(), AuthError> {
    let pk = match sql.backend() {
        Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        Backend::Postgres => "BIGSERIAL PRIMARY KEY",
    };

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS users (
                id {pk},
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id {pk},
                user_id BIGINT NOT NULL REFERENCES users(id),
                action TEXT NOT NULL,
                ip_address TEXT,
                user_agent TEXT,
                created_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_audit_user ON audit_log(user_id)".to_string(),
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}
