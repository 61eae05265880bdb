use praxis_sql::{Backend, SqlExecutor, SqlStore};

use crate::service::OfficeError;

/// Initialize the office schema. Runs after the auth schema, since
/// several tables reference `users`.
pub fn init_schema(sql: &dyn SqlStore) -> Result<(), OfficeError> {
    let pk = match sql.backend() {
        Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        Backend::Postgres => "BIGSERIAL PRIMARY KEY",
    };

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS clients (
                id {pk},
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                phone TEXT UNIQUE,
                document TEXT,
                person_type TEXT,
                address TEXT,
                profession TEXT,
                marital_status TEXT,
                birth_date TEXT,
                notes TEXT,
                created_by BIGINT REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(name)".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                subject TEXT,
                platform TEXT,
                source TEXT,
                status TEXT NOT NULL DEFAULT 'new',
                description TEXT,
                notes TEXT,
                entered_at TEXT NOT NULL,
                created_by BIGINT REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        ),
        "CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_leads_entered ON leads(entered_at)".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS appointments (
                id {pk},
                kind TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled',
                scheduled_at TEXT NOT NULL,
                client_id BIGINT NOT NULL REFERENCES clients(id),
                lawyer_id BIGINT REFERENCES users(id),
                notes TEXT,
                created_by BIGINT REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_appointments_client ON appointments(client_id)"
            .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_appointments_when ON appointments(scheduled_at)"
            .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS schedule_entries (
                id {pk},
                title TEXT NOT NULL,
                description TEXT,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled',
                client_id BIGINT REFERENCES clients(id),
                lawyer_id BIGINT REFERENCES users(id),
                location TEXT,
                notes TEXT,
                created_by BIGINT REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE INDEX IF NOT EXISTS idx_schedule_lawyer ON schedule_entries(lawyer_id)"
            .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_schedule_start ON schedule_entries(starts_at)"
            .to_string(),
        "CREATE TABLE IF NOT EXISTS lawyers (
            user_id BIGINT PRIMARY KEY REFERENCES users(id),
            bar_number TEXT NOT NULL,
            phone TEXT,
            address TEXT,
            specialties TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS settings (
            user_id BIGINT PRIMARY KEY REFERENCES users(id),
            email_notifications INTEGER NOT NULL DEFAULT 1,
            whatsapp_notifications INTEGER NOT NULL DEFAULT 0,
            timezone TEXT NOT NULL DEFAULT 'UTC',
            theme TEXT NOT NULL DEFAULT 'light',
            locale TEXT NOT NULL DEFAULT 'en',
            updated_at TEXT NOT NULL
        )"
        .to_string(),
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_sql::SqliteStore;

    #[test]
    fn init_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        // users must exist first (FK targets).
        store
            .exec(
                "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT)",
                &[],
            )
            .unwrap();
        init_schema(&store).unwrap();
        init_schema(&store).unwrap();

        let rows = store.query("SELECT COUNT(*) AS cnt FROM clients", &[]).unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(0));
    }
}
