use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::SqlError;
use crate::postgres::PostgresStore;
use crate::sqlite::SqliteStore;
use crate::traits::SqlStore;

/// Connection parameters for the PostgreSQL backend.
///
/// Pool sizing mirrors the production defaults: 20 connections, 2 s
/// acquisition timeout, 30 s idle reap.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "praxis".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 20,
            connect_timeout_secs: 2,
            idle_timeout_secs: 30,
        }
    }
}

/// Which backend to use, decided once at startup by configuration —
/// never probed per call.
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf },
    Postgres(PostgresConfig),
}

/// Open the configured backend and verify it is reachable.
///
/// Fails with [`SqlError::NoBackend`] when the selected backend cannot
/// be opened; the caller treats this as process-fatal.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn SqlStore>, SqlError> {
    let store: Arc<dyn SqlStore> = match config {
        DatabaseConfig::Sqlite { path } => {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)
                        .map_err(|e| SqlError::NoBackend(format!("sqlite: {}", e)))?;
                }
            }
            let store = SqliteStore::open(path)
                .map_err(|e| SqlError::NoBackend(format!("sqlite: {}", e)))?;
            info!("Opened SQLite database at {}", path.display());
            Arc::new(store)
        }
        DatabaseConfig::Postgres(pg) => {
            let store = PostgresStore::open(pg)
                .map_err(|e| SqlError::NoBackend(format!("postgres: {}", e)))?;
            info!("Connected to PostgreSQL at {}:{}/{}", pg.host, pg.port, pg.dbname);
            Arc::new(store)
        }
    };

    store
        .test_connection()
        .map_err(|e| SqlError::NoBackend(e.to_string()))?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Backend;

    #[test]
    fn connect_sqlite_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.db");
        let store = connect(&DatabaseConfig::Sqlite { path: path.clone() }).unwrap();
        assert_eq!(store.backend(), Backend::Sqlite);
        assert!(path.exists());
    }

    #[test]
    fn connect_unreachable_postgres_is_no_backend() {
        let cfg = PostgresConfig {
            host: "127.0.0.1".to_string(),
            port: 1, // nothing listens here
            connect_timeout_secs: 1,
            ..Default::default()
        };
        let err = connect(&DatabaseConfig::Postgres(cfg)).err().unwrap();
        assert!(matches!(err, SqlError::NoBackend(_)));
    }
}
