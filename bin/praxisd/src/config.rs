//! Server configuration.
//!
//! Loaded from a TOML file, then overridden by environment variables
//! for anything secret or deployment-specific. The daemon refuses to
//! start on an incomplete configuration (see bootstrap).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use praxis_sql::{DatabaseConfig, PostgresConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub jwt: JwtSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub admin: AdminSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSection {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

fn default_expire_secs() -> i64 {
    604_800 // 7 days
}

impl Default for JwtSection {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expire_secs: default_expire_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Seed credentials for the first administrator, applied only when the
/// users table is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSection {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    /// "sqlite" or "postgres" — an explicit choice, never probed.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
    #[serde(default)]
    pub postgres: PostgresSection,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("data/praxis.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
            postgres: PostgresSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSection {
    #[serde(default = "default_pg_host")]
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    #[serde(default = "default_pg_dbname")]
    pub dbname: String,
    #[serde(default = "default_pg_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_pg_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_dbname() -> String {
    "praxis".to_string()
}

fn default_pg_user() -> String {
    "postgres".to_string()
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            host: default_pg_host(),
            port: default_pg_port(),
            dbname: default_pg_dbname(),
            user: default_pg_user(),
            password: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load a config file and apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let mut config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides for secrets and deployment parameters.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("PRAXIS_JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_DB_BACKEND") {
            self.database.backend = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_DB_PATH") {
            self.database.sqlite_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("PRAXIS_PG_HOST") {
            self.database.postgres.host = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_PG_PORT") {
            if let Ok(port) = v.parse() {
                self.database.postgres.port = port;
            }
        }
        if let Ok(v) = std::env::var("PRAXIS_PG_DBNAME") {
            self.database.postgres.dbname = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_PG_USER") {
            self.database.postgres.user = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_PG_PASSWORD") {
            self.database.postgres.password = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_ADMIN_EMAIL") {
            self.admin.email = v;
        }
        if let Ok(v) = std::env::var("PRAXIS_ADMIN_PASSWORD") {
            self.admin.password = v;
        }
    }

    /// Translate the database section into the adapter's config.
    pub fn database_config(&self) -> anyhow::Result<DatabaseConfig> {
        match self.database.backend.as_str() {
            "sqlite" => Ok(DatabaseConfig::Sqlite {
                path: self.database.sqlite_path.clone(),
            }),
            "postgres" => {
                let pg = &self.database.postgres;
                Ok(DatabaseConfig::Postgres(PostgresConfig {
                    host: pg.host.clone(),
                    port: pg.port,
                    dbname: pg.dbname.clone(),
                    user: pg.user.clone(),
                    password: pg.password.clone(),
                    ..Default::default()
                }))
            }
            other => anyhow::bail!(
                "unknown database backend '{}' (expected 'sqlite' or 'postgres')",
                other
            ),
        }
    }
}
