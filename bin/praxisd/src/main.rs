//! `praxisd` — the practice-management server binary.
//!
//! Usage:
//!   praxisd -c /etc/praxis/server.toml [--listen <addr>]
//!
//! Startup order: load config → verify → open the configured database
//! backend → initialize modules (schema) → seed admin → serve.

mod bootstrap;
mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use praxis_core::Module;
use praxis_sql::SqlStore;

use config::ServerConfig;

/// Praxis server.
#[derive(Parser, Debug)]
#[command(name = "praxisd", about = "Law-office practice management server")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: PathBuf,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config.display());
    let server_config = ServerConfig::load(&cli.config)?;
    bootstrap::verify_config(&server_config)?;

    // Open the configured database backend. NoBackend here is fatal.
    let sql = praxis_sql::connect(&server_config.database_config()?)?;

    // Initialize modules; each sets up its own schema.
    let auth_config = auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        token_ttl_secs: server_config.jwt.expire_secs,
        bcrypt_cost: server_config.auth.bcrypt_cost,
    };
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    info!("Auth module initialized");

    let office_module =
        office::OfficeModule::new(Arc::clone(&sql), Arc::clone(auth_module.service()))?;
    info!("Office module initialized");

    bootstrap::ensure_admin_user(auth_module.service(), &server_config)?;

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (office_module.name(), office_module.routes()),
    ];
    let app = routes::build_router(module_routes);

    let listen = cli
        .listen
        .unwrap_or_else(|| server_config.server.listen.clone());
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("praxisd listening on {}", listen);
    axum::serve(listener, app).await?;

    // Release the database handle on clean shutdown.
    sql.close().map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
