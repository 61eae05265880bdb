pub mod config;
pub mod error;
pub mod placeholder;
pub mod postgres;
pub mod sqlite;
pub mod traits;

pub use self::config::{connect, DatabaseConfig, PostgresConfig};
pub use self::error::{QueryErrorKind, SqlError};
pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;
pub use self::traits::{Backend, Row, SqlExecutor, SqlStore, Value};
