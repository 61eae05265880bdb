use std::cell::RefCell;
use std::error::Error as StdError;
use std::sync::Mutex;
use std::time::Duration;

use bytes::BytesMut;
use postgres::error::SqlState;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;

use crate::config::PostgresConfig;
use crate::error::{QueryErrorKind, SqlError};
use crate::placeholder::to_dollar_placeholders;
use crate::traits::{Backend, Row, SqlExecutor, SqlStore, Value};

type Pool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

/// PostgresStore is a SqlStore implementation backed by a pooled
/// client/server PostgreSQL connection.
///
/// SQL arrives in the repository-wide `?N` placeholder style and is
/// rewritten to `$N` before execution. `insert` uses the native
/// `RETURNING id` support instead of a last-insert-id emulation.
pub struct PostgresStore {
    pool: Mutex<Option<Pool>>,
}

impl PostgresStore {
    /// Build the pool and verify the server is reachable.
    pub fn open(config: &PostgresConfig) -> Result<Self, SqlError> {
        let mut pg = postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.dbname)
            .user(&config.user)
            .password(&config.password)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        let manager = PostgresConnectionManager::new(pg, NoTls);
        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(1))
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .build(manager)
            .map_err(|e| SqlError::Connection(e.to_string()))?;

        Ok(Self {
            pool: Mutex::new(Some(pool)),
        })
    }

    fn pool(&self) -> Result<Pool, SqlError> {
        let guard = self
            .pool
            .lock()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| SqlError::Connection("store is closed".into()))
    }

    fn with_client<R>(
        &self,
        f: impl FnOnce(&mut postgres::Client) -> Result<R, SqlError>,
    ) -> Result<R, SqlError> {
        let pool = self.pool()?;
        let mut client = pool
            .get()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        f(&mut client)
    }
}

/// Map a SQLSTATE to a structured query error kind.
fn kind_for_sqlstate(code: &SqlState) -> QueryErrorKind {
    if *code == SqlState::UNIQUE_VIOLATION {
        QueryErrorKind::UniqueViolation
    } else if *code == SqlState::FOREIGN_KEY_VIOLATION {
        QueryErrorKind::ForeignKeyViolation
    } else if *code == SqlState::NOT_NULL_VIOLATION {
        QueryErrorKind::NotNullViolation
    } else if *code == SqlState::SYNTAX_ERROR {
        QueryErrorKind::Syntax
    } else {
        QueryErrorKind::Other
    }
}

fn query_error(e: postgres::Error) -> SqlError {
    let kind = match e.as_db_error() {
        Some(db) => kind_for_sqlstate(db.code()),
        None if e.is_closed() => QueryErrorKind::Connection,
        None => QueryErrorKind::Other,
    };
    SqlError::query(kind, e.to_string())
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn map_rows(rows: Vec<postgres::Row>) -> Vec<Row> {
    rows.iter().map(map_row).collect()
}

fn map_row(row: &postgres::Row) -> Row {
    let mut columns = Vec::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        columns.push((col.name().to_string(), column_value(row, i, col.type_())));
    }
    Row { columns }
}

/// Decode one column into our dynamic Value by its wire type.
fn column_value(row: &postgres::Row, idx: usize, ty: &Type) -> Value {
    if *ty == Type::INT8 {
        opt(row.try_get::<_, Option<i64>>(idx), Value::Integer)
    } else if *ty == Type::INT4 {
        opt(row.try_get::<_, Option<i32>>(idx), |v| Value::Integer(v as i64))
    } else if *ty == Type::INT2 {
        opt(row.try_get::<_, Option<i16>>(idx), |v| Value::Integer(v as i64))
    } else if *ty == Type::FLOAT8 {
        opt(row.try_get::<_, Option<f64>>(idx), Value::Real)
    } else if *ty == Type::FLOAT4 {
        opt(row.try_get::<_, Option<f32>>(idx), |v| Value::Real(v as f64))
    } else if *ty == Type::BOOL {
        opt(row.try_get::<_, Option<bool>>(idx), |v| {
            Value::Integer(if v { 1 } else { 0 })
        })
    } else if *ty == Type::BYTEA {
        opt(row.try_get::<_, Option<Vec<u8>>>(idx), Value::Blob)
    } else {
        opt(row.try_get::<_, Option<String>>(idx), Value::Text)
    }
}

fn opt<T>(res: Result<Option<T>, postgres::Error>, f: impl FnOnce(T) -> Value) -> Value {
    match res {
        Ok(Some(v)) => f(v),
        _ => Value::Null,
    }
}

// Parameter encoding: the server assigns each `$N` a type from the
// statement context; encode our dynamic value to whatever it asked for.
impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => {
                if *ty == Type::INT2 {
                    (*i as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*i as i32).to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (*i != 0).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*i as f64).to_sql(ty, out)
                } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
                    i.to_string().to_sql(ty, out)
                } else {
                    i.to_sql(ty, out)
                }
            }
            Value::Real(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    f.to_sql(ty, out)
                }
            }
            Value::Text(s) => s.to_sql(ty, out),
            Value::Blob(b) => b.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl SqlExecutor for PostgresStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        let sql = to_dollar_placeholders(sql);
        self.with_client(|client| {
            let rows = client
                .query(&sql, &param_refs(params))
                .map_err(query_error)?;
            Ok(map_rows(rows))
        })
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        let sql = to_dollar_placeholders(sql);
        self.with_client(|client| {
            client.execute(&sql, &param_refs(params)).map_err(query_error)
        })
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        let sql = format!("{} RETURNING id", to_dollar_placeholders(sql));
        self.with_client(|client| {
            let rows = client
                .query(&sql, &param_refs(params))
                .map_err(query_error)?;
            returned_id(&rows)
        })
    }
}

fn returned_id(rows: &[postgres::Row]) -> Result<i64, SqlError> {
    let row = rows.first().ok_or_else(|| {
        SqlError::query(QueryErrorKind::Other, "INSERT returned no id")
    })?;
    row.try_get::<_, i64>(0)
        .map_err(|e| SqlError::query(QueryErrorKind::Other, e.to_string()))
}

/// Executor handle bound to the connection inside a transaction.
struct TxExecutor<'a> {
    tx: RefCell<postgres::Transaction<'a>>,
}

impl SqlExecutor for TxExecutor<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        let sql = to_dollar_placeholders(sql);
        let rows = self
            .tx
            .borrow_mut()
            .query(&sql, &param_refs(params))
            .map_err(query_error)?;
        Ok(map_rows(rows))
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        let sql = to_dollar_placeholders(sql);
        self.tx
            .borrow_mut()
            .execute(&sql, &param_refs(params))
            .map_err(query_error)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        let sql = format!("{} RETURNING id", to_dollar_placeholders(sql));
        let rows = self
            .tx
            .borrow_mut()
            .query(&sql, &param_refs(params))
            .map_err(query_error)?;
        returned_id(&rows)
    }
}

impl SqlStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn transact(
        &self,
        f: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), SqlError>,
    ) -> Result<(), SqlError> {
        let pool = self.pool()?;
        let mut client = pool
            .get()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        let tx = client
            .transaction()
            .map_err(|e| SqlError::Transaction(Box::new(query_error(e))))?;

        let exec = TxExecutor {
            tx: RefCell::new(tx),
        };
        match f(&exec) {
            Ok(()) => exec
                .tx
                .into_inner()
                .commit()
                .map_err(|e| SqlError::Transaction(Box::new(query_error(e)))),
            Err(cause) => {
                let _ = exec.tx.into_inner().rollback();
                Err(SqlError::Transaction(Box::new(cause)))
            }
        }
    }

    fn test_connection(&self) -> Result<(), SqlError> {
        self.query("SELECT 1 AS test", &[])?;
        Ok(())
    }

    fn close(&self) -> Result<(), SqlError> {
        let mut guard = self
            .pool
            .lock()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        // Dropping the pool tears down all idle connections.
        guard.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_kinds() {
        assert_eq!(
            kind_for_sqlstate(&SqlState::UNIQUE_VIOLATION),
            QueryErrorKind::UniqueViolation
        );
        assert_eq!(
            kind_for_sqlstate(&SqlState::FOREIGN_KEY_VIOLATION),
            QueryErrorKind::ForeignKeyViolation
        );
        assert_eq!(
            kind_for_sqlstate(&SqlState::NOT_NULL_VIOLATION),
            QueryErrorKind::NotNullViolation
        );
        assert_eq!(kind_for_sqlstate(&SqlState::SYNTAX_ERROR), QueryErrorKind::Syntax);
        assert_eq!(kind_for_sqlstate(&SqlState::ADMIN_SHUTDOWN), QueryErrorKind::Other);
    }

    #[test]
    fn value_encodes_for_requested_type() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Integer(7).to_sql(&Type::INT8, &mut buf).unwrap(),
            IsNull::No
        ));
        assert_eq!(buf.len(), 8);

        let mut buf = BytesMut::new();
        Value::Integer(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::INT8, &mut buf).unwrap(),
            IsNull::Yes
        ));
        assert!(buf.is_empty());

        let mut buf = BytesMut::new();
        Value::Text("hi".into()).to_sql(&Type::TEXT, &mut buf).unwrap();
        assert_eq!(&buf[..], b"hi");
    }
}
