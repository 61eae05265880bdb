use crate::error::SqlError;

/// The storage engine behind a [`SqlStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Embedded SQLite database (single shared connection, WAL mode).
    Sqlite,
    /// Client/server PostgreSQL database (r2d2 connection pool).
    Postgres,
}

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(if v { 1 } else { 0 })
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an owned text column value by name.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get_str(name).map(str::to_string)
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a real column value by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get an integer column as a boolean (non-zero is true).
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_i64(name).map(|i| i != 0)
    }
}

/// Statement execution on one logical connection.
///
/// Both the stores themselves and the transaction handles passed to
/// [`SqlStore::transact`] closures implement this, so services can run
/// the same queries inside and outside a transaction.
///
/// SQL is written with `?N` ordinal placeholders throughout; backends
/// translate to their native syntax where it differs. User-supplied
/// values must only ever be passed through `params`, never spliced into
/// the SQL text.
pub trait SqlExecutor {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError>;

    /// Execute an INSERT (written without a RETURNING clause) and return
    /// the new primary key. PostgreSQL appends `RETURNING id`; SQLite
    /// reads `last_insert_rowid()`.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError>;
}

/// A SQL storage backend with explicit lifecycle.
///
/// One store is created at process startup (see [`crate::connect`]) and
/// injected into every service that needs it.
pub trait SqlStore: SqlExecutor + Send + Sync {
    /// Which engine this store talks to.
    fn backend(&self) -> Backend;

    /// Run `f` inside a transaction on a single connection.
    ///
    /// Commits when `f` returns `Ok`; rolls back and returns
    /// [`SqlError::Transaction`] wrapping the cause when `f` fails.
    /// Statements issued through the handle are invisible outside the
    /// transaction until commit.
    fn transact(
        &self,
        f: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), SqlError>,
    ) -> Result<(), SqlError>;

    /// Round-trip a trivial query to verify the backend is reachable.
    fn test_connection(&self) -> Result<(), SqlError>;

    /// Release the underlying connection(s). Further calls fail with
    /// [`SqlError::Connection`].
    fn close(&self) -> Result<(), SqlError>;
}
