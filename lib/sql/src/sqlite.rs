use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{QueryErrorKind, SqlError};
use crate::traits::{Backend, Row, SqlExecutor, SqlStore, Value};

/// SqliteStore is a SqlStore implementation backed by rusqlite (bundled
/// SQLite). All statements are serialized behind one shared connection,
/// which is also what makes `transact` atomic: a transaction holds the
/// connection lock for its whole duration.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SqlError> {
        let conn = Connection::open(path)
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SqlError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, SqlError> {
        // WAL for concurrent readers; foreign keys are off by default in SQLite.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SqlError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, SqlError> {
        self.conn
            .lock()
            .map_err(|e| SqlError::Connection(e.to_string()))
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// Map a rusqlite error to a structured query error.
fn query_error(e: rusqlite::Error) -> SqlError {
    let kind = match &e {
        rusqlite::Error::SqliteFailure(err, msg) => match err.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => QueryErrorKind::UniqueViolation,
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => QueryErrorKind::ForeignKeyViolation,
            rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => QueryErrorKind::NotNullViolation,
            _ if msg.as_deref().is_some_and(|m| m.contains("syntax error")) => {
                QueryErrorKind::Syntax
            }
            _ => QueryErrorKind::Other,
        },
        _ => QueryErrorKind::Other,
    };
    SqlError::query(kind, e.to_string())
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn.prepare(sql).map_err(query_error)?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let mut columns = Vec::new();
            for (i, name) in column_names.iter().enumerate() {
                columns.push((name.clone(), row_value_at(row, i)));
            }
            Ok(Row { columns })
        })
        .map_err(query_error)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(query_error)?);
    }
    Ok(result)
}

fn run_exec(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn
        .execute(sql, param_refs.as_slice())
        .map_err(query_error)?;

    Ok(affected as u64)
}

fn run_insert(conn: &Connection, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
    run_exec(conn, sql, params)?;
    Ok(conn.last_insert_rowid())
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    use rusqlite::types::ValueRef;
    match row.get_ref(idx) {
        Ok(ValueRef::Null) | Err(_) => Value::Null,
        Ok(ValueRef::Integer(i)) => Value::Integer(i),
        Ok(ValueRef::Real(f)) => Value::Real(f),
        Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        Ok(ValueRef::Blob(b)) => Value::Blob(b.to_vec()),
    }
}

/// Executor handle bound to the connection inside a transaction.
struct TxExecutor<'a> {
    conn: &'a Connection,
}

impl SqlExecutor for TxExecutor<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        run_query(self.conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        run_exec(self.conn, sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        run_insert(self.conn, sql, params)
    }
}

impl SqlExecutor for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        let guard = self.lock()?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SqlError::Connection("store is closed".into()))?;
        run_query(conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        let guard = self.lock()?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SqlError::Connection("store is closed".into()))?;
        run_exec(conn, sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        let guard = self.lock()?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SqlError::Connection("store is closed".into()))?;
        run_insert(conn, sql, params)
    }
}

impl SqlStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn transact(
        &self,
        f: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), SqlError>,
    ) -> Result<(), SqlError> {
        let guard = self.lock()?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SqlError::Connection("store is closed".into()))?;

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| SqlError::Transaction(Box::new(query_error(e))))?;

        let exec = TxExecutor { conn };
        match f(&exec) {
            Ok(()) => conn
                .execute_batch("COMMIT")
                .map_err(|e| SqlError::Transaction(Box::new(query_error(e)))),
            Err(cause) => {
                // Rollback failure is unreachable short of a dead handle;
                // the original cause is the error worth reporting.
                let _ = conn.execute_batch("ROLLBACK");
                Err(SqlError::Transaction(Box::new(cause)))
            }
        }
    }

    fn test_connection(&self) -> Result<(), SqlError> {
        self.query("SELECT 1 AS test", &[])?;
        Ok(())
    }

    fn close(&self) -> Result<(), SqlError> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| SqlError::Connection(e.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::QueryErrorKind;

    fn store_with_users() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL
                )",
                &[],
            )
            .unwrap();
        store
    }

    #[test]
    fn insert_returns_new_id() {
        let store = store_with_users();
        let id = store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("a@x.com"), Value::from("A")],
            )
            .unwrap();
        assert_eq!(id, 1);

        let id2 = store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("b@x.com"), Value::from("B")],
            )
            .unwrap();
        assert_eq!(id2, 2);
    }

    #[test]
    fn query_maps_rows_and_nulls() {
        let store = store_with_users();
        store
            .exec("ALTER TABLE users ADD COLUMN phone TEXT", &[])
            .unwrap();
        store
            .insert(
                "INSERT INTO users (email, name, phone) VALUES (?1, ?2, ?3)",
                &[Value::from("a@x.com"), Value::from("A"), Value::Null],
            )
            .unwrap();

        let rows = store
            .query("SELECT id, email, phone FROM users WHERE email = ?1", &[Value::from("a@x.com")])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("id"), Some(1));
        assert_eq!(rows[0].get_str("email"), Some("a@x.com"));
        assert_eq!(rows[0].get("phone"), Some(&Value::Null));
    }

    #[test]
    fn unique_violation_kind() {
        let store = store_with_users();
        store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("a@x.com"), Value::from("A")],
            )
            .unwrap();

        let err = store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("a@x.com"), Value::from("B")],
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(QueryErrorKind::UniqueViolation));
    }

    #[test]
    fn not_null_violation_kind() {
        let store = store_with_users();
        let err = store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("a@x.com"), Value::Null],
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(QueryErrorKind::NotNullViolation));
    }

    #[test]
    fn foreign_key_violation_kind() {
        let store = store_with_users();
        store
            .exec(
                "CREATE TABLE notes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id)
                )",
                &[],
            )
            .unwrap();

        let err = store
            .insert("INSERT INTO notes (user_id) VALUES (?1)", &[Value::from(99i64)])
            .unwrap_err();
        assert_eq!(err.kind(), Some(QueryErrorKind::ForeignKeyViolation));
    }

    #[test]
    fn syntax_error_kind() {
        let store = store_with_users();
        let err = store.query("SELEC wrong FROM", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(QueryErrorKind::Syntax));
    }

    #[test]
    fn transact_commits_on_success() {
        let store = store_with_users();
        store
            .transact(&mut |tx| {
                tx.insert(
                    "INSERT INTO users (email, name) VALUES (?1, ?2)",
                    &[Value::from("a@x.com"), Value::from("A")],
                )?;
                tx.insert(
                    "INSERT INTO users (email, name) VALUES (?1, ?2)",
                    &[Value::from("b@x.com"), Value::from("B")],
                )?;
                Ok(())
            })
            .unwrap();

        let rows = store.query("SELECT COUNT(*) AS cnt FROM users", &[]).unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(2));
    }

    #[test]
    fn transact_rolls_back_on_failure() {
        let store = store_with_users();
        store
            .insert(
                "INSERT INTO users (email, name) VALUES (?1, ?2)",
                &[Value::from("first@x.com"), Value::from("First")],
            )
            .unwrap();

        let err = store
            .transact(&mut |tx| {
                tx.insert(
                    "INSERT INTO users (email, name) VALUES (?1, ?2)",
                    &[Value::from("second@x.com"), Value::from("Second")],
                )?;
                // Duplicate email aborts the transaction.
                tx.insert(
                    "INSERT INTO users (email, name) VALUES (?1, ?2)",
                    &[Value::from("first@x.com"), Value::from("Dup")],
                )?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, SqlError::Transaction(_)));
        assert_eq!(err.kind(), Some(QueryErrorKind::UniqueViolation));

        // Only the pre-transaction row survives.
        let rows = store.query("SELECT email FROM users", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("email"), Some("first@x.com"));
    }

    #[test]
    fn concurrent_transactions_on_disjoint_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(&dir.path().join("t.db")).unwrap());
        store
            .exec(
                "CREATE TABLE counters (id INTEGER PRIMARY KEY, n INTEGER NOT NULL)",
                &[],
            )
            .unwrap();
        store
            .exec("INSERT INTO counters (id, n) VALUES (1, 0), (2, 0)", &[])
            .unwrap();

        let mut handles = Vec::new();
        for id in [1i64, 2i64] {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..10 {
                    store
                        .transact(&mut |tx| {
                            tx.exec(
                                "UPDATE counters SET n = n + 1 WHERE id = ?1",
                                &[Value::from(id)],
                            )?;
                            Ok(())
                        })
                        .unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let rows = store
            .query("SELECT id, n FROM counters ORDER BY id", &[])
            .unwrap();
        assert_eq!(rows[0].get_i64("n"), Some(10));
        assert_eq!(rows[1].get_i64("n"), Some(10));
    }

    #[test]
    fn close_then_query_fails() {
        let store = store_with_users();
        store.close().unwrap();
        let err = store.query("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, SqlError::Connection(_)));
        // Closing twice is harmless.
        store.close().unwrap();
    }

    #[test]
    fn test_connection_roundtrip() {
        let store = store_with_users();
        store.test_connection().unwrap();
    }
}
