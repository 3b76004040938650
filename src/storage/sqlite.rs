//! SQLite backend.
//!
//! # Responsibilities
//! - Open a database file (or an in-memory database)
//! - Run bootstrap statements on open
//! - Render a descriptor into a parameterised `SELECT` and bind its args
//!
//! # Design Decisions
//! - One connection behind a mutex; `Connection` is not `Sync`
//! - Table and column names are quoted as identifiers
//! - Sort order is passed through as written by the caller

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use crate::config::StorageConfig;
use crate::query::{Columns, QueryDescriptor, Row, Value};
use crate::storage::{Storage, StorageError};

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// A single-connection SQLite store.
pub struct SqliteStore {
    path: String,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(storage_error)?;
        tracing::info!(path = %path.display(), "Opened SQLite database");
        Ok(Self {
            path: path.display().to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Ok(Self {
            path: IN_MEMORY.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Open the database named in config and run its bootstrap statements.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let store = if config.database_path == IN_MEMORY {
            Self::open_in_memory()?
        } else {
            Self::open(&config.database_path)?
        };

        for statement in &config.bootstrap {
            store.execute_batch(statement)?;
        }
        tracing::debug!(
            statements = config.bootstrap.len(),
            "Ran bootstrap statements"
        );
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run one or more statements without arguments.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(storage_error)
    }

    /// Run a single statement with bound arguments; returns affected rows.
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        conn.execute(sql, params_from_iter(args.iter()))
            .map_err(storage_error)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::new("SQLite connection lock poisoned"))
    }
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

impl Storage for SqliteStore {
    fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError> {
        let sql = render_select(table, query)?;
        tracing::trace!(sql = %sql, args = query.predicate.args().len(), "Executing query");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(storage_error)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_from_iter(query.predicate.args().iter()), |row| {
                let mut fields = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    fields.push((name.clone(), read_value(row.get_ref(i)?)));
                }
                Ok(Row::new(fields))
            })
            .map_err(storage_error)?;

        let result: Result<Vec<Row>, StorageError> =
            rows.map(|r| r.map_err(storage_error)).collect();
        result
    }
}

/// Build the `SELECT` statement for a descriptor.
fn render_select(table: &str, query: &QueryDescriptor) -> Result<String, StorageError> {
    let projection = match &query.columns {
        Columns::All => "*".to_string(),
        Columns::Named(columns) if columns.is_empty() => {
            return Err(StorageError::new("projection names no columns"));
        }
        Columns::Named(columns) => columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", "),
    };

    let mut sql = format!("SELECT {} FROM {}", projection, quote_identifier(table));
    if !query.predicate.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(query.predicate.text());
    }
    if let Some(sort) = query.effective_sort_order() {
        sql.push_str(" ORDER BY ");
        sql.push_str(sort);
    }
    Ok(sql)
}

// Backticks, not double quotes: SQLite reads an unknown double-quoted
// identifier as a string literal.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn storage_error(e: rusqlite::Error) -> StorageError {
    StorageError::new(e.to_string())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}
