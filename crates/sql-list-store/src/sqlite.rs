//! SQLite adapter for the list store.
//!
//! Thin, blocking wrapper over one connection: execute, prepare, bind, step,
//! finalize and the last inserted row identifier. Statements live only for
//! the duration of a single store operation.
//!
//! The adapter owns its connection when it opened it itself and closes it on
//! drop. A connection supplied by the caller is only borrowed and is never
//! closed here.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Rows, Statement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::RowId;
use crate::schema::Schema;
use crate::value::Value;
use crate::StoreResult;

/// Default busy timeout applied to connections the store opens itself.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// SQLite journal modes accepted in [`StoreOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// Connection settings, applied only to connections the store opens itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Journal mode for file-backed databases; `None` keeps SQLite's default.
    pub journal_mode: Option<JournalMode>,
    /// Create missing parent directories of the database file.
    pub create_parent_dirs: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: Some(JournalMode::Wal),
            create_parent_dirs: true,
        }
    }
}

enum Handle<'conn> {
    Owned(Connection),
    Borrowed(&'conn Connection),
}

/// Blocking statement primitives over one SQLite connection.
pub struct SqliteStore<'conn> {
    handle: Handle<'conn>,
}

impl SqliteStore<'static> {
    /// Opens (and owns) a file-backed connection.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> StoreResult<Self> {
        let path = path.as_ref();
        if options.create_parent_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
        if let Some(mode) = options.journal_mode {
            conn.execute_batch(&format!("PRAGMA journal_mode = {};", mode.as_str()))?;
        }

        debug!(path = %path.display(), "opened database");
        Ok(Self {
            handle: Handle::Owned(conn),
        })
    }

    /// Opens (and owns) an in-memory connection.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            handle: Handle::Owned(conn),
        })
    }
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a caller-supplied connection without taking ownership.
    pub fn borrowed(conn: &'conn Connection) -> Self {
        Self {
            handle: Handle::Borrowed(conn),
        }
    }

    pub fn connection(&self) -> &Connection {
        match &self.handle {
            Handle::Owned(conn) => conn,
            Handle::Borrowed(conn) => conn,
        }
    }

    /// True when dropping the adapter closes the connection.
    pub fn owns_connection(&self) -> bool {
        matches!(self.handle, Handle::Owned(_))
    }

    /// Runs one or more statements without parameters or results.
    pub fn execute(&self, sql: &str) -> StoreResult<()> {
        debug!(sql, "execute");
        self.connection().execute_batch(sql)?;
        Ok(())
    }

    pub fn prepare(&self, sql: &str) -> StoreResult<Statement<'_>> {
        debug!(sql, "prepare");
        Ok(self.connection().prepare(sql)?)
    }

    /// Binds `value` to the 1-based parameter `position`.
    pub fn bind(&self, stmt: &mut Statement<'_>, position: usize, value: &Value) -> StoreResult<()> {
        stmt.raw_bind_parameter(position, value)?;
        Ok(())
    }

    /// Steps a statement that returns no rows to completion.
    ///
    /// Returns the number of rows the statement changed.
    pub fn step(&self, stmt: &mut Statement<'_>) -> StoreResult<usize> {
        Ok(stmt.raw_execute()?)
    }

    /// Starts stepping a statement that returns rows.
    pub fn query<'s>(&self, stmt: &'s mut Statement<'_>) -> Rows<'s> {
        stmt.raw_query()
    }

    pub fn finalize(&self, stmt: Statement<'_>) -> StoreResult<()> {
        stmt.finalize()?;
        Ok(())
    }

    /// Identifier of the most recent successful insert on this connection.
    pub fn last_insert_rowid(&self) -> RowId {
        RowId(self.connection().last_insert_rowid())
    }

    /// Creates the schema's table unless it already exists.
    pub fn create_table_if_not_exists(&self, schema: &Schema) -> StoreResult<()> {
        self.execute(&schema.create_table_sql())
    }

    /// Column names of `table` as the backing store reports them.
    pub fn table_columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new("items", [("name", ValueKind::Text), ("qty", ValueKind::Integer)]).unwrap()
    }

    #[test]
    fn create_table_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_table_if_not_exists(&schema()).unwrap();
        store.create_table_if_not_exists(&schema()).unwrap();

        assert_eq!(store.table_columns("items").unwrap(), vec!["name", "qty"]);
    }

    #[test]
    fn prepare_bind_step_and_last_rowid() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_table_if_not_exists(&schema()).unwrap();

        let mut stmt = store
            .prepare(r#"INSERT INTO "items" ("name", "qty") VALUES (?1, ?2)"#)
            .unwrap();
        store.bind(&mut stmt, 1, &Value::Text("apple".into())).unwrap();
        store.bind(&mut stmt, 2, &Value::Integer(3)).unwrap();
        assert_eq!(store.step(&mut stmt).unwrap(), 1);
        store.finalize(stmt).unwrap();

        assert_eq!(store.last_insert_rowid(), RowId(1));
    }

    #[test]
    fn unbound_parameter_is_null() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_table_if_not_exists(&schema()).unwrap();

        let mut stmt = store
            .prepare(r#"INSERT INTO "items" ("name", "qty") VALUES (?1, ?2)"#)
            .unwrap();
        store.bind(&mut stmt, 1, &Value::Text("pear".into())).unwrap();
        store.step(&mut stmt).unwrap();
        store.finalize(stmt).unwrap();

        let qty: Option<i64> = store
            .connection()
            .query_row(r#"SELECT "qty" FROM "items""#, [], |row| row.get(0))
            .unwrap();
        assert_eq!(qty, None);
    }

    #[test]
    fn prepare_failure_is_an_error() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.prepare("SELECT * FROM missing").is_err());
    }

    #[test]
    fn borrowed_connection_is_not_owned() {
        let conn = Connection::open_in_memory().unwrap();
        {
            let store = SqliteStore::borrowed(&conn);
            assert!(!store.owns_connection());
            store.create_table_if_not_exists(&schema()).unwrap();
        }
        // Still usable after the adapter is gone.
        conn.execute(r#"INSERT INTO "items" ("name") VALUES ('kept')"#, [])
            .unwrap();
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("list.db");

        let store = SqliteStore::open(&path, &StoreOptions::default()).unwrap();
        assert!(store.owns_connection());
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn open_without_parent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent").join("list.db");
        let options = StoreOptions {
            create_parent_dirs: false,
            ..StoreOptions::default()
        };

        assert!(SqliteStore::open(&path, &options).is_err());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: StoreOptions =
            serde_json::from_str(r#"{ "journal_mode": "delete" }"#).unwrap();
        assert_eq!(options.journal_mode, Some(JournalMode::Delete));
        assert_eq!(options.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(options.create_parent_dirs);
    }
}
