//! The write-through list store.
//!
//! Every mutation runs the same pipeline:
//!
//! 1. validate the request against the schema and the current rows
//! 2. build one parameterized statement
//! 3. prepare, bind, step and finalize it
//! 4. on success, mirror the change into the cache and emit one event
//!
//! Any failure in steps 1-3 is logged, returned, and leaves the cache and
//! the sink untouched.

use std::path::Path;

use rusqlite::{Connection, Statement};

use crate::cache::{RowCache, RowId};
use crate::change::{ChangeEvent, ChangeSink, NullSink};
use crate::model::{ListModel, RowCursor};
use crate::schema::Schema;
use crate::sqlite::{SqliteStore, StoreOptions};
use crate::sync;
use crate::value::{Value, ValueKind};
use crate::writer::{ColumnValues, ListWriter};
use crate::{Row, StoreError, StoreResult};

/// An ordered, in-memory mirror of one SQLite table.
///
/// Reads are served from memory. Writes go to SQLite first and reach the
/// cache only once the statement succeeded.
pub struct SqlListStore<'conn, S: ChangeSink = NullSink> {
    sqlite: SqliteStore<'conn>,
    schema: Schema,
    cache: RowCache,
    sink: S,
}

impl SqlListStore<'static> {
    /// Opens a file-backed database with default [`StoreOptions`].
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> StoreResult<Self> {
        Self::open_with_options(path, schema, &StoreOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        schema: Schema,
        options: &StoreOptions,
    ) -> StoreResult<Self> {
        let path = path.as_ref();
        let sqlite = SqliteStore::open(path, options).inspect_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to open database");
        })?;
        Self::from_sqlite(sqlite, schema)
    }

    /// Opens a private in-memory database.
    pub fn in_memory(schema: Schema) -> StoreResult<Self> {
        Self::from_sqlite(SqliteStore::in_memory()?, schema)
    }
}

impl<'conn> SqlListStore<'conn> {
    /// Mirrors a table on a caller-owned connection.
    ///
    /// The connection is never closed by the store, and no connection
    /// options are applied to it.
    pub fn with_connection(conn: &'conn Connection, schema: Schema) -> StoreResult<Self> {
        Self::from_sqlite(SqliteStore::borrowed(conn), schema)
    }

    /// Creates the table if needed and loads its rows.
    ///
    /// Loading the existing rows emits no change event.
    pub fn from_sqlite(sqlite: SqliteStore<'conn>, schema: Schema) -> StoreResult<Self> {
        let cache = sqlite
            .create_table_if_not_exists(&schema)
            .and_then(|()| check_columns(&sqlite, &schema))
            .and_then(|()| sync::scan(&sqlite, &schema))
            .inspect_err(|err| {
                tracing::warn!(table = schema.table(), error = %err, "bootstrap failed");
            })?;

        tracing::info!(
            table = schema.table(),
            columns = schema.len(),
            rows = cache.len(),
            "list store ready"
        );
        Ok(Self {
            sqlite,
            schema,
            cache,
            sink: NullSink,
        })
    }
}

/// Fails when an existing table lacks any declared column.
fn check_columns(sqlite: &SqliteStore<'_>, schema: &Schema) -> StoreResult<()> {
    let present = sqlite.table_columns(schema.table())?;
    let missing: Vec<&str> = schema
        .columns()
        .iter()
        .map(|c| c.name())
        .filter(|name| !present.iter().any(|p| p.eq_ignore_ascii_case(name)))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::InvalidSchema(format!(
            "table {} has no column {} (found: {})",
            schema.table(),
            missing.join(", "),
            present.join(", ")
        )))
    }
}

impl<'conn, S: ChangeSink> SqlListStore<'conn, S> {
    /// Replaces the change sink.
    pub fn with_sink<T: ChangeSink>(self, sink: T) -> SqlListStore<'conn, T> {
        SqlListStore {
            sqlite: self.sqlite,
            schema: self.schema,
            cache: self.cache,
            sink,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &RowCache {
        &self.cache
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn connection(&self) -> &Connection {
        self.sqlite.connection()
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.schema.column(column).map(|c| c.name())
    }

    pub fn column_kind(&self, column: usize) -> Option<ValueKind> {
        self.schema.column(column).map(|c| c.kind())
    }

    /// Current position of the row carrying `id`.
    pub fn find_position(&self, id: RowId) -> Option<usize> {
        self.cache.position_of(id)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    fn insert_row(&mut self, values: ColumnValues) -> StoreResult<RowCursor> {
        let pairs = values.into_pairs();
        let columns: Vec<usize> = pairs.iter().map(|(c, _)| *c).collect();
        let sql = self.schema.insert_sql(&columns)?;

        let (id, cells) = {
            let mut stmt = self.sqlite.prepare(&sql)?;
            let cells = self.bind_cells(&mut stmt, &pairs)?;
            self.sqlite.step(&mut stmt)?;
            self.sqlite.finalize(stmt)?;
            (self.sqlite.last_insert_rowid(), cells)
        };

        let mut row = self.schema.default_row();
        for (column, value) in cells {
            row[column] = value;
        }
        let position = self.cache.append(id, row)?;

        tracing::debug!(table = self.schema.table(), %id, position, "row inserted");
        self.sink.emit(ChangeEvent::RowInserted { position, id });
        Ok(RowCursor::new(position, id))
    }

    fn update_row(&mut self, position: usize, values: ColumnValues) -> StoreResult<()> {
        let id = self.identifier_checked(position)?;
        if values.is_empty() {
            return Ok(());
        }

        let pairs = values.into_pairs();
        let columns: Vec<usize> = pairs.iter().map(|(c, _)| *c).collect();
        let sql = self.schema.update_sql(&columns)?;

        let (changed, cells) = {
            let mut stmt = self.sqlite.prepare(&sql)?;
            let cells = self.bind_cells(&mut stmt, &pairs)?;
            self.sqlite
                .bind(&mut stmt, pairs.len() + 1, &Value::Integer(id.get()))?;
            let changed = self.sqlite.step(&mut stmt)?;
            self.sqlite.finalize(stmt)?;
            (changed, cells)
        };
        if changed == 0 {
            tracing::warn!(
                table = self.schema.table(),
                %id,
                "update matched no stored row; the table changed outside this store"
            );
        }

        self.cache.set_cells(position, cells)?;
        self.sink.emit(ChangeEvent::RowChanged {
            position,
            id,
            columns,
        });
        Ok(())
    }

    fn delete_row(&mut self, position: usize) -> StoreResult<RowId> {
        let id = self.identifier_checked(position)?;

        let changed = {
            let mut stmt = self.sqlite.prepare(&self.schema.delete_sql())?;
            self.sqlite.bind(&mut stmt, 1, &Value::Integer(id.get()))?;
            let changed = self.sqlite.step(&mut stmt)?;
            self.sqlite.finalize(stmt)?;
            changed
        };
        if changed == 0 {
            tracing::warn!(
                table = self.schema.table(),
                %id,
                "delete matched no stored row; the table changed outside this store"
            );
        }

        self.cache.remove_at(position)?;
        self.sink.emit(ChangeEvent::RowDeleted { position, id });
        Ok(id)
    }

    fn delete_all(&mut self) -> StoreResult<()> {
        let changed = {
            let mut stmt = self.sqlite.prepare(&self.schema.clear_sql())?;
            let changed = self.sqlite.step(&mut stmt)?;
            self.sqlite.finalize(stmt)?;
            changed
        };

        tracing::debug!(table = self.schema.table(), deleted = changed, "table cleared");
        self.cache.clear();
        self.sink.emit(ChangeEvent::Cleared);
        Ok(())
    }

    fn reload(&mut self) -> StoreResult<usize> {
        let fresh = sync::scan(&self.sqlite, &self.schema)?;
        self.cache = fresh;

        let rows = self.cache.len();
        tracing::info!(table = self.schema.table(), rows, "requery complete");
        self.sink.emit(ChangeEvent::Reset { rows });
        Ok(rows)
    }

    /// Binds each pair to parameters `1..=pairs.len()` and returns the cells
    /// the cache should hold once the statement succeeds.
    ///
    /// A value with no conversion to its column's kind is not bound; the
    /// parameter stays NULL and its cell becomes the kind's default.
    fn bind_cells(
        &self,
        stmt: &mut Statement<'_>,
        pairs: &[(usize, Value)],
    ) -> StoreResult<Vec<(usize, Value)>> {
        let mut cells = Vec::with_capacity(pairs.len());
        for (index, (column, value)) in pairs.iter().enumerate() {
            let kind = self.schema.kind_of(*column)?;
            match value.clone().coerce(kind) {
                Ok(bound) => {
                    self.sqlite.bind(stmt, index + 1, &bound)?;
                    let cell = if bound.is_null() {
                        kind.default_value()
                    } else {
                        bound
                    };
                    cells.push((*column, cell));
                }
                Err(err) => {
                    tracing::warn!(
                        table = self.schema.table(),
                        column = *column,
                        error = %err,
                        "unsupported value left unbound"
                    );
                    cells.push((*column, kind.default_value()));
                }
            }
        }
        Ok(cells)
    }

    fn identifier_checked(&self, position: usize) -> StoreResult<RowId> {
        self.cache
            .identifier_at(position)
            .ok_or(StoreError::RowOutOfRange {
                position,
                rows: self.cache.len(),
            })
    }
}

impl<S: ChangeSink> ListModel for SqlListStore<'_, S> {
    fn len(&self) -> usize {
        self.cache.len()
    }

    fn row_at(&self, position: usize) -> Option<&Row> {
        self.cache.row(position)
    }

    fn column_count(&self) -> usize {
        self.schema.len()
    }
}

impl<S: ChangeSink> ListWriter for SqlListStore<'_, S> {
    fn insert(&mut self, values: ColumnValues) -> StoreResult<RowCursor> {
        self.insert_row(values).inspect_err(|err| {
            tracing::warn!(table = self.schema.table(), error = %err, "insert failed");
        })
    }

    fn set_values(&mut self, position: usize, values: ColumnValues) -> StoreResult<()> {
        self.update_row(position, values).inspect_err(|err| {
            tracing::warn!(table = self.schema.table(), position, error = %err, "update failed");
        })
    }

    fn remove(&mut self, position: usize) -> StoreResult<RowId> {
        self.delete_row(position).inspect_err(|err| {
            tracing::warn!(table = self.schema.table(), position, error = %err, "remove failed");
        })
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.delete_all().inspect_err(|err| {
            tracing::warn!(table = self.schema.table(), error = %err, "clear failed; rows kept");
        })
    }

    fn requery(&mut self) -> StoreResult<usize> {
        self.reload().inspect_err(|err| {
            tracing::warn!(table = self.schema.table(), error = %err, "requery failed; rows kept");
        })
    }
}
