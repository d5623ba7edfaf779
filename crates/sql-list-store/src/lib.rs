//! # sql-list-store
//!
//! A write-through cache that mirrors one SQLite table as an ordered, flat
//! list of rows held in memory.
//!
//! ## Consistency contract
//!
//! - **SQLite is the authority** - every write goes to the table first
//! - **The cache follows committed writes only** - a failed statement leaves
//!   the cache exactly as it was
//! - **Reads never touch SQLite** - row count, values and navigation are
//!   served from the cache
//! - **Requery replaces, never patches** - the cache is rebuilt into a fresh
//!   buffer and swapped in only when the whole scan succeeded
//!
//! ```text
//! WRITE:
//!   SQL statement → cache mutation → change event
//!
//! READ:
//!   cache (row count, value at, cursor navigation)
//!
//! REQUERY:
//!   full table scan → fresh cache → swap → reset event
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sql_list_store::{ColumnValues, ListModel, ListWriter, Schema, SqlListStore, ValueKind};
//!
//! let schema = Schema::new(
//!     "test_table",
//!     [("col1", ValueKind::Text), ("col2", ValueKind::Integer)],
//! )
//! .unwrap();
//! let mut store = SqlListStore::in_memory(schema).unwrap();
//!
//! store
//!     .insert(ColumnValues::new().with(0, "row 1").with(1, 100))
//!     .unwrap();
//!
//! assert_eq!(store.row_count(None), 1);
//! assert_eq!(store.value_at(0, 1).and_then(|v| v.as_integer()), Some(100));
//! ```
//!
//! ## Crate Structure
//!
//! - [`schema`] - Table description and the SQL derived from it
//! - [`value`] - Cell values and conversion to declared kinds
//! - [`sqlite`] - Backing-store adapter
//! - [`cache`] - In-memory rows
//! - [`model`] - Flat list-model read contract
//! - [`writer`] - Write-side contract
//! - [`change`] - Change notifications

pub mod cache;
pub mod change;
pub mod model;
pub mod schema;
pub mod sqlite;
mod store;
mod sync;
pub mod value;
pub mod writer;

#[cfg(test)]
mod tests;

pub use cache::{Row, RowCache, RowId};
pub use change::{ChangeEvent, ChangeSink, NullSink, RecordingSink};
pub use model::{Children, ListModel, RowCursor};
pub use schema::{Column, Schema};
pub use sqlite::{JournalMode, SqliteStore, StoreOptions};
pub use store::SqlListStore;
pub use value::{ConversionError, Value, ValueKind};
pub use writer::{ColumnValues, ListWriter};

/// Errors that can occur in the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The table description is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A column index outside the declared columns.
    #[error("unknown column {column} (table has {columns} columns)")]
    UnknownColumn { column: usize, columns: usize },

    /// A row position outside the cache.
    #[error("row {position} out of range (cache has {rows} rows)")]
    RowOutOfRange { position: usize, rows: usize },

    /// A row whose width does not match the schema.
    #[error("row has {actual} values, schema declares {expected}")]
    RowWidth { expected: usize, actual: usize },

    /// A malformed request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Value conversion error.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
