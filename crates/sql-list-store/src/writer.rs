//! Write-side contract.
//!
//! Partial rows are passed as one ordered list of `(column, value)` pairs.
//! Columns are declared-column indices; the identifier is never addressable.

use crate::cache::RowId;
use crate::model::RowCursor;
use crate::value::Value;
use crate::StoreResult;

/// Ordered `(column, value)` pairs for a partial row.
///
/// Setting a column twice keeps its first position and the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    pairs: Vec<(usize, Value)>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ColumnValues::set`].
    pub fn with(mut self, column: usize, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: usize, value: impl Into<Value>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(c, _)| *c == column) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((column, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.pairs.iter().map(|(c, v)| (*c, v))
    }

    /// Column indices in order.
    pub fn columns(&self) -> Vec<usize> {
        self.pairs.iter().map(|(c, _)| *c).collect()
    }

    pub fn into_pairs(self) -> Vec<(usize, Value)> {
        self.pairs
    }
}

impl<V: Into<Value>> FromIterator<(usize, V)> for ColumnValues {
    fn from_iter<I: IntoIterator<Item = (usize, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (column, value) in iter {
            values.set(column, value);
        }
        values
    }
}

impl From<Vec<(usize, Value)>> for ColumnValues {
    fn from(pairs: Vec<(usize, Value)>) -> Self {
        pairs.into_iter().collect()
    }
}

/// Mutations of a write-through list.
///
/// Each call writes the backing table first and touches the in-memory rows
/// only when that write succeeded.
pub trait ListWriter {
    /// Inserts a row from the supplied columns; the rest take their default.
    /// The new row is appended at the end.
    fn insert(&mut self, values: ColumnValues) -> StoreResult<RowCursor>;

    fn insert_empty(&mut self) -> StoreResult<RowCursor> {
        self.insert(ColumnValues::new())
    }

    /// Overwrites the supplied columns of the row at `position`.
    fn set_values(&mut self, position: usize, values: ColumnValues) -> StoreResult<()>;

    fn set_value(&mut self, position: usize, column: usize, value: Value) -> StoreResult<()> {
        self.set_values(position, ColumnValues::new().with(column, value))
    }

    /// Deletes the row at `position`. Later rows move up by one.
    fn remove(&mut self, position: usize) -> StoreResult<RowId>;

    /// Deletes every row.
    fn clear(&mut self) -> StoreResult<()>;

    /// Reloads every row from the backing table. Returns the new row count.
    fn requery(&mut self) -> StoreResult<usize>;
}
