//! In-memory rows mirroring the backing table.
//!
//! Row order is table scan order. Positions are dense `0..len`; row
//! identifiers are whatever SQLite assigned and are never reused by the cache.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{StoreError, StoreResult};

/// SQLite's implicit row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl RowId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cached row: its identifier plus one value per declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    values: Vec<Value>,
}

impl Row {
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, column: usize) -> Option<&Value> {
        self.values.get(column)
    }
}

/// Ordered rows of a fixed width.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCache {
    width: usize,
    rows: Vec<Row>,
}

impl RowCache {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of declared columns every row carries.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    pub fn value_at(&self, position: usize, column: usize) -> Option<&Value> {
        self.row(position).and_then(|row| row.value(column))
    }

    pub fn identifier_at(&self, position: usize) -> Option<RowId> {
        self.row(position).map(Row::id)
    }

    /// Appends a row at the end. Returns its position.
    pub fn append(&mut self, id: RowId, values: Vec<Value>) -> StoreResult<usize> {
        if values.len() != self.width {
            return Err(StoreError::RowWidth {
                expected: self.width,
                actual: values.len(),
            });
        }
        self.rows.push(Row { id, values });
        Ok(self.rows.len() - 1)
    }

    /// Overwrites the given cells of one row.
    ///
    /// All indices are checked before any cell is written.
    pub fn set_cells(&mut self, position: usize, cells: Vec<(usize, Value)>) -> StoreResult<()> {
        let rows = self.rows.len();
        let width = self.width;
        let row = self
            .rows
            .get_mut(position)
            .ok_or(StoreError::RowOutOfRange { position, rows })?;

        if let Some(&(column, _)) = cells.iter().find(|(column, _)| *column >= width) {
            return Err(StoreError::UnknownColumn {
                column,
                columns: width,
            });
        }
        for (column, value) in cells {
            row.values[column] = value;
        }
        Ok(())
    }

    /// Removes the row at `position`, shifting later rows down by one.
    pub fn remove_at(&mut self, position: usize) -> StoreResult<Row> {
        if position >= self.rows.len() {
            return Err(StoreError::RowOutOfRange {
                position,
                rows: self.rows.len(),
            });
        }
        Ok(self.rows.remove(position))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Position of the row carrying `id`.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a RowCache {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
