//! Flat list-model read contract.
//!
//! A list model is a single level of rows under an implicit root. Rows never
//! have children and never have a parent, so a renderer can treat any
//! implementation as a plain ordered list.
//!
//! Cursors remember both the position and the identifier of the row they
//! were taken from. A cursor stops being valid as soon as a different row
//! sits at its position, for example after an earlier row was removed.

use crate::cache::{Row, RowCache, RowId};
use crate::value::Value;

/// A handle on one row of a list model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowCursor {
    position: usize,
    id: RowId,
}

impl RowCursor {
    pub fn new(position: usize, id: RowId) -> Self {
        Self { position, id }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn id(&self) -> RowId {
        self.id
    }
}

/// Read access to an ordered, flat list of rows.
///
/// `None` as a parent stands for the root. Every non-root parent is a leaf.
pub trait ListModel {
    /// Number of rows under the root.
    fn len(&self) -> usize;

    fn row_at(&self, position: usize) -> Option<&Row>;

    /// Number of declared columns, not counting the identifier.
    fn column_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows under `parent`: every row for the root, none for a row.
    fn row_count(&self, parent: Option<&RowCursor>) -> usize {
        match parent {
            None => self.len(),
            Some(_) => 0,
        }
    }

    fn value_at(&self, position: usize, column: usize) -> Option<&Value> {
        self.row_at(position).and_then(|row| row.value(column))
    }

    fn identifier_at(&self, position: usize) -> Option<RowId> {
        self.row_at(position).map(Row::id)
    }

    /// Cursor for the row currently at `position`.
    fn iter_at(&self, position: usize) -> Option<RowCursor> {
        self.identifier_at(position)
            .map(|id| RowCursor::new(position, id))
    }

    fn first(&self) -> Option<RowCursor> {
        self.iter_at(0)
    }

    fn next(&self, cursor: &RowCursor) -> Option<RowCursor> {
        if !self.is_valid(cursor) {
            return None;
        }
        self.iter_at(cursor.position + 1)
    }

    fn previous(&self, cursor: &RowCursor) -> Option<RowCursor> {
        if !self.is_valid(cursor) {
            return None;
        }
        cursor
            .position
            .checked_sub(1)
            .and_then(|position| self.iter_at(position))
    }

    /// The `n`th child of `parent`. Only the root has children.
    fn nth_child(&self, parent: Option<&RowCursor>, n: usize) -> Option<RowCursor> {
        match parent {
            None => self.iter_at(n),
            Some(_) => None,
        }
    }

    /// Iterates the children of `parent` in current order.
    fn children(&self, parent: Option<&RowCursor>) -> Children<'_, Self> {
        let end = self.row_count(parent);
        Children {
            model: self,
            next: 0,
            end,
        }
    }

    /// Rows are never nested.
    fn parent(&self, _cursor: &RowCursor) -> Option<RowCursor> {
        None
    }

    fn has_child(&self, _cursor: &RowCursor) -> bool {
        false
    }

    /// True while the cursor's row still sits at the cursor's position.
    fn is_valid(&self, cursor: &RowCursor) -> bool {
        self.identifier_at(cursor.position) == Some(cursor.id)
    }

    /// Value under a cursor, or `None` if the cursor went stale.
    fn cursor_value(&self, cursor: &RowCursor, column: usize) -> Option<&Value> {
        if !self.is_valid(cursor) {
            return None;
        }
        self.value_at(cursor.position, column)
    }

    /// Position of a valid cursor.
    fn path(&self, cursor: &RowCursor) -> Option<usize> {
        self.is_valid(cursor).then_some(cursor.position)
    }
}

/// Iterator over the children of one parent.
pub struct Children<'a, M: ?Sized> {
    model: &'a M,
    next: usize,
    end: usize,
}

impl<'a, M: ListModel + ?Sized> Iterator for Children<'a, M> {
    type Item = RowCursor;

    fn next(&mut self) -> Option<RowCursor> {
        if self.next >= self.end {
            return None;
        }
        let cursor = self.model.iter_at(self.next)?;
        self.next += 1;
        Some(cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ListModel for RowCache {
    fn len(&self) -> usize {
        RowCache::len(self)
    }

    fn row_at(&self, position: usize) -> Option<&Row> {
        self.row(position)
    }

    fn column_count(&self) -> usize {
        self.width()
    }
}
