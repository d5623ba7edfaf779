//! Change notifications.
//!
//! A store reports every committed change to its [`ChangeSink`] after both
//! the backing table and the cache have been updated. Failed operations
//! emit nothing.

use std::sync::Mutex;

use serde::Serialize;

use crate::cache::RowId;

/// A committed change to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A row was appended at `position`.
    RowInserted { position: usize, id: RowId },
    /// Cells of the row at `position` were overwritten.
    RowChanged {
        position: usize,
        id: RowId,
        columns: Vec<usize>,
    },
    /// The row at `position` was removed; later rows moved up by one.
    RowDeleted { position: usize, id: RowId },
    /// Every row was removed.
    Cleared,
    /// The whole list was reloaded and now holds `rows` rows.
    Reset { rows: usize },
}

/// Receiver of committed changes.
pub trait ChangeSink {
    fn emit(&self, event: ChangeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn emit(&self, _event: ChangeEvent) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChangeEvent>> {
        // A panicking emitter cannot leave the vector half-written.
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ChangeSink for RecordingSink {
    fn emit(&self, event: ChangeEvent) {
        self.lock().push(event);
    }
}

impl<T: ChangeSink + ?Sized> ChangeSink for &T {
    fn emit(&self, event: ChangeEvent) {
        (**self).emit(event)
    }
}

impl<T: ChangeSink + ?Sized> ChangeSink for std::sync::Arc<T> {
    fn emit(&self, event: ChangeEvent) {
        (**self).emit(event)
    }
}
