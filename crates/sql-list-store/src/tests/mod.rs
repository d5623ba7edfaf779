//! Integration tests for the list store.
//!
//! Test organization:
//!
//! - `bootstrap.rs`     - Table creation, reopening and construction failures
//! - `mutations.rs`     - Insert, set-values, remove and clear
//! - `requery.rs`       - Full rescans and read-time conversion
//! - `navigation.rs`    - Flat list-model cursors
//! - `failures.rs`      - Statement failures leave the cache untouched
//! - `notifications.rs` - Change events follow committed writes only
//! - `scenario.rs`      - End-to-end two-column walkthrough

mod scenario;

use crate::change::RecordingSink;
use crate::{ChangeEvent, ColumnValues, ListModel, ListWriter, Schema, SqlListStore, Value, ValueKind};

/// Two-column schema used across the suites.
pub(crate) fn two_columns() -> Schema {
    Schema::new(
        "test_table",
        [("col1", ValueKind::Text), ("col2", ValueKind::Integer)],
    )
    .unwrap()
}

/// Basic workflow test demonstrating core functionality.
#[test]
fn basic_workflow() {
    let mut store = SqlListStore::in_memory(two_columns())
        .unwrap()
        .with_sink(RecordingSink::new());

    // Insert two rows
    store
        .insert(ColumnValues::new().with(0, "first").with(1, 1))
        .unwrap();
    store.insert(ColumnValues::new().with(0, "second")).unwrap();
    assert_eq!(store.row_count(None), 2);

    // Update and read back
    store.set_value(1, 1, Value::Integer(2)).unwrap();
    assert_eq!(store.value_at(1, 1), Some(&Value::Integer(2)));

    // Reload from SQLite
    assert_eq!(store.requery().unwrap(), 2);

    // Verify events
    let events = store.sink().events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], ChangeEvent::RowInserted { .. }));
    assert!(matches!(events[1], ChangeEvent::RowInserted { .. }));
    assert!(matches!(events[2], ChangeEvent::RowChanged { .. }));
    assert!(matches!(events[3], ChangeEvent::Reset { rows: 2 }));

    // Remove everything
    store.clear().unwrap();
    assert!(store.is_empty());
    assert_eq!(store.sink().len(), 5);
}
