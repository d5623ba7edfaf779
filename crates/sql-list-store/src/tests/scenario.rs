//! End-to-end walkthrough on a two-column table.
//!
//! Schema `col1: Text, col2: Integer` on an empty table, driven through
//! insert, partial insert, update, remove and clear with a requery after
//! each step that should be confirmed by SQLite.

use super::two_columns;
use crate::{ColumnValues, ListModel, ListWriter, RowId, SqlListStore, Value};
use tempfile::NamedTempFile;

fn check_scenario<S: crate::ChangeSink>(store: &mut SqlListStore<'_, S>) {
    assert_eq!(store.row_count(None), 0);

    // Insert {col1: "row 1", col2: 100}
    store
        .insert(ColumnValues::new().with(0, "row 1").with(1, 100))
        .unwrap();
    assert_eq!(store.row_count(None), 1);
    assert_eq!(store.value_at(0, 0), Some(&Value::from("row 1")));
    assert_eq!(store.value_at(0, 1), Some(&Value::Integer(100)));
    assert_eq!(store.identifier_at(0), Some(RowId(1)));

    // Insert {col1: "row 2"}, col2 omitted
    store.insert(ColumnValues::new().with(0, "row 2")).unwrap();
    assert_eq!(store.row_count(None), 2);
    assert_eq!(store.value_at(1, 1), Some(&Value::Integer(0)));

    // Set {col2: 999} on row 0, then confirm from SQLite
    store.set_value(0, 1, Value::Integer(999)).unwrap();
    assert_eq!(store.value_at(0, 1), Some(&Value::Integer(999)));
    store.requery().unwrap();
    let position = store.find_position(RowId(1)).unwrap();
    assert_eq!(store.value_at(position, 1), Some(&Value::Integer(999)));

    // Remove row 0; row 2 moves up with its identifier
    let first = store.find_position(RowId(1)).unwrap();
    store.remove(first).unwrap();
    assert_eq!(store.row_count(None), 1);
    assert_eq!(store.identifier_at(0), Some(RowId(2)));
    assert_eq!(store.value_at(0, 0), Some(&Value::from("row 2")));

    // Clear, then confirm from SQLite
    store.clear().unwrap();
    assert_eq!(store.row_count(None), 0);
    assert_eq!(store.requery().unwrap(), 0);
}

#[test]
fn scenario_in_memory() {
    let mut store = SqlListStore::in_memory(two_columns()).unwrap();
    check_scenario(&mut store);
}

#[test]
fn scenario_file_backed() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut store = SqlListStore::open(temp_file.path(), two_columns()).unwrap();
    check_scenario(&mut store);
}
