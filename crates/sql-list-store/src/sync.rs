//! Full-table scan that rebuilds the cache.
//!
//! The scan fills a fresh [`RowCache`]; callers swap it in only when this
//! returns `Ok`, so a failed scan never leaves a half-built list behind.

use crate::cache::{RowCache, RowId};
use crate::schema::{Column, Schema, IDENTIFIER_SLOT};
use crate::sqlite::SqliteStore;
use crate::value::Value;
use crate::StoreResult;

/// Reads every row of the schema's table in scan order.
pub(crate) fn scan(sqlite: &SqliteStore<'_>, schema: &Schema) -> StoreResult<RowCache> {
    let mut stmt = sqlite.prepare(&schema.select_sql())?;
    let mut cache = RowCache::new(schema.len());

    {
        let mut rows = sqlite.query(&mut stmt);
        while let Some(row) = rows.next()? {
            let id = RowId(row.get::<_, i64>(IDENTIFIER_SLOT)?);
            let mut values = Vec::with_capacity(schema.len());
            for (index, column) in schema.columns().iter().enumerate() {
                let stored = Value::from(row.get_ref(Schema::slot(index))?);
                values.push(read_cell(schema, column, id, stored));
            }
            cache.append(id, values)?;
        }
    }

    sqlite.finalize(stmt)?;
    Ok(cache)
}

/// Converts one stored cell to its column's declared kind.
///
/// A cell that does not convert is kept exactly as stored.
fn read_cell(schema: &Schema, column: &Column, id: RowId, stored: Value) -> Value {
    match stored.clone().read_as(column.kind()) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                table = schema.table(),
                column = column.name(),
                row = %id,
                error = %err,
                "stored value does not match declared kind; keeping it as stored"
            );
            stored
        }
    }
}
