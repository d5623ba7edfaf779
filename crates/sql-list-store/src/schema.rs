//! Table schema and the SQL text derived from it.
//!
//! The backing table always carries SQLite's implicit row identifier in
//! addition to the declared columns. Scans select it as the leading result
//! column, so a declared column `i` lives in result slot `i + 1`; that
//! translation happens only in [`Schema::slot`].

use crate::value::ValueKind;
use crate::{StoreError, StoreResult};

/// Result slot of the row identifier in a table scan.
pub const IDENTIFIER_SLOT: usize = 0;

/// SQL name of the implicit row identifier.
const IDENTIFIER_COLUMN: &str = "_ROWID_";

/// Names SQLite resolves to the row identifier unless a real column shadows them.
const RESERVED_NAMES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    kind: ValueKind,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Immutable description of the mirrored table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from a table name and ordered `(name, kind)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSchema`] if the table name is empty, no
    /// columns are given, a column name is empty, repeated (SQLite compares
    /// column names case-insensitively), shadows the row identifier, or a
    /// column is declared with the null kind.
    pub fn new<I, N>(table: impl Into<String>, columns: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (N, ValueKind)>,
        N: Into<String>,
    {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(StoreError::InvalidSchema("table name is empty".to_string()));
        }

        let mut declared: Vec<Column> = Vec::new();
        for (name, kind) in columns {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(StoreError::InvalidSchema(format!(
                    "column {} has an empty name",
                    declared.len()
                )));
            }
            if RESERVED_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
                return Err(StoreError::InvalidSchema(format!(
                    "column {name:?} would shadow the row identifier"
                )));
            }
            if declared.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
                return Err(StoreError::InvalidSchema(format!(
                    "column {name:?} is declared twice"
                )));
            }
            if kind == ValueKind::Null {
                return Err(StoreError::InvalidSchema(format!(
                    "column {name:?} cannot be declared as null"
                )));
            }
            declared.push(Column { name, kind });
        }

        if declared.is_empty() {
            return Err(StoreError::InvalidSchema(format!(
                "table {table:?} needs at least one column"
            )));
        }

        Ok(Self {
            table,
            columns: declared,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of declared columns (the identifier is not counted).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the declared kind of a column, or an error for an unknown index.
    pub fn kind_of(&self, index: usize) -> StoreResult<ValueKind> {
        self.column(index)
            .map(Column::kind)
            .ok_or(StoreError::UnknownColumn {
                column: index,
                columns: self.len(),
            })
    }

    /// Finds a column by name, case-insensitively.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Result slot of a declared column in a table scan.
    pub fn slot(column: usize) -> usize {
        column + 1
    }

    /// Zero/empty values for every declared column.
    pub fn default_row(&self) -> Vec<crate::Value> {
        self.columns.iter().map(|c| c.kind.default_value()).collect()
    }

    // ========================================================================
    // SQL text
    // ========================================================================

    /// `CREATE TABLE IF NOT EXISTS` naming exactly the declared columns.
    ///
    /// Columns are declared without a type so that type affinity stays with
    /// the backing store.
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.table),
            quote_list(self.columns.iter().map(|c| c.name.as_str()))
        )
    }

    /// Scan of the identifier followed by every declared column.
    pub fn select_sql(&self) -> String {
        let mut selection = String::from(IDENTIFIER_COLUMN);
        for column in &self.columns {
            selection.push_str(", ");
            selection.push_str(&quote_identifier(&column.name));
        }
        format!("SELECT {} FROM {}", selection, quote_identifier(&self.table))
    }

    /// `INSERT` naming only the given columns, one parameter each.
    pub fn insert_sql(&self, columns: &[usize]) -> StoreResult<String> {
        if columns.is_empty() {
            return Ok(format!(
                "INSERT INTO {} DEFAULT VALUES",
                quote_identifier(&self.table)
            ));
        }
        let names = self.names(columns)?;
        let placeholders = (1..=names.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.table),
            quote_list(names.into_iter()),
            placeholders
        ))
    }

    /// `UPDATE` of the given columns; the identifier is the last parameter.
    pub fn update_sql(&self, columns: &[usize]) -> StoreResult<String> {
        if columns.is_empty() {
            return Err(StoreError::InvalidArgument(
                "an update needs at least one column".to_string(),
            ));
        }
        let names = self.names(columns)?;
        let assignments = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", quote_identifier(name), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_identifier(&self.table),
            assignments,
            IDENTIFIER_COLUMN,
            names.len() + 1
        ))
    }

    pub fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_identifier(&self.table),
            IDENTIFIER_COLUMN
        )
    }

    pub fn clear_sql(&self) -> String {
        format!("DELETE FROM {}", quote_identifier(&self.table))
    }

    fn names(&self, columns: &[usize]) -> StoreResult<Vec<&str>> {
        columns
            .iter()
            .map(|&index| {
                self.column(index)
                    .map(|c| c.name.as_str())
                    .ok_or(StoreError::UnknownColumn {
                        column: index,
                        columns: self.len(),
                    })
            })
            .collect()
    }
}

fn quote_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote_identifier).collect::<Vec<_>>().join(", ")
}

/// Quotes an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
