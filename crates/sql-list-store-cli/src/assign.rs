//! Parsing of `column=value` arguments.
//!
//! The column is looked up by name in the schema. The value text is
//! converted to the column's declared kind; the literal `null` (any case)
//! stands for SQL NULL.

use sql_list_store::{ColumnValues, ConversionError, Schema, Value};

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("expected column=value, got {0:?}")]
    Malformed(String),

    #[error("unknown column {name:?} (columns: {known})")]
    UnknownColumn { name: String, known: String },

    #[error("bad value for column {column:?}: {source}")]
    Value {
        column: String,
        #[source]
        source: ConversionError,
    },
}

/// Parses one `column=value` argument.
pub fn parse_assignment(schema: &Schema, arg: &str) -> Result<(usize, Value), AssignmentError> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| AssignmentError::Malformed(arg.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AssignmentError::Malformed(arg.to_string()));
    }

    let (column, kind) = schema
        .position(name)
        .and_then(|index| schema.column(index).map(|c| (index, c.kind())))
        .ok_or_else(|| AssignmentError::UnknownColumn {
            name: name.to_string(),
            known: schema
                .columns()
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    if raw.eq_ignore_ascii_case("null") {
        return Ok((column, Value::Null));
    }

    let value = Value::Text(raw.to_string())
        .coerce(kind)
        .map_err(|source| AssignmentError::Value {
            column: name.to_string(),
            source,
        })?;
    Ok((column, value))
}

/// Parses every argument into one ordered set of column values.
pub fn parse_assignments<I, S>(schema: &Schema, args: I) -> Result<ColumnValues, AssignmentError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = ColumnValues::new();
    for arg in args {
        let (column, value) = parse_assignment(schema, arg.as_ref())?;
        values.set(column, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_list_store::ValueKind;

    fn schema() -> Schema {
        Schema::new(
            "test_table",
            [
                ("col1", ValueKind::Text),
                ("col2", ValueKind::Integer),
                ("col3", ValueKind::Text),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_typed_values() {
        let schema = schema();
        assert_eq!(
            parse_assignment(&schema, "col2=150").unwrap(),
            (1, Value::Integer(150))
        );
        assert_eq!(
            parse_assignment(&schema, "COL1=row 4").unwrap(),
            (0, Value::from("row 4"))
        );
        assert_eq!(
            parse_assignment(&schema, "col3=a=b").unwrap(),
            (2, Value::from("a=b"))
        );
        assert_eq!(parse_assignment(&schema, "col2=NULL").unwrap(), (1, Value::Null));
    }

    #[test]
    fn rejects_bad_arguments() {
        let schema = schema();
        assert!(matches!(
            parse_assignment(&schema, "col2"),
            Err(AssignmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_assignment(&schema, "=5"),
            Err(AssignmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_assignment(&schema, "col9=1"),
            Err(AssignmentError::UnknownColumn { .. })
        ));
        assert!(matches!(
            parse_assignment(&schema, "col2=many"),
            Err(AssignmentError::Value { .. })
        ));
    }

    #[test]
    fn later_assignment_wins() {
        let values = parse_assignments(&schema(), ["col2=1", "col1=x", "col2=2"]).unwrap();
        assert_eq!(values.columns(), vec![1, 0]);
        assert_eq!(
            values.iter().next(),
            Some((1, &Value::Integer(2)))
        );
    }
}
