//! Output formatting for the CLI.

use clap::ValueEnum;
use serde_json::{json, Map};
use sql_list_store::{ChangeSink, ListModel, SqlListStore, Value};

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints every cached row.
pub fn print_rows<S: ChangeSink>(store: &SqlListStore<'_, S>, format: OutputFormat) {
    match format {
        OutputFormat::Text => print_table(store),
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = store
                .rows()
                .iter()
                .enumerate()
                .map(|(position, row)| {
                    let mut values = Map::new();
                    for (column, value) in store.schema().columns().iter().zip(row.values()) {
                        values.insert(column.name().to_string(), to_json(value));
                    }
                    json!({ "position": position, "id": row.id(), "values": values })
                })
                .collect();
            match serde_json::to_string_pretty(&rows) {
                Ok(text) => println!("{text}"),
                Err(err) => eprintln!("Error: {err}"),
            }
        }
    }
}

fn print_table<S: ChangeSink>(store: &SqlListStore<'_, S>) {
    let mut header = format!("{:>4}  {:>6}", "#", "id");
    for column in store.schema().columns() {
        header.push_str(&format!("  {:<16}", column.name()));
    }
    println!("{}", header.trim_end());
    println!("{}", "-".repeat(header.trim_end().len()));

    for cursor in store.children(None) {
        let mut line = format!("{:>4}  {:>6}", cursor.position(), cursor.id());
        for column in 0..store.column_count() {
            let cell = store
                .cursor_value(&cursor, column)
                .map(Value::to_string)
                .unwrap_or_default();
            line.push_str(&format!("  {cell:<16}"));
        }
        println!("{}", line.trim_end());
    }
    println!("({} rows)", store.row_count(None));
}

/// Plain JSON for a cell: numbers, strings, null, and blobs as hex text.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => json!(i),
        Value::Real(f) => json!(f),
        Value::Text(s) => json!(s),
        Value::Blob(_) => json!(value.to_string()),
    }
}
