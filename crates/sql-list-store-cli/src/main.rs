//! sqlstore - browse and edit one SQLite table through the list store.

mod assign;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sql_list_store::{
    ChangeEvent, ChangeSink, ColumnValues, ListModel, ListWriter, Schema, SqlListStore, ValueKind,
};

use crate::assign::parse_assignments;
use crate::config::Config;
use crate::output::OutputFormat;

/// Browse and edit a SQLite table as an ordered list.
#[derive(Parser)]
#[command(name = "sqlstore")]
#[command(about = "Mirror a SQLite table as an in-memory list and edit it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and SQLSTORE_DATABASE)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Table to mirror
    #[arg(short, long, global = true)]
    table: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Do not add sample rows to an empty table
    #[arg(long, global = true)]
    no_seed: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// List every row (the default)
    List,
    /// Append the sample rows
    Seed,
    /// Insert a row from column=value pairs
    Insert {
        /// Values, e.g. col1="row 4" col2=200
        assignments: Vec<String>,
    },
    /// Update the row at a position
    Set {
        /// Row position (0-based)
        position: usize,
        /// Values, e.g. col2=999
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Remove the row at a position
    Remove {
        /// Row position (0-based)
        position: usize,
    },
    /// Remove every row
    Clear,
    /// Reload every row from the table
    Requery,
}

/// Sample schema: two text columns around an integer column.
fn sample_schema(table: &str) -> sql_list_store::StoreResult<Schema> {
    Schema::new(
        table,
        [
            ("col1", ValueKind::Text),
            ("col2", ValueKind::Integer),
            ("col3", ValueKind::Text),
        ],
    )
}

fn sample_rows() -> Vec<ColumnValues> {
    vec![
        ColumnValues::new()
            .with(0, "row 1")
            .with(1, 100)
            .with(2, "\u{266a}"),
        ColumnValues::new().with(0, "row 2").with(1, 150),
        ColumnValues::new().with(0, "row 3").with(1, 180),
    ]
}

/// Logs committed changes.
struct LogSink;

impl ChangeSink for LogSink {
    fn emit(&self, event: ChangeEvent) {
        tracing::info!(?event, "list changed");
    }
}

fn seed<S: ChangeSink>(store: &mut SqlListStore<'_, S>) -> anyhow::Result<usize> {
    let rows = sample_rows();
    let count = rows.len();
    for values in rows {
        store.insert(values).context("failed to insert sample row")?;
    }
    Ok(count)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }
    if let Some(table) = cli.table {
        config.table = table;
    }

    observability::init_with_config(observability::LogConfig {
        service_name: "sqlstore".into(),
        default_level: config.log_level.clone(),
        log_path: config.log_file.clone(),
        also_stderr: true,
    })?;

    let path = config.database_path();
    let schema = sample_schema(&config.table)?;
    let mut store = SqlListStore::open_with_options(&path, schema, &config.store)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_sink(LogSink);
    tracing::debug!(path = %path.display(), rows = store.len(), "opened store");

    if store.is_empty() && !cli.no_seed && !matches!(cli.command, Some(Commands::Seed)) {
        let added = seed(&mut store)?;
        tracing::info!(rows = added, "seeded empty table");
    }

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => {}
        Commands::Seed => {
            let added = seed(&mut store)?;
            println!("Added {added} sample rows");
        }
        Commands::Insert { assignments } => {
            let values = parse_assignments(store.schema(), &assignments)?;
            let cursor = store.insert(values)?;
            println!(
                "Inserted row {} at position {}",
                cursor.id(),
                cursor.position()
            );
        }
        Commands::Set {
            position,
            assignments,
        } => {
            let values = parse_assignments(store.schema(), &assignments)?;
            store.set_values(position, values)?;
            println!("Updated row at position {position}");
        }
        Commands::Remove { position } => {
            let id = store.remove(position)?;
            println!("Removed row {id}");
        }
        Commands::Clear => {
            store.clear()?;
            println!("Cleared {}", config.table);
        }
        Commands::Requery => {
            let rows = store.requery()?;
            println!("Reloaded {rows} rows");
        }
    }

    output::print_rows(&store, cli.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rows_fit_sample_schema() {
        let mut store = SqlListStore::in_memory(sample_schema("demo").unwrap()).unwrap();
        assert_eq!(seed(&mut store).unwrap(), 3);

        assert_eq!(store.row_count(None), 3);
        assert_eq!(
            store.value_at(0, 2).and_then(|v| v.as_text()),
            Some("\u{266a}")
        );
        assert_eq!(store.value_at(1, 2).and_then(|v| v.as_text()), Some(""));
        assert_eq!(store.value_at(2, 1).and_then(|v| v.as_integer()), Some(180));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sqlstore",
            "set",
            "1",
            "col2=999",
            "--database",
            "/tmp/x.db",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.format, OutputFormat::Json));
        match cli.command {
            Some(Commands::Set {
                position,
                assignments,
            }) => {
                assert_eq!(position, 1);
                assert_eq!(assignments, vec!["col2=999"]);
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn set_requires_assignments() {
        assert!(Cli::try_parse_from(["sqlstore", "set", "0"]).is_err());
    }
}
