//! # Observability
//!
//! Logging setup shared by the workspace binaries.
//!
//! Libraries in this workspace only emit `tracing` events. A binary calls
//! [`init`] or [`init_with_config`] once at startup to decide where those
//! events go:
//!
//! - a compact, human-readable stream on stderr
//! - optionally, structured JSONL appended to a file, one event per line
//!
//! `RUST_LOG` overrides the configured default level for both outputs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() -> anyhow::Result<()> {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "sqlstore".into(),
//!         default_level: "debug".into(),
//!         log_path: Some("/tmp/sqlstore.jsonl".into()),
//!         ..Default::default()
//!     })?;
//!
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

mod file;
mod json_layer;

use std::io;
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

pub use file::LogFileWriter;
pub use json_layer::{JsonLayer, LogRecord};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name written into every JSONL record.
    pub service_name: String,

    /// Filter used when `RUST_LOG` is unset (e.g. "info", "sql_list_store=debug").
    pub default_level: String,

    /// Append structured JSONL records to this file.
    pub log_path: Option<PathBuf>,

    /// Emit compact, human-readable logs on stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to open log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    AlreadyInitialized(#[from] TryInitError),
}

/// Installs logging with defaults for `service_name`.
pub fn init(service_name: &str) -> Result<(), InitError> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Installs logging as described by `config`.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_with_config(config: LogConfig) -> Result<(), InitError> {
    let json_layer = match &config.log_path {
        Some(path) => {
            let writer = LogFileWriter::open(path).map_err(|source| InitError::LogFile {
                path: path.clone(),
                source,
            })?;
            Some(
                JsonLayer::new(config.service_name.clone(), writer)
                    .with_filter(env_filter(&config.default_level)),
            )
        }
        None => None,
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "observability initialized"
    );
    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, trace, warn};
