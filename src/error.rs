use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Broad classes of pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, malformed CSV, or data that does not fit the table.
    Input,
    /// The relational store could not be reached or dropped the connection.
    Connectivity,
    /// Records that parse but cannot be aggregated.
    Data,
    Configuration,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source file not found: {path:?}")]
    SourceNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unmapped disease label {label:?}")]
    UnmappedLabel { label: Option<String> },

    #[error("table {table} has no rows to aggregate")]
    EmptySource { table: String },

    #[error("invalid grouping column {column:?}")]
    InvalidGroupingColumn { column: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SourceNotFound { .. }
            | PipelineError::Io(_)
            | PipelineError::Csv(_)
            | PipelineError::Polars(_)
            | PipelineError::SchemaMismatch(_)
            | PipelineError::Json(_) => ErrorKind::Input,
            PipelineError::Database(e) => match e {
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Configuration(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => ErrorKind::Connectivity,
                _ => ErrorKind::Input,
            },
            PipelineError::UnmappedLabel { .. } | PipelineError::EmptySource { .. } => {
                ErrorKind::Data
            }
            PipelineError::InvalidGroupingColumn { .. }
            | PipelineError::Config(_)
            | PipelineError::Toml(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
