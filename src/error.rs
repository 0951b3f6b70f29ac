use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Schema mismatch in {source_name}: missing columns {missing:?}, conflicting columns {conflicting:?}")]
    SchemaMismatch {
        source_name: String,
        missing: Vec<String>,
        conflicting: Vec<String>,
    },

    #[error("Column '{column}' not found")]
    MissingColumn { column: String },

    #[error("Cannot convert value '{value}' in column '{column}' to {target}")]
    TypeCoercion {
        column: String,
        value: String,
        target: String,
    },

    #[error("Sync to {destination} failed: {details}")]
    Sync { destination: String, details: String },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        ProcessingError::MissingColumn {
            column: column.into(),
        }
    }
}
