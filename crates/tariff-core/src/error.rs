use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tariff dashboard crates.
#[derive(Error, Debug)]
pub enum TariffError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date string supplied by the caller did not match any recognised format.
    #[error("Invalid date: {0}")]
    DateParse(String),

    /// A classification name is not one of the recognised schemes.
    #[error("Invalid classification: {0}")]
    InvalidClassification(String),

    /// A filter was applied before any classification was selected.
    #[error("No classification selected")]
    MissingClassification,

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A required dataset file is missing from the data directory.
    #[error("Dataset file not found: {0}")]
    DataFileNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the tariff crates.
pub type Result<T> = std::result::Result<T, TariffError>;
