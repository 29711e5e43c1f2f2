use std::path::PathBuf;
use thiserror::Error;

/// The main error type for curation operations.
#[derive(Debug, Error)]
pub enum CurateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read annotation collection {path}: {source}")]
    CollectionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed annotation collection {path}: {source}")]
    MalformedCollection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation collection to {path}: {source}")]
    CollectionWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Backup {path} already holds an earlier version; choose a new backup tag")]
    BackupConflict { path: PathBuf },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Referential integrity violation: {message}")]
    ReferentialIntegrity { message: String },

    #[error("Category sets differ: {message}")]
    CategoryMismatch { message: String },

    #[error("Renamed image file {file_name} collides with an existing image")]
    FileNameCollision { file_name: String },

    #[error("No room in the {kind} id space above {id}")]
    IdOverflow { kind: &'static str, id: u64 },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
    },
}
