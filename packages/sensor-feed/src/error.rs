use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to open data source {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Header has {found} columns, expected {expected}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("No more data rows in source")]
    EndOfData,

    #[error("Malformed row at line {line}: expected {expected} fields, {reason}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
        reason: String,
    },

    #[error("No output buffer set")]
    NoDestination,

    #[error("Data source is not open, call begin() first")]
    NotOpen,

    #[error("{kind} buffer holds {actual} elements, needs {required}")]
    BufferTooSmall {
        kind: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
