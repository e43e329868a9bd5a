use std::io;
use thiserror::Error;

/// Everything that can go wrong before or while replaying a trace
///
/// Misses, evictions and write-backs are never errors, they are what the simulator counts. Errors
/// are limited to the collaborators: reading files, parsing configuration and trace text, and
/// rejecting a geometry which cannot describe a cache
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("missing configuration key {0}")]
    MissingKey(&'static str),

    #[error("invalid value {value:?} for configuration key {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("couldn't parse the JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid cache geometry: {0}")]
    Geometry(String),

    #[error("malformed trace record on line {line}: {reason}")]
    Trace { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, SimError>;
