//! Error types for transectaz

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for transectaz operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset is locked by another process: {}", path.display())]
    ResourceLocked { path: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Statistics tool failed: {0}")]
    HostToolFailure(String),

    #[error("No active map session to publish into")]
    NoActiveSession,

    #[error("Shapefile format error: {0}")]
    Format(String),

    #[error("Map document error: {0}")]
    MapDocument(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

impl From<shapefile::Error> for Error {
    fn from(e: shapefile::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<dbase::Error> for Error {
    fn from(e: dbase::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MapDocument(e.to_string())
    }
}

/// Result type alias for transectaz operations
pub type Result<T> = std::result::Result<T, Error>;
