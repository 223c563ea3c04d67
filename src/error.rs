//! Error type shared by the database, ingestion, and lookup layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

//-----------------------------------------------------------------------------

/// Errors reported by the variant store.
///
/// Rows dropped during ingestion and unmatched queries are not errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The database location cannot be used.
    #[error("Cannot initialize database at {}: {message}", .path.display())]
    StoreInit {
        /// Database directory or file.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },

    /// An ingestion batch does not have the expected columns.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// A query string, field selector, interval, or input cell could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reading from or writing to the database or an input file failed.
    #[error("Storage error: {0}")]
    StorageIo(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StorageIo(err.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::StorageIo(err.to_string())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

//-----------------------------------------------------------------------------
