//! Store error handling
//!
//! Typed errors for the persistence layer. Services wrap these with
//! `anyhow` context; read paths degrade, mutations propagate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Referenced reading does not exist
    #[error("Reading not found: '{id}'")]
    NotFound { id: String },

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored row cannot be decoded into a model
    #[error("Corrupt row for reading '{id}': {details}")]
    CorruptRow { id: String, details: String },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            id: "r-missing".to_string(),
        };
        assert!(err.to_string().contains("r-missing"));
    }

    #[test]
    fn test_database_error_from() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
