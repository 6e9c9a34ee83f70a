//! Error types for the playstyle core library.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all playstyle core operations.
#[derive(Error, Debug)]
pub enum PlaystyleError {
    /// The event store database file does not exist.
    #[error("Database not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    /// SQLite query or connection error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaystyleError {
    /// Whether the error means the store is absent rather than broken.
    #[must_use]
    pub fn is_store_missing(&self) -> bool {
        matches!(self, Self::StoreNotFound(_))
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PlaystyleError>;
