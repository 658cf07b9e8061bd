//! Error types for the polymerge engine.

use thiserror::Error;

/// Errors that can occur during polygon ingestion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The supplied geometry cannot form a valid polygon.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
