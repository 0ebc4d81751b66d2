//! Error types for snapshot serialization

use thiserror::Error;

/// Result type alias for serialization operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a document
///
/// Only failures that leave no meaningful partial result surface here. Per-element
/// problems (a tainted canvas, a failing transformation hook) are recorded as
/// snapshot warnings instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The source document has no root element to clone
    #[error("Document has no root element")]
    MissingRootElement,

    /// A data URL could not be decomposed into mimetype and payload
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// A resource URL could not be built from the document URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The snapshot could not be encoded as JSON
    #[error("Failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
