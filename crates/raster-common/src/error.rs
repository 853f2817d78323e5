//! Error types for raster view rendering.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for style parsing and view compositing.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Style Errors ===
    #[error("Malformed style document: {0}")]
    Malformed(String),

    // === Request Errors ===
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid band selection: {0}")]
    InvalidBandSelection(String),

    #[error("No matching resolution: {0}")]
    NotFound(String),

    // === Data Errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt tile: {0}")]
    CorruptTile(String),
}

impl RasterError {
    /// Create a Malformed error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an InvalidBandSelection error.
    pub fn invalid_band_selection(msg: impl Into<String>) -> Self {
        Self::InvalidBandSelection(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an Io error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a CorruptTile error.
    pub fn corrupt_tile(msg: impl Into<String>) -> Self {
        Self::CorruptTile(msg.into())
    }

    /// Whether the caller can carry on with a degraded result.
    ///
    /// Only a malformed style is recoverable: the view is then rendered
    /// without styling. Every compositing failure discards the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RasterError::Malformed(_))
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        RasterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::InvalidArgument(format!("JSON error: {}", err))
    }
}
