//! Error types for GeoServer access.

use thiserror::Error;

/// Result type alias using GeoServerError.
pub type GeoServerResult<T> = Result<T, GeoServerError>;

/// Errors raised while talking to GeoServer or preparing uploads.
#[derive(Debug, Error)]
pub enum GeoServerError {
    #[error("Invalid GeoServer URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid {kind} name: '{value}'")]
    InvalidName { kind: &'static str, value: String },

    #[error("GeoServer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GeoServer returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid GeoJSON response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot zip the files: {0}")]
    Archive(String),
}

impl GeoServerError {
    /// Whether the error originated from the remote server or the network
    /// rather than from local input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            GeoServerError::Request(_)
                | GeoServerError::UnexpectedStatus { .. }
                | GeoServerError::Decode(_)
        )
    }
}

impl From<zip::result::ZipError> for GeoServerError {
    fn from(err: zip::result::ZipError) -> Self {
        GeoServerError::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for GeoServerError {
    fn from(err: walkdir::Error) -> Self {
        GeoServerError::Archive(err.to_string())
    }
}
