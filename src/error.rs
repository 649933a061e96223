//! Unified error types for the image browser.

use thiserror::Error;

/// Application-specific errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Corrupt or unsupported image data.
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    /// A file, URI or archive entry could not be opened.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// A worker could not hand its result to the UI thread.
    #[error("ui hand-off failed: {0}")]
    Threading(String),
    /// Error scanning a directory for children.
    #[error("directory scan failed: {0}")]
    DirectoryScan(String),
    /// Malformed ZIP archive.
    #[error("archive error: {0}")]
    Archive(String),
    /// Invalid settings file or value.
    #[error("configuration error: {0}")]
    Config(String),
    /// Operation not available for this kind of item.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => AppError::SourceUnavailable(io.to_string()),
            other => AppError::ImageDecode(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::SourceUnavailable(err.to_string())
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => AppError::SourceUnavailable(io.to_string()),
            zip::result::ZipError::FileNotFound => {
                AppError::SourceUnavailable("archive entry not found".to_string())
            }
            other => AppError::Archive(other.to_string()),
        }
    }
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
