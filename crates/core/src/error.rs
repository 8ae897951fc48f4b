//! Error types for deck generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a slide deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a local file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The requested slide count is below the minimum.
    #[error("Slide count must be at least {min}, got {requested}")]
    InvalidSlideCount { requested: usize, min: usize },

    /// The completion service never returned usable slide data.
    #[error("Failed to get valid slide data after {attempts} attempt(s)")]
    OutlineUnavailable { attempts: u32 },

    /// No template files were found in the template directory.
    #[error("No PPTX templates found in '{}'", .0.display())]
    NoTemplates(PathBuf),

    /// The template is missing a part or relationship we need.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or generation error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// Image bytes could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// HTTP transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A remote service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A remote service answered with a body we could not interpret.
    #[error("Unexpected response: {0}")]
    ResponseError(String),

    /// Missing or invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
