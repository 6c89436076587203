/*!
 * Error types for the srt-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

use crate::session::models::FileId;

/// Errors that can occur when talking to the translation endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when building or sending the request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-success status returned by the service
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Body or reason returned by the service
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// File name does not carry a `.srt` or `.vtt` extension
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),
}

/// Errors that can occur during a translation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A single cue call failed and took the whole run down with it
    #[error("Translation of cue {index} failed: {source}")]
    EntryFailed {
        /// Zero-based cue position in the sequence
        index: usize,
        /// Underlying provider failure
        source: ProviderError,
    },

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
}

/// Errors raised by session mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("File not found in session: {0}")]
    FileNotFound(FileId),

    #[error("Language '{language}' is not selected for file {file}")]
    LanguageNotSelected { file: FileId, language: String },

    /// Not an English language name known to ISO 639
    #[error("Unknown language: '{0}'")]
    UnknownLanguage(String),

    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from session handling
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl TranslationError {
    /// Whether the failure came from the remote service rather than local input
    pub fn is_service_failure(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::EntryFailed { .. })
    }
}
