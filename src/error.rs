//! Error types for run-notifier
//!
//! This module defines structured error types using the `thiserror` crate.
//! Only template and payload errors are fatal for a run; channel errors are
//! reported and absorbed by the notifier.

use std::io;
use thiserror::Error;

/// Main error type for the run-notifier application
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Error occurred during JSON parsing of an input document
    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// Error occurred while reading input or settings
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Settings file is unreadable or contains invalid values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Message template could not be opened or read
    #[error("Failed to read message template {path}: {source}")]
    TemplateReadError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Message template is malformed or references unknown values
    #[error("Failed to render message template {path}: {reason}")]
    TemplateRenderError { path: String, reason: String },

    /// Rendered template is not a valid JSON document
    #[error("Rendered message is not valid JSON: {0}")]
    PayloadError(#[source] serde_json::Error),

    /// Invalid lifecycle event structure
    #[error("Invalid lifecycle event: {0}")]
    InvalidInput(String),
}

impl NotifierError {
    /// Whether this error must terminate the hosting process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TemplateReadError { .. } | Self::TemplateRenderError { .. } | Self::PayloadError(_)
        )
    }
}

/// Errors raised by a notification channel while delivering a message
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Transport-level failure (connection, DNS, invalid URL)
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Webhook answered with a non-success status
    #[error("Webhook returned an error: {0}")]
    WebhookResponseError(String),
}

/// Result type alias for the notifier
pub type Result<T> = std::result::Result<T, NotifierError>;
