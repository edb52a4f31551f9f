//! Error types for dirguard-core

use std::fmt;

/// Result type alias for dirguard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirguard operations
///
/// Policy outcomes (a PR touching the wrong directory, an unknown author)
/// are not errors; they are [`crate::policy::Verdict`] values. This type only
/// covers infrastructure failures.
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration or missing environment
    Config(String),

    /// Invalid path
    InvalidPath(String),

    /// I/O error
    Io(std::io::Error),

    /// Runtime error (Tokio, subprocess, etc.)
    Runtime(String),

    /// Transport-level HTTP error
    Http(String),

    /// Remote API answered with a non-success status
    Api {
        /// HTTP status code
        status: u16,
        /// Short description of the failed call
        message: String,
    },

    /// Roster CSV could not be read
    Roster(String),

    /// JSON encode/decode error
    Json(String),

    /// Prompt assembly error
    Prompt(String),

    /// Model API error
    Model(String),

    /// Git subprocess error
    Git(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidPath(path) => write!(f, "Invalid path: {}", path),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            Error::Http(msg) => write!(f, "HTTP error: {}", msg),
            Error::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            Error::Roster(msg) => write!(f, "Roster error: {}", msg),
            Error::Json(msg) => write!(f, "JSON error: {}", msg),
            Error::Prompt(msg) => write!(f, "Prompt error: {}", msg),
            Error::Model(msg) => write!(f, "Model error: {}", msg),
            Error::Git(msg) => write!(f, "Git error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the URL but never request headers, so the token stays out
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Roster(err.to_string())
    }
}

/// Fieldless error category for cheap matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// Invalid file path error
    InvalidPath,
    /// I/O operation error
    Io,
    /// Runtime error
    Runtime,
    /// Transport-level HTTP error
    Http,
    /// GitHub API status error
    Api,
    /// Roster parsing error
    Roster,
    /// JSON error
    Json,
    /// Prompt assembly error
    Prompt,
    /// Model API error
    Model,
    /// Git subprocess error
    Git,
}

impl Error {
    /// Get the error kind
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidPath(_) => ErrorKind::InvalidPath,
            Error::Io(_) => ErrorKind::Io,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Http(_) => ErrorKind::Http,
            Error::Api { .. } => ErrorKind::Api,
            Error::Roster(_) => ErrorKind::Roster,
            Error::Json(_) => ErrorKind::Json,
            Error::Prompt(_) => ErrorKind::Prompt,
            Error::Model(_) => ErrorKind::Model,
            Error::Git(_) => ErrorKind::Git,
        }
    }

    /// Borrow the error message without allocating.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::InvalidPath(msg)
            | Error::Runtime(msg)
            | Error::Http(msg)
            | Error::Roster(msg)
            | Error::Json(msg)
            | Error::Prompt(msg)
            | Error::Model(msg)
            | Error::Git(msg) => msg,
            Error::Api { message, .. } => message,
            Error::Io(_) => "I/O error",
        }
    }

    /// HTTP status for API errors
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
