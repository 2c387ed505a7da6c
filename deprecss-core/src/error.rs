//! Typed error handling for deprecss.
//!
//! The detection pipeline itself never hands errors to its callers: parsing,
//! scanning, detection and cache maintenance degrade to "fewer results" and
//! log. These errors surface only from setup work (configuration, custom
//! patterns, enumerating a scan root) where the caller can do something
//! about them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deprecss operations.
#[derive(Error, Debug)]
pub enum DeprecssError {
    /// I/O error when reading files or walking directories
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A class pattern could not be built (bad regex, unknown category, ...)
    #[error("Pattern `{id}` is invalid: {message}")]
    Pattern { id: String, message: String },

    /// Stylesheet discovery failed (bad glob, unreadable root)
    #[error("Scan error at {path}: {message}")]
    Scan { path: PathBuf, message: String },
}

impl DeprecssError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a pattern error.
    pub fn pattern(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a scan error.
    pub fn scan(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Scan {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::Scan { path, .. } => Some(path),
            Self::Pattern { .. } => None,
        }
    }
}

/// Convenience type alias for deprecss results.
pub type DeprecssResult<T> = Result<T, DeprecssError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeprecssResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeprecssResult<T> {
        self.map_err(|e| DeprecssError::io(path, e))
    }
}
