//! Error types for the metafile crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a template repository
#[derive(Error, Debug)]
pub enum Error {
    /// No metadata file exists at the requested template path
    #[error("no template found at '{0}'")]
    NotFound(String),

    /// Path is absolute, escapes the repository root, or contains the group delimiter
    #[error("invalid repository path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Address names a backend that is not implemented
    #[error("unsupported repository address: {0}")]
    UnsupportedRepository(String),

    /// Metadata file could not be parsed or serialized
    #[error("invalid metadata in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// IO error on a specific path
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed
    #[error("failed to walk repository: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means the template simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for metafile operations
pub type Result<T> = std::result::Result<T, Error>;
