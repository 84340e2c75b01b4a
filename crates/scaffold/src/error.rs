//! Error types for template resolution and execution

use metafile::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a template run
#[derive(Error, Debug)]
pub enum Error {
    /// No template exists at the address
    #[error("template not found: '{0}'")]
    TemplateNotFound(String),

    /// Template has no group with the requested name
    #[error("template '{template}' has no group named '{group}'")]
    GroupNotFound { template: String, group: String },

    /// A group member resolves back to a template being expanded
    #[error("cyclic group reference: {}", .chain.join(" -> "))]
    CyclicGroupReference { chain: Vec<String> },

    /// A file listed in a metafile is absent from the repository
    #[error("template '{template}' lists missing file '{file}'")]
    MissingTemplateFile { template: String, file: String },

    /// Variable assignment is not of the form `key=value`
    #[error("invalid assignment '{0}': expected key=value")]
    InvalidAssignment(String),

    /// Prompt declares a regular expression that does not compile
    #[error("prompt '{variable}' has an invalid regexp: {source}")]
    InvalidPrompt {
        variable: String,
        #[source]
        source: regex::Error,
    },

    /// A required variable has no value and cannot be asked for
    #[error("no value for required variable '{0}'")]
    PromptUnanswered(String),

    /// An answer failed validation and cannot be asked for again
    #[error("invalid value for '{variable}': {reason}")]
    InvalidAnswer { variable: String, reason: String },

    /// Reading an answer failed
    #[error("failed to read value for '{variable}': {message}")]
    PromptFailed { variable: String, message: String },

    /// Output targets already exist or collide with each other
    #[error("{} target(s) already exist or collide: {}", .0.len(), display_paths(.0))]
    TargetConflict(Vec<PathBuf>),

    /// An external action failed and was not marked no_fail
    #[error("{phase} action '{command}' failed: {reason}")]
    ActionFailed {
        phase: Phase,
        command: String,
        reason: String,
    },

    /// A template file failed to parse or render
    #[error("failed to render {template_file} -> {}: {message}", .target.display())]
    RenderError {
        template_file: String,
        target: PathBuf,
        message: String,
    },

    /// Expanded path is absolute or escapes its base directory
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Structured-data input could not be loaded
    #[error("invalid data file {}: {message}", .path.display())]
    InvalidData { path: PathBuf, message: String },

    /// Repository error
    #[error(transparent)]
    Repository(#[from] metafile::Error),

    /// IO error on a specific path
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Restoring the output directory after a failure failed too
    #[error("{original} (restoring the backup also failed: {restore})")]
    RestoreFailed {
        original: Box<Error>,
        restore: Box<Error>,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for scaffold operations
pub type Result<T> = std::result::Result<T, Error>;
