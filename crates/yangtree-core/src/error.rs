//! Error types for statement tree operations
//!
//! Problems in the *modelled input* are never errors: they become
//! [`Finding`](crate::diagnostics::Finding)s. `YangError` covers misuse of the
//! API (stale node ids, illegal mutations), unreadable configuration and
//! documents, and the fail-fast abort.

use crate::diagnostics::Finding;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the statement tree engine
#[derive(Debug, Error)]
pub enum YangError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document tree could not be decoded
    #[error("Document error in '{source_name}': {message}")]
    DocumentError {
        source_name: String,
        message: String,
    },

    /// A grammar table could not be loaded
    #[error("Grammar error: {message}")]
    GrammarError { message: String },

    /// A node id no longer refers to a live node
    #[error("Statement node {id} not found")]
    NodeNotFound { id: u32 },

    /// A tree root id does not exist
    #[error("Tree root {id} not found")]
    RootNotFound { id: u32 },

    /// A mutation would break the ownership invariants of the tree
    #[error("Invalid mutation: {message}")]
    InvalidMutation { message: String },

    /// Processing stopped at the first finding of the configured severity
    #[error("Fail-fast triggered: {finding}")]
    FailFast { finding: Box<Finding> },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl YangError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a document decoding error
    pub fn document_error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a grammar loading error
    pub fn grammar_error(message: impl Into<String>) -> Self {
        Self::GrammarError {
            message: message.into(),
        }
    }

    /// Create an invalid mutation error
    pub fn invalid_mutation(message: impl Into<String>) -> Self {
        Self::InvalidMutation {
            message: message.into(),
        }
    }

    /// Create a fail-fast error carrying the finding that triggered it
    pub fn fail_fast(finding: Finding) -> Self {
        Self::FailFast {
            finding: Box::new(finding),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for YangError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
