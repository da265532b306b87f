//! Error types for the processor module

use crate::error::Error as CrateError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Nothing in the page matched the content selector
    #[error("no element matches content selector '{selector}'")]
    NoContentMatch { selector: String },

    /// A selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    /// The page could not be read from the workspace
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The markdown renderer rejected the content
    #[error("failed to convert to markdown: {reason}")]
    Convert { reason: String },

    /// The artifact could not be written
    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        CrateError::Process(err)
    }
}
