//! Error types for the site2md crate

use thiserror::Error;

use crate::config::ConfigError;
use crate::crawler::CrawlError;
use crate::crawler::storage::StorageError;
use crate::processor::ProcessError;

/// Result type for site2md operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for site2md operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration, reported before any work starts
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The fetch phase failed
    #[error("Crawl error: {0}")]
    Crawl(CrawlError),

    /// Reading or writing the workspace or output tree failed
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Extracting or converting a document failed
    #[error("Process error: {0}")]
    Process(ProcessError),
}
