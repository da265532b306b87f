//! Error types for the crawler module

use crate::crawler::storage::StorageError;
use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The start page could not be fetched, so there is nothing to crawl
    #[error("failed to fetch start page {url}: {reason}")]
    StartPage { url: String, reason: String },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Writing into the workspace failed
    #[error("Workspace error: {0}")]
    Storage(#[from] StorageError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        CrateError::Crawl(err)
    }
}
