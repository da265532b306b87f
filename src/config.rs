//! # Run Configuration
//!
//! A run is described by a single [`RunConfig`], assembled and validated once at
//! startup. Every component receives the part of it that it needs explicitly;
//! nothing reads configuration from global state.
//!
//! Validation happens before any network traffic: a malformed start URL, a
//! path pattern that is not a valid regex, or a CSS selector that does not
//! parse are all reported as [`ConfigError`]s.

use std::path::PathBuf;

use regex::Regex;
use scraper::Selector;
use thiserror::Error;

use crate::crawler::{CrawlTarget, CrawlerConfig};
use crate::processor::ConversionConfig;

/// Error type for invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The start URL could not be parsed
    #[error("invalid start URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The start URL parsed but has no host to crawl
    #[error("start URL '{0}' has no host")]
    MissingHost(String),

    /// The start URL uses a scheme other than http or https
    #[error("unsupported scheme '{scheme}' in start URL '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    /// The path pattern is not a valid regular expression
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A content or ignore selector is not valid CSS
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The output directory would be removed along with the workspace
    #[error("output directory {output} lies inside the workspace {workspace}")]
    OutputInsideWorkspace { output: PathBuf, workspace: PathBuf },
}

/// Everything a single run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Where the crawl starts
    pub target: CrawlTarget,

    /// Directory the markdown tree is written into
    pub output_dir: PathBuf,

    /// Fetch phase settings
    pub crawler: CrawlerConfig,

    /// Extraction and conversion settings
    pub conversion: ConversionConfig,
}

impl RunConfig {
    /// Validate the pieces of a run and bundle them.
    pub fn new(
        start_url: &str,
        output_dir: impl Into<PathBuf>,
        crawler: CrawlerConfig,
        conversion: ConversionConfig,
    ) -> Result<Self, ConfigError> {
        let target = CrawlTarget::parse(start_url)?;
        conversion.validate()?;

        Ok(Self {
            target,
            output_dir: output_dir.into(),
            crawler,
            conversion,
        })
    }

    /// Host every accepted page must share when domain restriction is on
    pub fn base_domain(&self) -> &str {
        self.target.host()
    }
}

/// Compile an optional path pattern.
pub fn parse_path_pattern(pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

/// Check that a CSS selector parses.
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Split a comma-separated selector list.
///
/// Entries are trimmed, empty entries dropped, and duplicates removed while
/// keeping the first occurrence's position.
pub fn parse_selector_list(list: &str) -> Vec<String> {
    let mut selectors: Vec<String> = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !selectors.iter().any(|s| s == entry) {
            selectors.push(entry.to_string());
        }
    }
    selectors
}
