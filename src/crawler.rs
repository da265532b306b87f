//! # Website Crawler Module
//!
//! This module covers everything on the fetch side of a run: deciding which
//! links belong to the crawl, fetching pages into a workspace directory, and
//! the file store used for both the workspace and the markdown output.
//!
//! ## Key Components
//!
//! - `CrawlTarget`: a parsed, immutable URL to crawl
//! - `UrlFilter` / `FilterRule`: the link acceptance predicate
//! - `SiteFetcher`: the seam the pipeline fetches through, with `HttpFetcher`
//!   as the default implementation
//! - `Storage`: the file store
//!
//! ## Usage
//!
//! The crawler is the first stage of a run. It writes raw HTML into the
//! workspace and reports what it fetched; the processor module then turns
//! each of those files into markdown.

mod config;
mod error;
mod fetcher;
pub mod storage;
mod url_filter;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::CrawlError;
pub use fetcher::{FetchRequest, HttpFetcher, SiteFetcher};
pub use storage::Storage;
pub use url_filter::{FilterRule, UrlFilter, accept};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::config::ConfigError;

/// A URL to crawl with its parsed components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    url: Url,
}

impl CrawlTarget {
    /// Parse a start URL. Only http(s) URLs with a host are valid targets.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingHost(url.to_string()));
        }

        Ok(Self { url: parsed })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host of the target, lowercased by URL parsing
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl std::fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}

/// One page the fetcher wrote into the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL the page was fetched from
    pub url: String,

    /// Path of the raw HTML, relative to the workspace
    pub path: PathBuf,

    /// Link distance from the start page
    pub depth: u32,
}

/// A followed link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub from: String,
    pub to: String,
}

/// What a fetch phase produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchReport {
    /// Pages written into the workspace, in fetch order
    pub pages: Vec<FetchedPage>,

    /// Links that passed the filter and were queued
    pub links: Vec<LinkEdge>,

    /// Number of discovered links the filter rejected
    pub rejected: usize,
}

impl FetchReport {
    /// URL recorded for a workspace-relative path, if the page was fetched
    pub fn url_for_path(&self, path: &std::path::Path) -> Option<&str> {
        self.pages
            .iter()
            .find(|page| page.path == path)
            .map(|page| page.url.as_str())
    }
}
