//! # site2md - documentation sites as local markdown
//!
//! This crate crawls a documentation website and converts its pages into a
//! tree of markdown files that mirrors the site's path structure.
//!
//! ## Features
//!
//! - Link filtering by domain and path pattern, applied before any request
//! - Main content selection with a CSS selector (first match wins)
//! - Noise removal by ignore selectors and inline event handler stripping
//! - Deterministic HTML to markdown conversion in a fixed style
//! - Per-page fault isolation: one bad page never stops a run
//! - Guaranteed cleanup of the temporary fetch workspace
//!
//! ## Example
//!
//! ```rust,no_run
//! use site2md::config::RunConfig;
//! use site2md::crawler::{CrawlerConfig, HttpFetcher};
//! use site2md::pipeline::{Pipeline, Workspace};
//! use site2md::processor::ConversionConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let crawler = CrawlerConfig::builder().max_depth(2).delay_ms(250).build();
//!     let conversion = ConversionConfig::builder()
//!         .selector("main")
//!         .ignore_selectors(vec!["script".to_string(), "style".to_string()])
//!         .build();
//!     let fetcher = HttpFetcher::new(&crawler.user_agent)?;
//!     let config = RunConfig::new("https://example.com/docs/", "output", crawler, conversion)?;
//!
//!     let report = Pipeline::new(config, fetcher)
//!         .run(Workspace::temporary()?)
//!         .await?;
//!     println!("Converted {} pages", report.converted.len());
//!     Ok(())
//! }
//! ```

mod error;

pub mod config;
pub mod crawler;
pub mod pipeline;
pub mod processor;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
