//! # Crawler Configuration Module
//!
//! Configuration for the fetch phase: traversal depth, page cap, request
//! pacing, and the link filter rule. Uses a builder pattern for flexible
//! configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

use regex::Regex;

use super::url_filter::FilterRule;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum link distance from the start page
    pub max_depth: u32,

    /// Maximum number of pages to fetch
    pub max_pages: u32,

    /// Delay in milliseconds between requests
    pub delay_ms: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// Which discovered links are followed
    pub filter_rule: FilterRule,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 500,
            delay_ms: 500,
            user_agent: format!("site2md/{}", env!("CARGO_PKG_VERSION")),
            filter_rule: FilterRule::default(),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the delay in milliseconds between requests
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Only follow links on the start URL's host
    pub fn restrict_to_base_domain(mut self, restrict: bool) -> Self {
        self.config.filter_rule.restrict_to_base_domain = restrict;
        self
    }

    /// Only follow links whose path matches this pattern
    pub fn path_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.config.filter_rule.path_pattern = pattern;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = CrawlerConfig::builder()
            .max_depth(1)
            .max_pages(10)
            .delay_ms(250)
            .user_agent("test-agent")
            .restrict_to_base_domain(false)
            .path_pattern(Some(Regex::new("^/docs/").unwrap()))
            .build();

        assert_eq!(config.max_depth, 1);
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.delay(), Duration::from_millis(250));
        assert_eq!(config.user_agent, "test-agent");
        assert!(!config.filter_rule.restrict_to_base_domain);
        assert!(config.filter_rule.path_pattern.is_some());
    }

    #[test]
    fn test_default_restricts_domain() {
        let config = CrawlerConfig::default();
        assert!(config.filter_rule.restrict_to_base_domain);
        assert!(config.filter_rule.path_pattern.is_none());
        assert!(config.user_agent.starts_with("site2md/"));
    }
}
