//! # Conversion Configuration Module
//!
//! Settings for turning a page into markdown: which element holds the main
//! content, which elements are noise, and whether inline event handlers are
//! stripped. Supplied once per run and never changed during it.

use crate::config::{ConfigError, parse_selector};

/// Configuration for content extraction and conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// CSS selector for the main content; the first match is used
    pub selector: String,

    /// CSS selectors for elements to drop, applied in order
    pub ignore_selectors: Vec<String>,

    /// Remove inline `on*` event handler attributes
    pub strip_inline_event_handlers: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            selector: "main".to_string(),
            ignore_selectors: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "footer".to_string(),
                "header".to_string(),
                ".ads".to_string(),
            ],
            strip_inline_event_handlers: true,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::new()
    }

    /// Check that every selector parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_selector(&self.selector)?;
        for selector in &self.ignore_selectors {
            parse_selector(selector)?;
        }
        Ok(())
    }
}

/// Builder for ConversionConfig
#[derive(Debug, Default)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// Set the main content selector
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.config.selector = selector.into();
        self
    }

    /// Set the selectors for elements to drop, keeping the first of any repeats
    pub fn ignore_selectors(mut self, ignore_selectors: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(ignore_selectors.len());
        for selector in ignore_selectors {
            if !unique.contains(&selector) {
                unique.push(selector);
            }
        }
        self.config.ignore_selectors = unique;
        self
    }

    /// Set whether inline event handlers are removed
    pub fn strip_inline_event_handlers(mut self, strip: bool) -> Self {
        self.config.strip_inline_event_handlers = strip;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConversionConfig {
        self.config
    }
}
