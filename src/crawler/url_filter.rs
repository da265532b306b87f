//! Link acceptance rules for the crawl
//!
//! The filter is a pure predicate over URL strings. The fetcher consults it
//! for every discovered link before the link is queued, so a rejected page is
//! never requested.

use regex::Regex;
use url::Url;

/// Which links a crawl keeps
#[derive(Debug, Clone)]
pub struct FilterRule {
    /// Reject links whose host differs from the base domain
    pub restrict_to_base_domain: bool,

    /// When set, only paths matching this pattern pass, whatever the host
    pub path_pattern: Option<Regex>,
}

impl Default for FilterRule {
    fn default() -> Self {
        Self {
            restrict_to_base_domain: true,
            path_pattern: None,
        }
    }
}

/// Decide whether `url` belongs to the crawl.
///
/// Malformed URLs and non-http(s) schemes are rejected rather than reported.
pub fn accept(url: &str, base_domain: &str, rule: &FilterRule) -> bool {
    match Url::parse(url) {
        Ok(parsed) => accept_parsed(&parsed, base_domain, rule),
        Err(_) => false,
    }
}

fn accept_parsed(url: &Url, base_domain: &str, rule: &FilterRule) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    if rule.restrict_to_base_domain {
        match url.host_str() {
            Some(host) if host.eq_ignore_ascii_case(base_domain) => {}
            _ => return false,
        }
    }

    if let Some(pattern) = &rule.path_pattern {
        if !pattern.is_match(url.path()) {
            return false;
        }
    }

    true
}

/// A filter rule bound to the base domain of a run
#[derive(Debug, Clone)]
pub struct UrlFilter {
    base_domain: String,
    rule: FilterRule,
}

impl UrlFilter {
    pub fn new(base_domain: impl Into<String>, rule: FilterRule) -> Self {
        Self {
            base_domain: base_domain.into(),
            rule,
        }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Check a URL string
    pub fn accept(&self, url: &str) -> bool {
        accept(url, &self.base_domain, &self.rule)
    }

    /// Check an already parsed URL
    pub fn accept_url(&self, url: &Url) -> bool {
        accept_parsed(url, &self.base_domain, &self.rule)
    }
}
