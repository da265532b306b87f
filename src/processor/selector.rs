//! Main content selection

use scraper::{Html, Selector};

use super::error::ProcessError;
use super::{Document, ExtractedContent};

/// Compile a CSS selector
pub fn parse_selector(selector: &str) -> Result<Selector, ProcessError> {
    Selector::parse(selector).map_err(|e| ProcessError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Find the main content of a document.
///
/// Returns the first element in document order that matches `selector`;
/// later matches are ignored. `None` when nothing matches.
pub fn select(document: &Document, selector: &Selector) -> Option<ExtractedContent> {
    let html = Html::parse_document(&document.html);
    let root = html.select(selector).next()?.id();
    Some(ExtractedContent::new(html, root))
}
