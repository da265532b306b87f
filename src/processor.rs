//! # Content Processor Module
//!
//! Turns one fetched page into markdown. Processing happens in three steps,
//! each a plain function of its inputs and the run's [`ConversionConfig`]:
//!
//! 1. [`select`] finds the first element matching the content selector
//! 2. [`strip`] removes ignored elements and inline event handlers from it
//! 3. [`MarkdownConverter`] renders what is left as markdown
//!
//! [`process_document`] chains the three for the pipeline.

mod config;
mod error;
mod markdown;
mod selector;
mod stripper;

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use error::ProcessError;
pub use markdown::{BUILTIN_BLOCKED_TAGS, MarkdownConverter, convert};
pub use selector::{parse_selector, select};
pub use stripper::{INLINE_EVENT_HANDLERS, strip};

use std::path::PathBuf;

use ego_tree::{NodeId, Tree};
use scraper::{ElementRef, Html, Node};

/// A raw page read back from the workspace
#[derive(Debug, Clone)]
pub struct Document {
    /// URL the page was fetched from
    pub url: String,

    /// Workspace-relative path of the page
    pub path: PathBuf,

    /// The page's HTML as fetched
    pub html: String,
}

/// The main-content subtree of a document.
///
/// Owns its own parsed tree, so stripping it never affects the [`Document`]
/// it came from.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    html: Html,
    root: NodeId,
}

impl ExtractedContent {
    fn new(html: Html, root: NodeId) -> Self {
        Self { html, root }
    }

    /// The selected element
    pub fn root(&self) -> Option<ElementRef<'_>> {
        self.html.tree.get(self.root).and_then(ElementRef::wrap)
    }

    /// Name of the selected element
    pub fn tag_name(&self) -> Option<&str> {
        self.root().map(|element| element.value().name())
    }

    /// Serialized subtree including the selected element
    pub fn html(&self) -> String {
        self.root().map(|element| element.html()).unwrap_or_default()
    }

    /// Serialized children of the selected element
    pub fn inner_html(&self) -> String {
        self.root()
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    fn tree_mut(&mut self) -> &mut Tree<Node> {
        &mut self.html.tree
    }
}

/// A finished markdown file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownArtifact {
    pub relative_path: PathBuf,
    pub text: String,
}

/// Select, strip and convert one document.
///
/// A document without a content match yields [`ProcessError::NoContentMatch`];
/// the caller decides how loudly to report it.
pub fn process_document(
    document: &Document,
    config: &ConversionConfig,
    converter: &MarkdownConverter,
) -> Result<String, ProcessError> {
    let selector = parse_selector(&config.selector)?;

    let content = select(document, &selector).ok_or_else(|| ProcessError::NoContentMatch {
        selector: config.selector.clone(),
    })?;

    let cleaned = strip(
        content,
        &config.ignore_selectors,
        config.strip_inline_event_handlers,
    );

    converter.convert(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(html: &str) -> Document {
        Document {
            url: "https://example.com/docs/".to_string(),
            path: PathBuf::from("docs/index.html"),
            html: html.to_string(),
        }
    }

    #[test]
    fn test_process_document() {
        let config = ConversionConfig::builder()
            .selector("main")
            .ignore_selectors(vec!["script".to_string(), ".ad".to_string()])
            .build();
        let converter = MarkdownConverter::new(&config).unwrap();

        let doc = document(
            r#"<html><body>
                <nav><a href="/">Home</a></nav>
                <main>
                    <h1>Title</h1>
                    <script>alert(1)</script>
                    <div class="ad">Buy now</div>
                    <p onclick="track()">Hello <a href="/x">link</a></p>
                </main>
            </body></html>"#,
        );

        let markdown = process_document(&doc, &config, &converter).unwrap();
        assert!(markdown.contains("# Title"));
        assert!(markdown.contains("[link](/x)"));
        assert!(!markdown.contains("alert"));
        assert!(!markdown.contains("Buy now"));
    }

    #[test]
    fn test_process_document_without_match() {
        let config = ConversionConfig::default();
        let converter = MarkdownConverter::new(&config).unwrap();

        let result = process_document(
            &document("<html><body><div>No main here</div></body></html>"),
            &config,
            &converter,
        );

        match result {
            Err(ProcessError::NoContentMatch { selector }) => assert_eq!(selector, "main"),
            other => panic!("Expected NoContentMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_extracted_content_is_independent_of_document() {
        let doc = document("<main><script>x</script><p>kept</p></main>");
        let selector = parse_selector("main").unwrap();

        let content = select(&doc, &selector).unwrap();
        let cleaned = strip(content, &["script".to_string()], true);

        assert_eq!(cleaned.inner_html(), "<p>kept</p>");
        assert!(doc.html.contains("<script>x</script>"));
    }
}
