//! Noise removal for extracted content

use scraper::{ElementRef, Node};
use tracing::warn;

use super::ExtractedContent;
use super::selector::parse_selector;

/// Inline event handler attributes removed when stripping inline JavaScript
pub const INLINE_EVENT_HANDLERS: [&str; 7] = [
    "onclick",
    "onload",
    "onmouseover",
    "onmouseout",
    "onkeydown",
    "onkeyup",
    "onkeypress",
];

/// Remove noise from extracted content.
///
/// Each ignore selector is run as its own query, in order, and every
/// descendant it matches is detached. With `strip_inline_handlers` the
/// [`INLINE_EVENT_HANDLERS`] attributes are then removed from every remaining
/// element, leaving the element and its other attributes alone.
pub fn strip(
    mut content: ExtractedContent,
    ignore_selectors: &[String],
    strip_inline_handlers: bool,
) -> ExtractedContent {
    for selector_str in ignore_selectors {
        let selector = match parse_selector(selector_str) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping ignore selector: {}", e);
                continue;
            }
        };

        let matched: Vec<_> = match content.root() {
            Some(root) => root.select(&selector).map(|element| element.id()).collect(),
            None => return content,
        };

        let tree = content.tree_mut();
        for id in matched {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }
    }

    if strip_inline_handlers {
        let with_handlers: Vec<_> = match content.root() {
            Some(root) => root
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|element| {
                    element
                        .value()
                        .attrs()
                        .any(|(name, _)| INLINE_EVENT_HANDLERS.contains(&name))
                })
                .map(|element| element.id())
                .collect(),
            None => return content,
        };

        let tree = content.tree_mut();
        for id in with_handlers {
            if let Some(mut node) = tree.get_mut(id) {
                if let Node::Element(element) = node.value() {
                    element
                        .attrs
                        .retain(|name, _| !INLINE_EVENT_HANDLERS.contains(&&*name.local));
                }
            }
        }
    }

    content
}
