//! HTML to markdown conversion
//!
//! Rendering goes through [`htmd`] with a fixed style: ATX headings, fenced
//! code blocks, `-` bullets, dash rules, backslash line breaks and inline
//! links. The converter keeps no state between calls, so the same subtree
//! always produces the same bytes.
//!
//! Elements named in [`BUILTIN_BLOCKED_TAGS`] and elements matching any of the
//! run's ignore selectors render as nothing, whether or not the stripper has
//! already removed them.

use htmd::HtmlToMarkdown;
use htmd::options::{
    BrStyle, BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, HrStyle,
    LinkReferenceStyle, LinkStyle, Options,
};
use scraper::Selector;

use super::ExtractedContent;
use super::config::ConversionConfig;
use super::error::ProcessError;
use super::selector::parse_selector;

/// Elements that never produce output
pub const BUILTIN_BLOCKED_TAGS: [&str; 7] = [
    "script", "style", "iframe", "svg", "button", "noscript", "template",
];

fn markdown_options() -> Options {
    Options {
        heading_style: HeadingStyle::Atx,
        hr_style: HrStyle::Dashes,
        br_style: BrStyle::Backslash,
        link_style: LinkStyle::Inlined,
        link_reference_style: LinkReferenceStyle::Full,
        code_block_style: CodeBlockStyle::Fenced,
        code_block_fence: CodeBlockFence::Backticks,
        bullet_list_marker: BulletListMarker::Dash,
        ..Default::default()
    }
}

/// Converts extracted content to markdown
pub struct MarkdownConverter {
    ignore: Vec<Selector>,
    renderer: HtmlToMarkdown,
}

impl MarkdownConverter {
    /// Build a converter that also suppresses the run's ignore selectors
    pub fn new(config: &ConversionConfig) -> Result<Self, ProcessError> {
        let ignore = config
            .ignore_selectors
            .iter()
            .map(|selector| parse_selector(selector))
            .collect::<Result<Vec<_>, _>>()?;

        let renderer = HtmlToMarkdown::builder()
            .skip_tags(BUILTIN_BLOCKED_TAGS.to_vec())
            .options(markdown_options())
            .build();

        Ok(Self { ignore, renderer })
    }

    /// Render the selected element as markdown.
    ///
    /// Non-empty output ends with a single newline.
    pub fn convert(&self, content: &ExtractedContent) -> Result<String, ProcessError> {
        let mut content = content.clone();
        self.detach_ignored(&mut content);

        let html = content.html();
        if html.is_empty() {
            return Ok(String::new());
        }

        let markdown = self
            .renderer
            .convert(&html)
            .map_err(|e| ProcessError::Convert {
                reason: e.to_string(),
            })?;

        let markdown = markdown.trim();
        if markdown.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{markdown}\n"))
    }

    fn detach_ignored(&self, content: &mut ExtractedContent) {
        let matched: Vec<_> = match content.root() {
            Some(root) => self
                .ignore
                .iter()
                .flat_map(|selector| root.select(selector).map(|element| element.id()))
                .collect(),
            None => return,
        };

        let tree = content.tree_mut();
        for id in matched {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Convert content with a one-off converter for `config`
pub fn convert(content: &ExtractedContent, config: &ConversionConfig) -> Result<String, ProcessError> {
    MarkdownConverter::new(config)?.convert(content)
}
