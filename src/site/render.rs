use crate::errors::LinkGraphError;
use comrak::nodes::NodeValue;
use comrak::{format_html, parse_document, Arena, Options};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Link,
    Image,
}

/// Callback that may replace a link or image URL before rendering.
pub type UrlRewriter<'a> = dyn FnMut(UrlKind, &str) -> Option<String> + 'a;

/// Markdown → HTML collaborator used by the site generator.
pub trait MarkdownRenderer {
    /// # Errors
    /// Returns an error when the backend cannot produce HTML.
    fn render_html(&self, markdown: &str, rewrite: &mut UrlRewriter<'_>) -> Result<String, LinkGraphError>;
}

/// GitHub-flavoured rendering through comrak.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComrakRenderer;

impl MarkdownRenderer for ComrakRenderer {
    fn render_html(&self, markdown: &str, rewrite: &mut UrlRewriter<'_>) -> Result<String, LinkGraphError> {
        let arena = Arena::new();
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;
        options.extension.header_ids = Some(String::new());
        options.render.hardbreaks = true;
        options.render.unsafe_ = true;

        let root = parse_document(&arena, markdown, &options);
        for node in root.descendants() {
            let mut data = node.data.borrow_mut();
            match data.value {
                NodeValue::Link(ref mut link) => {
                    if let Some(url) = rewrite(UrlKind::Link, &link.url) {
                        link.url = url;
                    }
                }
                NodeValue::Image(ref mut link) => {
                    if let Some(url) = rewrite(UrlKind::Image, &link.url) {
                        link.url = url;
                    }
                }
                _ => {}
            }
        }

        let mut html = Vec::new();
        format_html(root, &options, &mut html)?;
        String::from_utf8(html).map_err(|e| LinkGraphError::Site(format!("renderer produced invalid UTF-8: {e}")))
    }
}

/// Point links at other markdown files to the generated `.html` pages.
#[must_use]
pub fn rewrite_markdown_href(href: &str) -> Option<String> {
    if href.starts_with('#') || crate::parser::is_external_link(href) {
        return None;
    }
    let (path, fragment) = match href.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (href, None),
    };
    let stem = path.strip_suffix(".md")?;
    let stem = stem.strip_prefix("./").unwrap_or(stem);
    Some(match fragment {
        Some(f) => format!("{stem}.html#{f}"),
        None => format!("{stem}.html"),
    })
}
