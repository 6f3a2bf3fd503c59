//! Page template with `{{ name }}` placeholders.
use super::metadata::DocMetadata;
use regex::{Captures, Regex};
use std::collections::HashMap;

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">

    <title>{{ title }}</title>
    <meta name="title" content="{{ title }}">
    <meta name="description" content="{{ description }}">
    <meta name="keywords" content="{{ keywords }}">
    <meta name="author" content="{{ author }}">
    <meta name="robots" content="index, follow">
    <link rel="canonical" href="{{ canonical_url }}">

    <meta property="og:type" content="article">
    <meta property="og:url" content="{{ canonical_url }}">
    <meta property="og:title" content="{{ title }}">
    <meta property="og:description" content="{{ description }}">

    <meta property="twitter:card" content="summary_large_image">
    <meta property="twitter:url" content="{{ canonical_url }}">
    <meta property="twitter:title" content="{{ title }}">
    <meta property="twitter:description" content="{{ description }}">

    <script type="application/ld+json">
{{ structured_data }}
    </script>

    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
        pre { background: #f4f4f4; padding: 15px; overflow-x: auto; border-radius: 5px; }
        code { background: #f4f4f4; padding: 2px 5px; border-radius: 3px; }
        h1, h2, h3 { margin-top: 1.5em; }
        a { color: #0066cc; }
    </style>
</head>
<body>
    <article>
        {{ content|safe }}
    </article>
</body>
</html>
"#;

/// Values substituted into a page template. Text values are HTML-escaped
/// here; `content` and `structured_data` are inserted as-is.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    vars: HashMap<&'static str, String>,
}

impl PageContext {
    #[must_use]
    pub fn new(meta: &DocMetadata, canonical_url: &str, base_url: &str, content: String) -> Self {
        let mut vars = HashMap::new();
        vars.insert("title", escape_html(&meta.title));
        vars.insert("description", escape_html(&meta.description));
        vars.insert("keywords", escape_html(&meta.keywords.join(", ")));
        vars.insert("author", escape_html(&meta.author));
        vars.insert("date_modified", escape_html(&meta.date_modified));
        vars.insert("canonical_url", escape_html(canonical_url));
        vars.insert("base_url", escape_html(base_url));
        vars.insert("structured_data", structured_data(meta, canonical_url));
        vars.insert("content", content);
        Self { vars }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct PageTemplate {
    source: String,
    placeholder: Regex,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PageTemplate {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            placeholder: Regex::new(r"\{\{\s*([\w.]+)\s*(?:\|\s*safe\s*)?\}\}").expect("valid placeholder regex"),
        }
    }

    /// Fill every placeholder. `metadata.title` is accepted as an alias for
    /// `title`; unknown names render empty.
    #[must_use]
    pub fn render(&self, ctx: &PageContext) -> String {
        self.placeholder
            .replace_all(&self.source, |caps: &Captures<'_>| {
                let name = caps[1].strip_prefix("metadata.").unwrap_or(&caps[1]);
                ctx.get(name).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON-LD `TechArticle` block for a page.
#[must_use]
pub fn structured_data(meta: &DocMetadata, url: &str) -> String {
    let value = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "TechArticle",
        "headline": meta.title,
        "description": meta.description,
        "author": { "@type": "Organization", "name": meta.author },
        "dateModified": meta.date_modified,
        "mainEntityOfPage": { "@type": "WebPage", "@id": url },
        "keywords": meta.keywords.join(", "),
    });
    // `</` would close the surrounding script element
    serde_json::to_string_pretty(&value).unwrap_or_default().replace("</", "<\\/")
}
