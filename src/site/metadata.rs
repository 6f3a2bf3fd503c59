//! Frontmatter and SEO metadata extraction.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Path fragments that keep a document out of the published site.
pub const UNPUBLISHED_PATHS: &[&str] = &["doc/archive", "/archive/", "/.archive/", "/draft/", "/.draft/"];

pub const DO_NOT_PUBLISH_TAG: &str = "__DO_NOT_PUBLISH__";

const MAX_KEYWORDS: usize = 15;
const MAX_DESCRIPTION: usize = 300;
const DESCRIPTION_TARGET: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub date_modified: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Keywords>,
    pub date: Option<serde_yaml::Value>,
    pub author: Option<String>,
    pub publish: Option<bool>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<String>),
    Csv(String),
}

impl Keywords {
    fn into_vec(self) -> Vec<String> {
        let raw = match self {
            Self::List(v) => v,
            Self::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        raw.into_iter().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect()
    }
}

/// Split a leading `---` YAML block from the body.
#[must_use]
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n").or_else(|| content.strip_prefix("---\r\n")) else {
        return (None, content);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse frontmatter YAML. Malformed YAML is logged and treated as absent.
#[must_use]
pub fn parse_frontmatter(yaml: &str) -> FrontMatter {
    if yaml.trim().is_empty() {
        return FrontMatter::default();
    }
    serde_yaml::from_str(yaml).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed frontmatter: {e}");
        FrontMatter::default()
    })
}

/// Whether a document belongs in the generated site.
#[must_use]
pub fn should_publish(content: &str, rel_path: &Path) -> bool {
    let fm = parse_frontmatter(split_frontmatter(content).0.unwrap_or(""));
    if fm.publish == Some(false) || fm.published == Some(false) {
        return false;
    }
    if content.contains(DO_NOT_PUBLISH_TAG) {
        return false;
    }
    // leading slash so top-level `draft/` matches `/draft/`
    let rel = format!("/{}", rel_path.to_string_lossy().replace('\\', "/").trim_start_matches('/'));
    !UNPUBLISHED_PATHS.iter().any(|p| rel.contains(p))
}

/// `"getting_started-guide"` → `"Getting Started Guide"`.
#[must_use]
pub fn title_case(s: &str) -> String {
    s.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
pub struct MetadataExtractor {
    h1: Regex,
    h2_h3: Regex,
    word: Regex,
    md_link: Regex,
    emphasis: Regex,
    html_tag: Regex,
    default_author: String,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new("Documentation")
    }
}

impl MetadataExtractor {
    #[must_use]
    pub fn new(default_author: &str) -> Self {
        Self {
            h1: Regex::new(r"(?m)^#\s+(.+)$").expect("valid h1 regex"),
            h2_h3: Regex::new(r"(?m)^#{2,3}\s+(.+)$").expect("valid heading regex"),
            word: Regex::new(r"\b\w+\b").expect("valid word regex"),
            md_link: Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link regex"),
            emphasis: Regex::new(r"[*_`]").expect("valid emphasis regex"),
            html_tag: Regex::new(r"<[^>]+>").expect("valid tag regex"),
            default_author: default_author.to_string(),
        }
    }

    /// Metadata for `content` plus the body with frontmatter removed.
    #[must_use]
    pub fn extract(&self, content: &str, path: &Path) -> (DocMetadata, String) {
        let (yaml, body) = split_frontmatter(content);
        let fm = parse_frontmatter(yaml.unwrap_or(""));

        let title = fm
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.h1.captures(body).map(|c| c[1].trim().to_string()))
            .unwrap_or_else(|| {
                title_case(path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default().as_ref())
            });

        let description = fm
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.describe(body));

        let mut keywords = fm.keywords.map(Keywords::into_vec).unwrap_or_default();
        if keywords.is_empty() {
            keywords = self.keywords_from(body, &title);
        }

        let date_modified = fm.date.map_or_else(|| chrono::Utc::now().to_rfc3339(), |v| yaml_to_string(&v));

        let meta = DocMetadata {
            title,
            description,
            keywords,
            author: fm.author.unwrap_or_else(|| self.default_author.clone()),
            date_modified,
        };
        (meta, body.to_string())
    }

    /// First prose lines of the body, stripped of markdown and HTML.
    fn describe(&self, body: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut in_html = false;
        for raw in body.lines() {
            let line = raw.trim();
            if line.is_empty() {
                in_html = false;
                continue;
            }
            if line.starts_with('<') {
                // a closing tag ends the block, anything else opens one
                in_html = !line.starts_with("</");
                continue;
            }
            if in_html {
                continue;
            }
            let skip = ["#", "```", "![", "[![", ">", "---"].iter().any(|p| line.starts_with(p))
                || line.contains("shield.io")
                || line.to_lowercase().contains("badge");
            if skip {
                continue;
            }
            parts.push(line);
            if parts.join(" ").chars().count() > DESCRIPTION_TARGET {
                break;
            }
        }
        let joined: String = parts.join(" ").chars().take(MAX_DESCRIPTION).collect();
        let text = self.md_link.replace_all(&joined, "$1");
        let text = self.emphasis.replace_all(&text, "");
        self.html_tag.replace_all(&text, "").into_owned()
    }

    fn long_words(&self, text: &str) -> Vec<String> {
        self.word
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|w| w.chars().count() > 3)
            .collect()
    }

    fn keywords_from(&self, body: &str, title: &str) -> Vec<String> {
        let mut set: BTreeSet<String> = self.long_words(title).into_iter().take(5).collect();
        for cap in self.h2_h3.captures_iter(body).take(5) {
            set.extend(self.long_words(&cap[1]).into_iter().take(2));
        }
        set.insert("documentation".to_string());
        set.into_iter().take(MAX_KEYWORDS).collect()
    }
}

fn yaml_to_string(v: &serde_yaml::Value) -> String {
    match v {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other).map(|s| s.trim().to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frontmatter() {
        let (fm, body) = split_frontmatter("---\ntitle: X\n---\n# Body\n");
        assert_eq!(fm, Some("title: X\n"));
        assert_eq!(body, "# Body\n");
        assert_eq!(split_frontmatter("# No fm\n"), (None, "# No fm\n"));
        // unterminated block is not frontmatter
        assert_eq!(split_frontmatter("---\ntitle: X\n").0, None);
    }

    #[test]
    fn test_should_publish_rules() {
        let p = Path::new("guide/intro.md");
        assert!(should_publish("# Hi\n", p));
        assert!(!should_publish("---\npublish: false\n---\n# Hi\n", p));
        assert!(!should_publish("---\npublished: false\n---\n# Hi\n", p));
        assert!(!should_publish("# Hi\n__DO_NOT_PUBLISH__\n", p));
        assert!(!should_publish("# Hi\n", Path::new("doc/archive/old.md")));
        assert!(!should_publish("# Hi\n", Path::new("guide/draft/wip.md")));
        assert!(!should_publish("# Hi\n", Path::new("draft/wip.md")));
        assert!(should_publish("# Hi\n", Path::new("drafts/wip.md")));
    }

    #[test]
    fn test_title_fallbacks() {
        let ex = MetadataExtractor::default();
        let (m, _) = ex.extract("---\ntitle: From FM\n---\n# Heading\n", Path::new("x.md"));
        assert_eq!(m.title, "From FM");
        let (m, _) = ex.extract("intro\n# Heading One\n", Path::new("x.md"));
        assert_eq!(m.title, "Heading One");
        let (m, _) = ex.extract("no headings here\n", Path::new("getting_started-guide.md"));
        assert_eq!(m.title, "Getting Started Guide");
    }

    #[test]
    fn test_description_skips_noise_and_strips_markup() {
        let ex = MetadataExtractor::default();
        let body = "# Title\n\n[![badge](x.svg)](y)\n<div align=\"center\">\n<img src=\"a.png\">\n</div>\n\nThis is **the** [first](a.md) paragraph of `text`.\n";
        let (m, _) = ex.extract(body, Path::new("x.md"));
        assert_eq!(m.description, "This is the first paragraph of text.");
    }

    #[test]
    fn test_keywords_from_frontmatter_and_fallback() {
        let ex = MetadataExtractor::default();
        let (m, _) = ex.extract("---\nkeywords: rust, graphs ,docs\n---\n", Path::new("x.md"));
        assert_eq!(m.keywords, vec!["rust", "graphs", "docs"]);
        let (m, _) = ex.extract("---\nkeywords: [a, b]\n---\n", Path::new("x.md"));
        assert_eq!(m.keywords, vec!["a", "b"]);

        let (m, _) = ex.extract("# Link Graphs\n## Installation Steps\n### Usage\n", Path::new("x.md"));
        assert!(m.keywords.contains(&"link".to_string()));
        assert!(m.keywords.contains(&"graphs".to_string()));
        assert!(m.keywords.contains(&"installation".to_string()));
        assert!(m.keywords.contains(&"usage".to_string()));
        assert!(m.keywords.contains(&"documentation".to_string()));
    }

    #[test]
    fn test_author_and_date_from_frontmatter() {
        let ex = MetadataExtractor::new("Team");
        let (m, body) = ex.extract("---\nauthor: Sam\ndate: 2024-05-01\n---\nText\n", Path::new("x.md"));
        assert_eq!(m.author, "Sam");
        assert_eq!(m.date_modified, "2024-05-01");
        assert_eq!(body, "Text\n");
        let (m, _) = ex.extract("Text\n", Path::new("x.md"));
        assert_eq!(m.author, "Team");
    }
}
