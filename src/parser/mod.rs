use crate::errors::ParseError;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// URL prefixes that make a link target external.
pub const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "ftp://", "mailto:", "//"];

/// A link found in a markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source_file: PathBuf,
    /// Target as written; internal targets have their `#fragment` removed.
    pub target: String,
    pub link_text: String,
    /// 1-based.
    pub line_number: usize,
    pub is_external: bool,
}

impl Link {
    /// Edge label used in rendered graphs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} (L{})", self.link_text, self.line_number)
    }
}

#[derive(Debug)]
pub struct LinkPatterns {
    pub inline_link: Regex,
}

impl LinkPatterns {
    #[must_use]
    pub fn compile() -> Self {
        // [text](target) on a single line; neither part may be empty
        let inline_link = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex");
        Self { inline_link }
    }
}

impl Default for LinkPatterns {
    fn default() -> Self {
        Self::compile()
    }
}

#[derive(Debug, Default)]
pub struct MarkdownParser {
    patterns: LinkPatterns,
}

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self { patterns: LinkPatterns::compile() }
    }

    /// Read `path` and extract its links.
    ///
    /// # Errors
    /// Returns `ParseError::Io` when the file cannot be read and
    /// `ParseError::InvalidUtf8` when it is not UTF-8 text.
    pub fn try_extract_links(&self, path: &Path) -> Result<Vec<Link>, ParseError> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|_| ParseError::InvalidUtf8 { file: path.to_path_buf() })?;
        Ok(self.parse_content(&content, path))
    }

    /// Like [`Self::try_extract_links`], but failures are logged and yield no links.
    #[must_use]
    pub fn extract_links(&self, path: &Path) -> Vec<Link> {
        match self.try_extract_links(path) {
            Ok(links) => {
                tracing::debug!("{}: {} link(s)", path.display(), links.len());
                links
            }
            Err(e) => {
                tracing::warn!("Could not parse {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    /// Parse every file, in file order. Files are read in parallel.
    ///
    /// Files that cannot be read or decoded are logged and left out of the
    /// result, so callers only see files that actually parsed.
    #[must_use]
    pub fn parse_files(&self, files: &[PathBuf]) -> Vec<(PathBuf, Vec<Link>)> {
        let per_file: Vec<Option<(PathBuf, Vec<Link>)>> = files
            .par_iter()
            .map(|f| match self.try_extract_links(f) {
                Ok(links) => {
                    tracing::debug!("{}: {} link(s)", f.display(), links.len());
                    Some((f.clone(), links))
                }
                Err(e) => {
                    tracing::warn!("Could not parse {}: {e}", f.display());
                    None
                }
            })
            .collect();
        per_file.into_iter().flatten().collect()
    }

    /// Extract links from every file, in file order.
    #[must_use]
    pub fn extract_all(&self, files: &[PathBuf]) -> Vec<Link> {
        self.parse_files(files).into_iter().flat_map(|(_, links)| links).collect()
    }

    /// Scan already-loaded content line by line.
    #[must_use]
    pub fn parse_content(&self, content: &str, source: &Path) -> Vec<Link> {
        let mut out = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for cap in self.patterns.inline_link.captures_iter(line) {
                let link_text = cap.get(1).map_or("", |m| m.as_str());
                let raw = cap.get(2).map_or("", |m| m.as_str());
                let is_external = is_external_link(raw);
                let target = if is_external { raw } else { strip_fragment(raw) };
                if target.is_empty() {
                    continue;
                }
                out.push(Link {
                    source_file: source.to_path_buf(),
                    target: target.to_string(),
                    link_text: link_text.to_string(),
                    line_number: idx + 1,
                    is_external,
                });
            }
        }
        out
    }
}

/// True when the target starts with a network or mailto scheme, or `//`.
#[must_use]
pub fn is_external_link(target: &str) -> bool {
    EXTERNAL_PREFIXES.iter().any(|p| target.starts_with(p))
}

fn strip_fragment(target: &str) -> &str {
    target.split_once('#').map_or(target, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Link> {
        MarkdownParser::new().parse_content(src, Path::new("/docs/a.md"))
    }

    #[test]
    fn test_internal_fragment_is_stripped() {
        let links = parse("See [guide](guide.md#install) for details.");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "guide.md");
        assert_eq!(links[0].link_text, "guide");
        assert!(!links[0].is_external);
    }

    #[test]
    fn test_external_keeps_fragment() {
        let links = parse("[docs](https://example.com/page#section)");
        assert_eq!(links[0].target, "https://example.com/page#section");
        assert!(links[0].is_external);
    }

    #[test]
    fn test_pure_anchor_links_are_dropped() {
        let links = parse("[top](#top) and [b](b.md)");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "b.md");
    }

    #[test]
    fn test_line_numbers_and_multiple_links_per_line() {
        let links = parse("intro\n[a](a.md) [b](b.md)\n\n[c](sub/c.md)\n");
        let got: Vec<(&str, usize)> = links.iter().map(|l| (l.target.as_str(), l.line_number)).collect();
        assert_eq!(got, vec![("a.md", 2), ("b.md", 2), ("sub/c.md", 4)]);
        assert_eq!(links[0].label(), "a (L2)");
    }

    #[test]
    fn test_links_do_not_span_lines() {
        assert!(parse("[split\ntext](a.md)").is_empty());
        assert!(parse("[text](a\n.md)").is_empty());
    }

    #[test]
    fn test_display_text_is_literal() {
        let links = parse("[**Bold** `code`](x.md)");
        assert_eq!(links[0].link_text, "**Bold** `code`");
    }

    #[test]
    fn test_is_external_link_prefixes() {
        for t in ["http://a", "https://a", "ftp://a", "mailto:x@y.z", "//cdn.example.com/x"] {
            assert!(is_external_link(t), "{t}");
        }
        for t in ["a.md", "./a.md", "/abs.md", "../up.md", "https:/broken", "file.md#http://"] {
            assert!(!is_external_link(t), "{t}");
        }
    }

    #[test]
    fn test_invalid_utf8_yields_no_links() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.md");
        std::fs::write(&p, [0x5b, 0x61, 0x5d, 0x28, 0xff, 0xfe, 0x29]).unwrap();
        let parser = MarkdownParser::new();
        assert!(matches!(parser.try_extract_links(&p), Err(ParseError::InvalidUtf8 { .. })));
        assert!(parser.extract_links(&p).is_empty());
    }

    #[test]
    fn test_extract_all_preserves_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "[x](x.md)\n").unwrap();
        std::fs::write(&b, "[y](y.md)\n[z](z.md)\n").unwrap();
        let links = MarkdownParser::new().extract_all(&[a.clone(), b.clone()]);
        let targets: Vec<_> = links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["x.md", "y.md", "z.md"]);
        assert_eq!(links[0].source_file, a);
        assert_eq!(links[2].source_file, b);
    }

    #[test]
    fn test_parse_files_skips_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let bad = dir.path().join("bad.md");
        std::fs::write(&good, "[x](x.md)\n").unwrap();
        std::fs::write(&bad, [0x5b, 0x61, 0x5d, 0xff, 0xfe]).unwrap();
        let missing = dir.path().join("missing.md");
        let parsed = MarkdownParser::new().parse_files(&[bad, good.clone(), missing]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, good);
        assert_eq!(parsed[0].1.len(), 1);
    }
}
