use crate::errors::LinkGraphError;
use crate::graph::{LinkGraph, Node};
use std::fmt::Write as _;
use std::path::Path;

/// Longest external URL shown verbatim in a node label.
pub const MAX_URL_LABEL: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DotTheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankDir {
    #[default]
    LR,
    TB,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions {
    pub theme: DotTheme,
    pub rankdir: RankDir,
}

struct Palette {
    existing: &'static str,
    missing: &'static str,
    external: &'static str,
    font: &'static str,
}

fn palette(theme: DotTheme) -> Palette {
    match theme {
        DotTheme::Light => Palette {
            existing: "lightblue",
            missing: "lightcoral",
            external: "lightyellow",
            font: "black",
        },
        DotTheme::Dark => Palette {
            existing: "#1f4e79",
            missing: "#7a1f1f",
            external: "#6b6b00",
            font: "white",
        },
    }
}

#[derive(Debug, Default)]
pub struct DotGenerator;

impl DotGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    #[must_use]
    pub fn generate_dot(&self, graph: &LinkGraph) -> String {
        self.generate_dot_with_options(graph, DotOptions::default())
    }

    /// Serialize `graph` as a Graphviz digraph.
    ///
    /// File nodes are sorted by path, external nodes by URL, and edges keep
    /// insertion order, so the same graph always yields the same text.
    /// Whether a file exists is checked here, not when it was added.
    #[must_use]
    pub fn generate_dot_with_options(&self, graph: &LinkGraph, opts: DotOptions) -> String {
        let colors = palette(opts.theme);
        let rank = match opts.rankdir {
            RankDir::LR => "LR",
            RankDir::TB => "TB",
        };

        let mut s = String::new();
        s.push_str("digraph markdown_links {\n");
        let _ = writeln!(s, "    rankdir={rank};");
        let _ = writeln!(s, "    node [shape=box, style=rounded, fontcolor=\"{}\"];", colors.font);
        s.push('\n');

        for path in graph.visible_files() {
            let fill = if path.exists() { colors.existing } else { colors.missing };
            let _ = writeln!(
                s,
                "    {} [label=\"{}\", fillcolor=\"{fill}\", style=\"rounded,filled\"];",
                file_node_id(graph, path),
                escape_label(&graph.relative_display(path)),
            );
        }

        for url in graph.visible_external() {
            let _ = writeln!(
                s,
                "    {} [label=\"{}\", fillcolor=\"{}\", style=\"rounded,filled\", shape=ellipse];",
                external_node_id(url),
                escape_label(&truncate_url(url)),
                colors.external,
            );
        }

        s.push('\n');

        for edge in graph.visible_edges() {
            let target = match &edge.target {
                Node::File(p) => file_node_id(graph, p),
                Node::External(u) => external_node_id(u),
            };
            let _ = writeln!(
                s,
                "    {} -> {target} [label=\"{}\"];",
                file_node_id(graph, &edge.source),
                escape_label(&edge.label),
            );
        }

        s.push_str("}\n");
        s
    }
}

/// `node_` + sanitized path relative to the graph's base directory.
#[must_use]
pub fn file_node_id(graph: &LinkGraph, path: &Path) -> String {
    format!("node_{}", sanitize_id(&graph.relative_display(path)))
}

/// `ext_` + the first 8 hex digits of the URL's hash.
#[must_use]
pub fn external_node_id(url: &str) -> String {
    let hash = blake3::hash(url.as_bytes()).to_hex();
    format!("ext_{}", &hash.as_str()[..8])
}

/// Replace everything outside `[A-Za-z0-9_]` with `_` and collapse runs.
#[must_use]
pub fn sanitize_id(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Escape for a double-quoted DOT string. Backslashes go first so the
/// escapes added for quotes and newlines are not doubled.
#[must_use]
pub fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[must_use]
pub fn truncate_url(url: &str) -> String {
    if url.chars().count() <= MAX_URL_LABEL {
        return url.to_string();
    }
    let mut out: String = url.chars().take(MAX_URL_LABEL - 3).collect();
    out.push_str("...");
    out
}

/// Turns DOT text into an image file.
pub trait Rasterizer {
    /// Render `dot` in `format` (e.g. `"svg"`) to `output`.
    ///
    /// # Errors
    /// Returns `LinkGraphError::Rasterize` when the backend is missing or
    /// rejects the input.
    fn rasterize(&self, dot: &str, format: &str, output: &Path) -> Result<(), LinkGraphError>;
}

/// Runs the Graphviz `dot` executable.
#[derive(Debug, Clone)]
pub struct GraphvizRasterizer {
    program: String,
}

impl Default for GraphvizRasterizer {
    fn default() -> Self {
        Self { program: "dot".to_string() }
    }
}

impl GraphvizRasterizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Rasterizer for GraphvizRasterizer {
    fn rasterize(&self, dot: &str, format: &str, output: &Path) -> Result<(), LinkGraphError> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let fail = |message: String| LinkGraphError::Rasterize { format: format.to_string(), message };
        let out = Command::new(&self.program)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(|mut child| {
                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(dot.as_bytes())?;
                }
                child.wait_with_output()
            })
            .map_err(|e| fail(format!("failed to run graphviz '{}': {e}", self.program)))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(fail(format!(
                "graphviz '{}' exited with code {:?}: {}",
                self.program,
                out.status.code(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphOptions;
    use crate::parser::Link;
    use std::path::PathBuf;

    fn link(src: &Path, target: &str, external: bool) -> Link {
        Link {
            source_file: src.to_path_buf(),
            target: target.into(),
            link_text: "go".into(),
            line_number: 1,
            is_external: external,
        }
    }

    #[test]
    fn test_sanitize_id_collapses_runs() {
        assert_eq!(sanitize_id("docs/my file--v2.md"), "docs_my_file_v2_md");
        assert_eq!(sanitize_id("abc_DEF012"), "abc_DEF012");
        assert_eq!(sanitize_id("a__b"), "a_b");
        assert_eq!(sanitize_id("ünï.md"), "_n_md");
    }

    #[test]
    fn test_escape_label_order() {
        assert_eq!(escape_label(r#"a\"b"#), r#"a\\\"b"#);
        assert_eq!(escape_label("x\ny"), "x\\ny");
        assert_eq!(escape_label(r"C:\path"), r"C:\\path");
    }

    #[test]
    fn test_truncate_url() {
        let short = "https://example.com";
        assert_eq!(truncate_url(short), short);
        let long = format!("https://example.com/{}", "a".repeat(60));
        let t = truncate_url(&long);
        assert_eq!(t.chars().count(), 50);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn test_external_ids_are_stable_and_namespaced() {
        let a = external_node_id("https://example.com");
        assert_eq!(a, external_node_id("https://example.com"));
        assert_ne!(a, external_node_id("https://example.org"));
        assert!(a.starts_with("ext_"));
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn test_missing_target_gets_distinct_fill() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let a = root.join("a.md");
        std::fs::write(&a, "[missing](./c.md)").unwrap();
        let mut g = LinkGraph::new(root, GraphOptions::default());
        g.add_link(&link(&a, "./c.md", false));
        let dot = DotGenerator::new().generate_dot(&g);
        assert!(dot.contains("node_a_md [label=\"a.md\", fillcolor=\"lightblue\""));
        assert!(dot.contains("node_c_md [label=\"c.md\", fillcolor=\"lightcoral\""));
        assert!(dot.contains("node_a_md -> node_c_md [label=\"go (L1)\"];"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let opts = GraphOptions { include_external: true, hide_isolated: false };
        let mut g = LinkGraph::new("/repo", opts);
        let src = PathBuf::from("/repo/z.md");
        for t in ["b.md", "a.md", "https://x.example", "mailto:me@example.com", "c/d.md"] {
            g.add_link(&link(&src, t, t.contains(':')));
        }
        let first = DotGenerator::new().generate_dot(&g);
        let second = DotGenerator::new().generate_dot(&g);
        assert_eq!(first, second);
        let a = first.find("node_a_md [").unwrap();
        let b = first.find("node_b_md [").unwrap();
        let z = first.find("node_z_md [").unwrap();
        assert!(a < b && b < z);
    }

    #[test]
    fn test_dark_theme_and_rankdir() {
        let g = LinkGraph::new("/repo", GraphOptions::default());
        let dot = DotGenerator::new()
            .generate_dot_with_options(&g, DotOptions { theme: DotTheme::Dark, rankdir: RankDir::TB });
        assert!(dot.contains("rankdir=TB;"));
        assert!(dot.contains("fontcolor=\"white\""));
    }

    #[test]
    fn test_missing_rasterizer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let r = GraphvizRasterizer::with_program("md-link-graph-no-such-binary");
        let err = r.rasterize("digraph {}", "svg", &dir.path().join("x.svg")).unwrap_err();
        assert!(err.is_rasterize());
        assert!(err.to_string().contains("svg"));
    }
}
