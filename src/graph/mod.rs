//! Link graph model and builder.
//!
//! `LinkGraph` accumulates file nodes, external URL nodes and link edges.
//! Internal link targets are mapped to file identities by a
//! [`LinkResolver`] handed in at construction. Targets are registered even
//! when no such file exists; existence is only checked when rendering.
//!
//! Use [`LinkGraph::build_from_directory`] for the full discover → extract →
//! add pipeline, or feed [`Link`]s yourself with [`LinkGraph::add_links`].
use crate::errors::LinkGraphError;
use crate::parser::{Link, MarkdownParser};
use crate::utils::exclude::{DiscoveryOptions, PathExcluder};
use crate::utils::file_walker;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub mod resolver;

pub use resolver::{normalize_path, LinkResolver, PathResolver};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Keep external links as URL nodes. When off they are dropped entirely.
    pub include_external: bool,
    /// Only render file nodes that take part in an internal edge.
    pub hide_isolated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Node {
    File(PathBuf),
    External(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PathBuf,
    pub target: Node,
    pub label: String,
}

impl Edge {
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self.target, Node::External(_))
    }
}

/// Counts gathered while building from a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub markdown_files: usize,
    pub internal_links: usize,
    pub external_links: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub file_nodes: usize,
    pub missing_files: usize,
    pub external_nodes: usize,
    pub internal_edges: usize,
    pub external_edges: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub exists: bool,
    pub connected: bool,
}

/// Serializable view of a graph, as written by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub base_dir: PathBuf,
    pub files: Vec<FileEntry>,
    pub external: Vec<String>,
    pub edges: Vec<Edge>,
}

pub struct LinkGraph {
    base_dir: PathBuf,
    options: GraphOptions,
    files: HashSet<PathBuf>,
    external: HashSet<String>,
    edges: Vec<Edge>,
    resolver: Box<dyn LinkResolver>,
}

impl std::fmt::Debug for LinkGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkGraph")
            .field("base_dir", &self.base_dir)
            .field("options", &self.options)
            .field("files", &self.files.len())
            .field("external", &self.external.len())
            .field("edges", &self.edges.len())
            .finish_non_exhaustive()
    }
}

impl LinkGraph {
    /// Empty graph resolving links with [`PathResolver`].
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, options: GraphOptions) -> Self {
        Self::with_resolver(base_dir, options, PathResolver)
    }

    #[must_use]
    pub fn with_resolver(
        base_dir: impl Into<PathBuf>,
        options: GraphOptions,
        resolver: impl LinkResolver + 'static,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            options,
            files: HashSet::new(),
            external: HashSet::new(),
            edges: Vec::new(),
            resolver: Box::new(resolver),
        }
    }

    /// Discover markdown under `root`, extract links and build the graph.
    ///
    /// `root` is canonicalized first so that node identities are absolute.
    ///
    /// # Errors
    /// Returns `LinkGraphError::Io` if `root` cannot be canonicalized.
    /// Unreadable directories and files are logged and skipped.
    pub fn build_from_directory(
        root: &Path,
        discovery: &DiscoveryOptions,
        options: GraphOptions,
    ) -> Result<(Self, ScanSummary), LinkGraphError> {
        let root = std::fs::canonicalize(root)?;
        let excluder = PathExcluder::new(discovery);
        let files = file_walker::find_markdown_files(&root, &excluder);
        let parsed = MarkdownParser::new().parse_files(&files);
        let links: Vec<Link> = parsed.iter().flat_map(|(_, l)| l.iter().cloned()).collect();
        let external_links = links.iter().filter(|l| l.is_external).count();
        let summary = ScanSummary {
            markdown_files: files.len(),
            internal_links: links.len() - external_links,
            external_links,
        };
        let mut graph = Self::new(root, options);
        // undecodable files never become nodes
        for (f, _) in &parsed {
            graph.add_file(f);
        }
        graph.add_links(&links);
        Ok((graph, summary))
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn options(&self) -> GraphOptions {
        self.options
    }

    /// Register a discovered file, so that files without any links still
    /// show up (and count as isolated).
    pub fn add_file(&mut self, path: &Path) {
        self.files.insert(path.to_path_buf());
    }

    /// Register one link. The source file always becomes a node.
    pub fn add_link(&mut self, link: &Link) {
        self.files.insert(link.source_file.clone());

        if link.is_external {
            if !self.options.include_external {
                return;
            }
            self.external.insert(link.target.clone());
            self.edges.push(Edge {
                source: link.source_file.clone(),
                target: Node::External(link.target.clone()),
                label: link.label(),
            });
            return;
        }

        let target = self.resolver.resolve(&link.source_file, &link.target, &self.base_dir);
        self.files.insert(target.clone());
        self.edges.push(Edge {
            source: link.source_file.clone(),
            target: Node::File(target),
            label: link.label(),
        });
    }

    pub fn add_links<'a>(&mut self, links: impl IntoIterator<Item = &'a Link>) {
        for link in links {
            self.add_link(link);
        }
    }

    #[must_use]
    pub fn contains(&self, node: &Node) -> bool {
        match node {
            Node::File(p) => self.files.contains(p),
            Node::External(u) => self.external.contains(u),
        }
    }

    #[must_use]
    pub fn file_nodes(&self) -> &HashSet<PathBuf> {
        &self.files
    }

    #[must_use]
    pub fn external_nodes(&self) -> &HashSet<String> {
        &self.external
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// File nodes that are the source or target of an internal edge.
    #[must_use]
    pub fn connected_nodes(&self) -> HashSet<&Path> {
        let mut connected = HashSet::new();
        for edge in &self.edges {
            if let Node::File(target) = &edge.target {
                connected.insert(edge.source.as_path());
                connected.insert(target.as_path());
            }
        }
        connected
    }

    /// File nodes to render, sorted by their string form.
    #[must_use]
    pub fn visible_files(&self) -> Vec<&Path> {
        let mut out: Vec<&Path> = if self.options.hide_isolated {
            self.connected_nodes().into_iter().collect()
        } else {
            self.files.iter().map(PathBuf::as_path).collect()
        };
        out.sort_by_cached_key(|p| p.to_string_lossy().into_owned());
        out
    }

    /// External nodes to render, sorted. When hiding isolated nodes, only
    /// URLs reached from a visible file are kept.
    #[must_use]
    pub fn visible_external(&self) -> Vec<&str> {
        if !self.options.include_external {
            return Vec::new();
        }
        let mut out: Vec<&str> = if self.options.hide_isolated {
            let referenced: HashSet<&str> = self
                .visible_edges()
                .into_iter()
                .filter_map(|e| match &e.target {
                    Node::External(url) => Some(url.as_str()),
                    Node::File(_) => None,
                })
                .collect();
            referenced.into_iter().collect()
        } else {
            self.external.iter().map(String::as_str).collect()
        };
        out.sort_unstable();
        out
    }

    /// Edges to render, in insertion order. Internal edges whose target is
    /// hidden are left out, as are external edges whose source is hidden.
    #[must_use]
    pub fn visible_edges(&self) -> Vec<&Edge> {
        let visible: Option<HashSet<&Path>> =
            self.options.hide_isolated.then(|| self.connected_nodes());
        self.edges
            .iter()
            .filter(|e| match (&e.target, &visible) {
                (Node::External(_), None) => self.options.include_external,
                (Node::External(_), Some(set)) => {
                    self.options.include_external && set.contains(e.source.as_path())
                }
                (Node::File(_), None) => true,
                (Node::File(t), Some(set)) => set.contains(t.as_path()),
            })
            .collect()
    }

    /// `path` relative to the base directory, or as-is when outside it.
    #[must_use]
    pub fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir).unwrap_or(path).to_string_lossy().into_owned()
    }

    /// Counts over the whole model. `missing_files` checks the filesystem.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let external_edges = self.edges.iter().filter(|e| e.is_external()).count();
        GraphStats {
            file_nodes: self.files.len(),
            missing_files: self.files.iter().filter(|p| !p.exists()).count(),
            external_nodes: self.external.len(),
            internal_edges: self.edges.len() - external_edges,
            external_edges,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let connected = self.connected_nodes();
        let files = self
            .visible_files()
            .into_iter()
            .map(|p| FileEntry {
                path: p.to_path_buf(),
                exists: p.exists(),
                connected: connected.contains(p),
            })
            .collect();
        GraphSnapshot {
            base_dir: self.base_dir.clone(),
            files,
            external: self.visible_external().into_iter().map(str::to_string).collect(),
            edges: self.visible_edges().into_iter().cloned().collect(),
        }
    }

    /// Write the rendered view of the graph as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_json(&self, path: &Path) -> Result<(), LinkGraphError> {
        let data = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
