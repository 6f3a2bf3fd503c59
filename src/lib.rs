//! md-link-graph: map the links between markdown files
//!
//! Discover the markdown files of a directory tree, extract their links and
//! build a graph of which file points where. The graph renders as Graphviz
//! DOT (and, through the `dot` executable, SVG or any other format), or the
//! same tree can be published as a static HTML site.
//!
//! # Features
//! - Discovery that skips common third-party directories and honours nested `.gitignore` files
//! - Link resolution for file-relative and root-relative targets, anchors stripped
//! - Missing link targets kept as first-class nodes, drawn distinctly
//! - Optional external URL nodes and isolated-node hiding
//! - DOT/SVG output, JSON export, static site with sitemap and navigation
//!
//! # Quickstart (Library)
//! ```no_run
//! use md_link_graph::graph::{GraphOptions, LinkGraph};
//! use md_link_graph::utils::exclude::DiscoveryOptions;
//! use md_link_graph::visualization::DotGenerator;
//!
//! let root = std::path::Path::new("docs");
//! let (graph, summary) = LinkGraph::build_from_directory(root, &DiscoveryOptions::default(), GraphOptions::default())
//!     .expect("build graph");
//! println!("files: {} internal links: {}", summary.markdown_files, summary.internal_links);
//! let dot = DotGenerator::new().generate_dot(&graph);
//! std::fs::write("links.dot", dot).expect("write dot");
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! md-link-graph graph docs -o out --include-external
//! md-link-graph site docs -o site --base-url https://docs.example.com
//! ```
//!
//! # Gitignore negation
//! `!pattern` re-includes paths by default. Set `gitignore_negation = "literal"`
//! in the config file, or pass `--literal-negation`, to treat it as an
//! ordinary pattern instead.
pub mod app;
pub mod cli;
pub mod errors;
pub mod graph;
pub mod parser;
pub mod site;
pub mod utils;
pub mod visualization;
