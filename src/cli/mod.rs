use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "md-link-graph",
    version,
    about = "Map the links between markdown files",
    long_about = "Discover markdown files, extract their links and render the link graph as DOT/SVG, or publish the files as a static HTML site. Discovery skips common third-party directories and respects nested .gitignore files unless told otherwise."
)]
pub struct Cli {
    /// Only print errors
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankDirArg {
    #[value(name = "LR")]
    LR,
    #[value(name = "TB")]
    TB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the link graph of a directory and render it
    Graph {
        /// Directory containing the markdown files
        directory: PathBuf,
        /// Output directory for generated files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Base name for output files
        #[arg(short, long, default_value = "markdown_graph")]
        name: String,
        /// Include external URLs as nodes in the graph
        #[arg(long, default_value_t = false)]
        include_external: bool,
        /// Hide markdown files without internal links
        #[arg(long, default_value_t = false)]
        hide_isolated: bool,
        /// Do not respect .gitignore files
        #[arg(long, default_value_t = false)]
        no_gitignore: bool,
        /// Do not skip common directories like node_modules
        #[arg(long, default_value_t = false)]
        no_default_excludes: bool,
        /// Extra directory name to skip (repeatable)
        #[arg(long, value_name = "NAME")]
        exclude: Vec<String>,
        /// Treat `!pattern` in .gitignore as an ordinary pattern
        #[arg(long, default_value_t = false)]
        literal_negation: bool,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also export the graph as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
        /// DOT rank direction
        #[arg(long, value_enum)]
        rankdir: Option<RankDirArg>,
        /// DOT color theme
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        /// Image format passed to graphviz
        #[arg(long)]
        format: Option<String>,
    },
    /// Generate a static HTML documentation site
    Site {
        /// Directory containing the markdown files
        directory: PathBuf,
        /// Output directory for the site
        #[arg(short, long, default_value = "site")]
        output: PathBuf,
        /// Base URL the site is served from
        #[arg(long, env = "MD_LINK_GRAPH_BASE_URL")]
        base_url: Option<String>,
        /// Custom page template
        #[arg(long)]
        template: Option<PathBuf>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Default author for pages without one
        #[arg(long)]
        author: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_graph_defaults() {
        let cli = Cli::try_parse_from(["md-link-graph", "graph", "docs"]).unwrap();
        match cli.command {
            Commands::Graph { directory, output, name, include_external, rankdir, .. } => {
                assert_eq!(directory, PathBuf::from("docs"));
                assert_eq!(output, PathBuf::from("."));
                assert_eq!(name, "markdown_graph");
                assert!(!include_external);
                assert_eq!(rankdir, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["md-link-graph", "graph", "docs", "-vv", "--rankdir", "TB"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Graph { rankdir: Some(RankDirArg::TB), .. }));
        assert!(Cli::try_parse_from(["md-link-graph", "graph", "docs", "--theme", "neon"]).is_err());
    }
}
