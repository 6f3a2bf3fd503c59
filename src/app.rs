use crate::cli::{Cli, Commands, RankDirArg, ThemeArg};
use crate::errors::LinkGraphError;
use crate::graph::{GraphOptions, LinkGraph};
use crate::site::{SiteGenerator, SiteOptions};
use crate::utils::config::{self, Config};
use crate::utils::exclude::{DiscoveryOptions, NegationMode};
use crate::utils::table;
use crate::visualization::{DotGenerator, DotOptions, DotTheme, GraphvizRasterizer, RankDir, Rasterizer};
use clap::CommandFactory;
use clap_complete::generate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Exit code for bad input: missing directory, unreadable config.
const EXIT_USAGE: i32 = 2;

/// Flags of the `graph` command, before config values are applied.
#[derive(Debug, Clone, Default)]
pub struct GraphFlags {
    pub include_external: bool,
    pub hide_isolated: bool,
    pub no_gitignore: bool,
    pub no_default_excludes: bool,
    pub exclude: Vec<String>,
    pub literal_negation: bool,
    pub rankdir: Option<RankDirArg>,
    pub theme: Option<ThemeArg>,
    pub format: Option<String>,
}

/// Everything the `graph` command needs once flags and config are merged.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub discovery: DiscoveryOptions,
    pub graph: GraphOptions,
    pub dot: DotOptions,
    pub format: String,
    pub program: String,
}

impl GraphSettings {
    /// Flags that are switched on win, then config values, then defaults.
    #[must_use]
    pub fn merge(flags: &GraphFlags, cfg: &Config) -> Self {
        let disc = cfg.discovery.clone().unwrap_or_default();
        let gcfg = cfg.graph.clone().unwrap_or_default();
        let dcfg = cfg.dot.clone().unwrap_or_default();

        let mut extra_excludes = disc.extra_excludes;
        extra_excludes.extend(flags.exclude.iter().cloned());
        let negation = if flags.literal_negation {
            NegationMode::Literal
        } else {
            disc.gitignore_negation.unwrap_or_default()
        };
        let discovery = DiscoveryOptions {
            respect_gitignore: !flags.no_gitignore && disc.respect_gitignore.unwrap_or(true),
            use_default_excludes: !flags.no_default_excludes && disc.default_excludes.unwrap_or(true),
            extra_excludes,
            negation,
        };

        let graph = GraphOptions {
            include_external: flags.include_external || gcfg.include_external.unwrap_or(false),
            hide_isolated: flags.hide_isolated || gcfg.hide_isolated.unwrap_or(false),
        };

        let rankdir = match flags.rankdir {
            Some(RankDirArg::TB) => RankDir::TB,
            Some(RankDirArg::LR) => RankDir::LR,
            None if dcfg.rankdir.as_deref() == Some("TB") => RankDir::TB,
            None => RankDir::LR,
        };
        let theme = match flags.theme {
            Some(ThemeArg::Dark) => DotTheme::Dark,
            Some(ThemeArg::Light) => DotTheme::Light,
            None if dcfg.theme.as_deref() == Some("dark") => DotTheme::Dark,
            None => DotTheme::Light,
        };

        Self {
            discovery,
            graph,
            dot: DotOptions { theme, rankdir },
            format: flags.format.clone().or(dcfg.format).unwrap_or_else(|| "svg".to_string()),
            program: dcfg.program.unwrap_or_else(|| GraphvizRasterizer::new().program().to_string()),
        }
    }
}

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success).
#[must_use]
pub fn run_cli(cli: Cli) -> i32 {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = env!("CARGO_PKG_NAME");
            let mut out = io::stdout();
            generate(shell, &mut cmd, bin_name, &mut out);
            0
        }
        Commands::Graph {
            directory,
            output,
            name,
            include_external,
            hide_isolated,
            no_gitignore,
            no_default_excludes,
            exclude,
            literal_negation,
            config,
            json,
            rankdir,
            theme,
            format,
        } => {
            let flags = GraphFlags {
                include_external,
                hide_isolated,
                no_gitignore,
                no_default_excludes,
                exclude,
                literal_negation,
                rankdir,
                theme,
                format,
            };
            let Some(cfg) = load_config(&directory, config.as_deref()) else {
                return EXIT_USAGE;
            };
            let settings = GraphSettings::merge(&flags, &cfg);
            let rasterizer = GraphvizRasterizer::with_program(settings.program.clone());
            run_graph(&directory, &output, &name, json.as_deref(), &settings, &rasterizer, quiet)
        }
        Commands::Site { directory, output, base_url, template, config, author } => {
            let Some(cfg) = load_config(&directory, config.as_deref()) else {
                return EXIT_USAGE;
            };
            let site_cfg = cfg.site.clone().unwrap_or_default();
            let Some(base_url) = base_url.or(site_cfg.base_url) else {
                eprintln!("A base URL is required: pass --base-url or set [site] base_url in the config file.");
                return EXIT_USAGE;
            };
            let mut opts = SiteOptions::new(directory, output, &base_url);
            opts.template = template.or(site_cfg.template);
            if let Some(a) = author.or(site_cfg.author) {
                opts.author = a;
            }
            // flags for discovery live on `graph`; the site honours the config file
            opts.discovery = GraphSettings::merge(&GraphFlags::default(), &cfg).discovery;
            run_site(opts, quiet)
        }
    }
}

fn load_config(directory: &Path, explicit: Option<&Path>) -> Option<Config> {
    if !directory.is_dir() {
        eprintln!("Directory not found: {}", directory.display());
        return None;
    }
    match config::resolve(explicit, directory) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            None
        }
    }
}

/// Build the graph of `directory`, write `<name>.dot` and rasterize it.
///
/// The DOT file is always written before rasterizing; a rasterizer failure
/// leaves it in place and returns 1.
#[must_use]
pub fn run_graph(
    directory: &Path,
    output: &Path,
    name: &str,
    json: Option<&Path>,
    settings: &GraphSettings,
    rasterizer: &dyn Rasterizer,
    quiet: bool,
) -> i32 {
    if !directory.is_dir() {
        eprintln!("Directory not found: {}", directory.display());
        return EXIT_USAGE;
    }
    if !quiet {
        println!("Scanning directory: {}", directory.display());
    }
    let (graph, summary) = match LinkGraph::build_from_directory(directory, &settings.discovery, settings.graph) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Build failed: {e}");
            return 1;
        }
    };
    if summary.markdown_files == 0 {
        if !quiet {
            println!("No markdown files found in {}", directory.display());
        }
        return 0;
    }

    let dot_path = output.join(format!("{name}.dot"));
    let image_path = output.join(format!("{name}.{}", settings.format));
    let dot = DotGenerator::new().generate_dot_with_options(&graph, settings.dot);
    if let Err(e) = write_outputs(&graph, &dot, output, &dot_path, json) {
        eprintln!("Failed to write output: {e}");
        return 1;
    }
    tracing::info!("Wrote {}", dot_path.display());

    if let Err(e) = rasterizer.rasterize(&dot, &settings.format, &image_path) {
        eprintln!("{e}");
        if e.is_rasterize() {
            eprintln!("The DOT file was kept at {}", dot_path.display());
            eprintln!("Make sure Graphviz is installed on your system:");
            eprintln!("  Ubuntu/Debian: sudo apt-get install graphviz");
            eprintln!("  macOS: brew install graphviz");
        }
        return 1;
    }

    if !quiet {
        let mut rows = vec![
            vec!["Markdown files".to_string(), summary.markdown_files.to_string()],
            vec!["Internal links".to_string(), summary.internal_links.to_string()],
            vec!["External links".to_string(), summary.external_links.to_string()],
            vec!["DOT file".to_string(), dot_path.display().to_string()],
            vec![format!("{} file", settings.format.to_uppercase()), image_path.display().to_string()],
        ];
        if let Some(p) = json {
            rows.push(vec!["JSON file".to_string(), p.display().to_string()]);
        }
        println!("{}", table::render(&["Item", "Value"], &rows));
    }
    0
}

fn write_outputs(
    graph: &LinkGraph,
    dot: &str,
    output: &Path,
    dot_path: &Path,
    json: Option<&Path>,
) -> Result<(), LinkGraphError> {
    fs::create_dir_all(output)?;
    fs::write(dot_path, dot)?;
    if let Some(p) = json {
        graph.save_json(p)?;
    }
    Ok(())
}

fn run_site(opts: SiteOptions, quiet: bool) -> i32 {
    let output: PathBuf = opts.output_dir.clone();
    let mut generator = SiteGenerator::new(opts);
    let stats = match generator.generate_all() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Site generation failed: {e}");
            return 1;
        }
    };
    if !quiet {
        let rows = vec![
            vec!["Pages generated".to_string(), format!("{}/{}", stats.pages_generated, stats.pages_total)],
            vec!["Pages skipped".to_string(), stats.pages_skipped.to_string()],
            vec!["Sitemap URLs".to_string(), stats.urls_in_sitemap.to_string()],
            vec!["Images copied".to_string(), stats.images_copied.to_string()],
            vec!["Output".to_string(), output.display().to_string()],
        ];
        println!("{}", table::render(&["Item", "Value"], &rows));
    }
    0
}
