pub mod exclude;
pub mod file_walker;

pub mod table {
    fn sep(widths: &[usize]) -> String {
        let mut s = String::from("+");
        for w in widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    }

    fn line(cells: &[String], widths: &[usize]) -> String {
        let mut s = String::from("|");
        for (cell, w) in cells.iter().zip(widths) {
            s.push(' ');
            s.push_str(cell);
            let len = cell.chars().count();
            if len < *w {
                s.push_str(&" ".repeat(w - len));
            }
            s.push_str(" |");
        }
        s
    }

    /// Render a simple ASCII table given headers and rows.
    #[must_use]
    pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let cols = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (c, w) in widths.iter_mut().enumerate().take(cols) {
                *w = (*w).max(row.get(c).map_or(0, |s| s.chars().count()));
            }
        }

        let mut out = String::new();
        out.push_str(&sep(&widths));
        out.push('\n');
        let header_cells: Vec<String> = headers.iter().map(|s| (*s).to_string()).collect();
        out.push_str(&line(&header_cells, &widths));
        out.push('\n');
        out.push_str(&sep(&widths));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = (0..cols).map(|i| row.get(i).cloned().unwrap_or_default()).collect();
            out.push_str(&line(&cells, &widths));
            out.push('\n');
        }
        out.push_str(&sep(&widths));
        out
    }
}

pub mod config {
    use crate::errors::LinkGraphError;
    use crate::utils::exclude::NegationMode;
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_NAME: &str = "md-link-graph.toml";

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct DiscoveryConfig {
        pub respect_gitignore: Option<bool>,
        pub default_excludes: Option<bool>,
        #[serde(default)]
        pub extra_excludes: Vec<String>,
        pub gitignore_negation: Option<NegationMode>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct GraphConfig {
        pub include_external: Option<bool>,
        pub hide_isolated: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct DotConfig {
        pub rankdir: Option<String>, // "LR" | "TB"
        pub theme: Option<String>,   // "light" | "dark"
        /// Graphviz executable used for rasterizing.
        pub program: Option<String>,
        pub format: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct SiteConfig {
        pub base_url: Option<String>,
        pub author: Option<String>,
        pub template: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct Config {
        pub discovery: Option<DiscoveryConfig>,
        pub graph: Option<GraphConfig>,
        pub dot: Option<DotConfig>,
        pub site: Option<SiteConfig>,
    }

    /// Load and parse a configuration file.
    ///
    /// # Errors
    /// Returns `LinkGraphError::Io` if the file cannot be read and
    /// `LinkGraphError::Config` if it is not valid TOML for this schema.
    pub fn load_config_at(path: &Path) -> Result<Config, LinkGraphError> {
        let data = fs::read_to_string(path)?;
        toml::from_str::<Config>(&data)
            .map_err(|e| LinkGraphError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `md-link-graph.toml` from `root` if present.
    ///
    /// # Errors
    /// Same as [`load_config_at`] when the file exists.
    pub fn load_config_near(root: &Path) -> Result<Option<Config>, LinkGraphError> {
        let p = root.join(DEFAULT_CONFIG_NAME);
        if p.is_file() {
            load_config_at(&p).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Explicit path wins; otherwise look next to the scanned directory.
    ///
    /// # Errors
    /// Propagates load errors.
    pub fn resolve(explicit: Option<&Path>, root: &Path) -> Result<Config, LinkGraphError> {
        match explicit {
            Some(p) => load_config_at(p),
            None => Ok(load_config_near(root)?.unwrap_or_default()),
        }
    }
}

pub mod logging {
    use tracing_subscriber::EnvFilter;

    pub const LOG_ENV: &str = "MD_LINK_GRAPH_LOG";

    /// Level implied by the global `-q` / `-v` flags.
    #[must_use]
    pub fn level_for(quiet: bool, verbose: u8) -> &'static str {
        if quiet {
            return "error";
        }
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Install the stderr subscriber. `MD_LINK_GRAPH_LOG` overrides the flags.
    /// Calling this twice is harmless.
    pub fn init(quiet: bool, verbose: u8) {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(level_for(quiet, verbose)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_pads_columns() {
        let out = table::render(&["Metric", "Count"], &[vec!["files".into(), "12".into()]]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "| Metric | Count |");
        assert_eq!(lines[3], "| files  | 12    |");
    }

    #[test]
    fn test_level_for_flags() {
        assert_eq!(logging::level_for(true, 3), "error");
        assert_eq!(logging::level_for(false, 0), "warn");
        assert_eq!(logging::level_for(false, 2), "debug");
    }
}
