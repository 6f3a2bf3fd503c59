//! Path exclusion for markdown discovery.
//!
//! A path is skipped when one of its components (relative to the scan root)
//! is in the exclude set, or when a `.gitignore` between the path and the
//! scan root matches it. Gitignore files are parsed lazily and kept in a
//! [`GitignoreCache`] owned by a single traversal.
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

/// Third-party and build directories skipped unless defaults are disabled.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "bower_components",
    ".git",
    ".svn",
    ".hg",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".nox",
    "venv",
    "env",
    "ENV",
    ".venv",
    "virtualenv",
    "target",
    "build",
    "dist",
    ".next",
    ".nuxt",
    ".cache",
    "pkg",
    "Pods",
    "Carthage",
];

/// How `!pattern` lines in `.gitignore` are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegationMode {
    /// A matching negated rule re-includes the path, as git does.
    #[default]
    Unignore,
    /// Legacy behaviour: `!pattern` is an ordinary glob, so it only matches
    /// names that literally start with `!`.
    Literal,
}

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub respect_gitignore: bool,
    pub use_default_excludes: bool,
    pub extra_excludes: Vec<String>,
    pub negation: NegationMode,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            use_default_excludes: true,
            extra_excludes: Vec::new(),
            negation: NegationMode::Unignore,
        }
    }
}

/// One usable line of a `.gitignore` file.
#[derive(Debug, Clone)]
pub struct GitignoreRule {
    pub pattern: String,
    pub negated: bool,
    pub dir_only: bool,
    pub anchored: bool,
    matcher: GlobMatcher,
    nested: Option<GlobMatcher>,
}

impl GitignoreRule {
    /// Parse a single trimmed, non-comment line. Returns `None` for lines
    /// that do not compile to a glob.
    #[must_use]
    pub fn parse(line: &str, negation: NegationMode) -> Option<Self> {
        let mut pat = line;
        let mut negated = false;
        if negation == NegationMode::Unignore {
            if let Some(rest) = pat.strip_prefix('!') {
                negated = true;
                pat = rest;
            }
        }
        let dir_only = pat.ends_with('/');
        let pat = pat.trim_end_matches('/');
        let anchored = pat.starts_with('/');
        let pat = pat.trim_start_matches('/');
        if pat.is_empty() {
            return None;
        }

        let matcher = match compile_glob(pat) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Ignoring invalid .gitignore pattern {line:?}: {e}");
                return None;
            }
        };
        let nested = if anchored || pat.starts_with("**/") {
            None
        } else {
            compile_glob(&format!("**/{pat}")).ok()
        };
        Some(Self { pattern: pat.to_string(), negated, dir_only, anchored, matcher, nested })
    }

    /// Whether this rule matches `rel` (a path relative to the directory
    /// holding the `.gitignore`). `is_dir` tells whether the last component
    /// of `rel` is itself a directory.
    #[must_use]
    pub fn matches(&self, rel: &[String], is_dir: bool) -> bool {
        if self.dir_only {
            let dir_count = if is_dir { rel.len() } else { rel.len().saturating_sub(1) };
            let dirs = &rel[..dir_count];
            // Unanchored patterns may match any single directory name.
            if !self.anchored && !self.pattern.contains('/') {
                return dirs.iter().any(|part| self.matcher.is_match(part.as_str()));
            }
            return (1..=dirs.len()).any(|n| self.matcher.is_match(dirs[..n].join("/")));
        }
        let joined = rel.join("/");
        self.matcher.is_match(&joined)
            || self.nested.as_ref().is_some_and(|m| m.is_match(&joined))
    }
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    // Shell-glob semantics: `*` also crosses `/`.
    GlobBuilder::new(pattern).literal_separator(false).build().map(|g| g.compile_matcher())
}

/// Parse `.gitignore` text into rules, skipping blanks and comments.
#[must_use]
pub fn parse_gitignore(content: &str, negation: NegationMode) -> Vec<GitignoreRule> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| GitignoreRule::parse(l, negation))
        .collect()
}

/// Parsed `.gitignore` rules keyed by directory, valid for one traversal.
#[derive(Debug, Default)]
pub struct GitignoreCache {
    entries: HashMap<PathBuf, Vec<GitignoreRule>>,
}

impl GitignoreCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directories whose `.gitignore` has been looked up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rules_for(&mut self, dir: &Path, negation: NegationMode) -> &[GitignoreRule] {
        self.entries.entry(dir.to_path_buf()).or_insert_with(|| load_gitignore(dir, negation))
    }
}

fn load_gitignore(dir: &Path, negation: NegationMode) -> Vec<GitignoreRule> {
    let file = dir.join(".gitignore");
    if !file.is_file() {
        return Vec::new();
    }
    match std::fs::read_to_string(&file) {
        Ok(content) => parse_gitignore(&content, negation),
        Err(e) => {
            tracing::warn!("Could not read .gitignore at {}: {e}", file.display());
            Vec::new()
        }
    }
}

/// Decides whether a filesystem entry is skipped during discovery.
#[derive(Debug, Clone)]
pub struct PathExcluder {
    exclude_dirs: BTreeSet<String>,
    respect_gitignore: bool,
    negation: NegationMode,
}

impl Default for PathExcluder {
    fn default() -> Self {
        Self::new(&DiscoveryOptions::default())
    }
}

impl PathExcluder {
    #[must_use]
    pub fn new(opts: &DiscoveryOptions) -> Self {
        let mut exclude_dirs: BTreeSet<String> = BTreeSet::new();
        if opts.use_default_excludes {
            exclude_dirs.extend(DEFAULT_EXCLUDE_DIRS.iter().map(|s| (*s).to_string()));
        }
        exclude_dirs.extend(opts.extra_excludes.iter().cloned());
        Self { exclude_dirs, respect_gitignore: opts.respect_gitignore, negation: opts.negation }
    }

    #[must_use]
    pub fn exclude_dirs(&self) -> &BTreeSet<String> {
        &self.exclude_dirs
    }

    #[must_use]
    pub fn respects_gitignore(&self) -> bool {
        self.respect_gitignore
    }

    /// Whether `path` should be skipped when scanning `base_dir`.
    ///
    /// Paths outside `base_dir` are never excluded.
    pub fn should_exclude(&self, path: &Path, base_dir: &Path, cache: &mut GitignoreCache) -> bool {
        let Ok(rel) = path.strip_prefix(base_dir) else {
            return false;
        };
        let parts = normal_parts(rel);
        if parts.iter().any(|p| self.exclude_dirs.contains(p)) {
            tracing::debug!("Excluded by name: {}", path.display());
            return true;
        }
        if !self.respect_gitignore || parts.is_empty() {
            return false;
        }

        let is_dir = path.is_dir();
        // Walk from the containing directory up to base_dir; the nearest
        // .gitignore that has an opinion decides.
        let mut current = path.parent();
        while let Some(dir) = current {
            if !dir.starts_with(base_dir) {
                break;
            }
            let Ok(check) = path.strip_prefix(dir) else { break };
            let check = normal_parts(check);
            let mut decision: Option<bool> = None;
            for rule in cache.rules_for(dir, self.negation) {
                if rule.matches(&check, is_dir) {
                    decision = Some(!rule.negated);
                }
            }
            if let Some(excluded) = decision {
                if excluded {
                    tracing::debug!("Excluded by {}/.gitignore: {}", dir.display(), path.display());
                }
                return excluded;
            }
            if dir == base_dir {
                break;
            }
            current = dir.parent();
        }
        false
    }
}

fn normal_parts(p: &Path) -> Vec<String> {
    p.components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(os.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
