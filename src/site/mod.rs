//! Static HTML documentation site.
//!
//! One page per published markdown file, mirroring the source layout, plus
//! `sitemap.xml`, `robots.txt` and a `docs.json` navigation index. Markdown
//! rendering goes through a [`MarkdownRenderer`]; the page shell is a
//! [`PageTemplate`].
use crate::errors::LinkGraphError;
use crate::utils::exclude::{DiscoveryOptions, PathExcluder};
use crate::utils::file_walker;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;
pub mod render;
pub mod template;

pub use metadata::{should_publish, DocMetadata, MetadataExtractor};
pub use render::{ComrakRenderer, MarkdownRenderer, UrlKind};
pub use template::{PageContext, PageTemplate};

const ASSETS_DIR: &str = "assets";
const EXTERNAL_IMAGE_PREFIXES: &[&str] = &["http://", "https://", "data:", "//"];

#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub base_url: String,
    /// Custom page template. The built-in one is used when unset or missing.
    pub template: Option<PathBuf>,
    pub author: String,
    pub discovery: DiscoveryOptions,
}

impl SiteOptions {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            output_dir: output_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            template: None,
            author: "Documentation".to_string(),
            discovery: DiscoveryOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SiteStats {
    pub pages_generated: usize,
    pub pages_skipped: usize,
    pub pages_total: usize,
    pub urls_in_sitemap: usize,
    pub images_copied: usize,
}

/// A generated page, kept for the sitemap and navigation.
#[derive(Debug, Clone)]
struct PageRecord {
    title: String,
    /// Output path relative to the site root, `/`-separated.
    path: String,
    url: String,
    lastmod: String,
    priority: &'static str,
    level: usize,
    parent_dir: String,
}

#[derive(Debug, Serialize)]
struct NavItem<'a> {
    title: &'a str,
    path: &'a str,
    url: &'a str,
    level: usize,
}

#[derive(Debug, Serialize)]
struct NavSection<'a> {
    title: String,
    items: Vec<NavItem<'a>>,
}

#[derive(Debug, Serialize)]
struct Navigation<'a> {
    generated: String,
    base_url: &'a str,
    sections: Vec<NavSection<'a>>,
}

/// Images copied into `<out>/assets`, keyed by canonical source path.
#[derive(Debug, Default)]
struct AssetStore {
    dir: PathBuf,
    copied: HashMap<PathBuf, String>,
    used_names: HashSet<String>,
}

impl AssetStore {
    fn new(dir: PathBuf) -> Self {
        Self { dir, ..Self::default() }
    }

    /// Copy the image `src` referenced from `source_file` and return the
    /// asset file name. `None` when the image cannot be found or copied.
    fn copy_image(&mut self, src: &str, source_file: &Path, base_dir: &Path) -> Option<String> {
        let near = source_file.parent().unwrap_or(base_dir).join(src);
        let image = fs::canonicalize(near)
            .ok()
            .filter(|p| p.is_file())
            .or_else(|| fs::canonicalize(base_dir.join(src.trim_start_matches('/'))).ok().filter(|p| p.is_file()))?;

        if let Some(name) = self.copied.get(&image) {
            return Some(name.clone());
        }

        let file_name = image.file_name()?.to_string_lossy().into_owned();
        let parent = image.parent().filter(|p| *p != base_dir).and_then(Path::file_name);
        let mut name = match parent {
            Some(dir) => format!("{}_{file_name}", dir.to_string_lossy()),
            None => file_name,
        };
        let stem = image.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let ext = image.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
        let mut counter = 1;
        while self.used_names.contains(&name) {
            name = format!("{stem}_{counter}{ext}");
            counter += 1;
        }

        if let Err(e) = fs::create_dir_all(&self.dir).and_then(|()| fs::copy(&image, self.dir.join(&name))) {
            tracing::warn!("Failed to copy image {}: {e}", image.display());
            return None;
        }
        tracing::debug!("Copied image {} -> {ASSETS_DIR}/{name}", image.display());
        self.used_names.insert(name.clone());
        self.copied.insert(image, name.clone());
        Some(name)
    }
}

pub struct SiteGenerator {
    options: SiteOptions,
    renderer: Box<dyn MarkdownRenderer>,
    extractor: MetadataExtractor,
    assets: AssetStore,
    pages: Vec<PageRecord>,
}

impl std::fmt::Debug for SiteGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteGenerator")
            .field("options", &self.options)
            .field("pages", &self.pages.len())
            .field("images", &self.assets.copied.len())
            .finish_non_exhaustive()
    }
}

impl SiteGenerator {
    #[must_use]
    pub fn new(options: SiteOptions) -> Self {
        Self::with_renderer(options, ComrakRenderer)
    }

    #[must_use]
    pub fn with_renderer(mut options: SiteOptions, renderer: impl MarkdownRenderer + 'static) -> Self {
        options.base_url = options.base_url.trim_end_matches('/').to_string();
        let extractor = MetadataExtractor::new(&options.author);
        let assets = AssetStore::new(options.output_dir.join(ASSETS_DIR));
        Self {
            options,
            renderer: Box::new(renderer),
            extractor,
            assets,
            pages: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &SiteOptions {
        &self.options
    }

    /// The configured template, or the built-in one.
    ///
    /// # Errors
    /// Returns `LinkGraphError::Io` when an existing template file cannot be read.
    pub fn load_template(&self) -> Result<PageTemplate, LinkGraphError> {
        match &self.options.template {
            Some(p) if p.is_file() => Ok(PageTemplate::new(fs::read_to_string(p)?)),
            Some(p) => {
                tracing::warn!("Template {} not found, using the built-in one", p.display());
                Ok(PageTemplate::default())
            }
            None => Ok(PageTemplate::default()),
        }
    }

    /// Render one markdown file to `<out>/<rel>.html`.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read, rendered or written.
    pub fn generate_page(
        &mut self,
        source: &Path,
        rel: &Path,
        template: &PageTemplate,
    ) -> Result<PathBuf, LinkGraphError> {
        let content = fs::read_to_string(source)?;
        let (meta, body) = self.extractor.extract(&content, source);

        let depth = rel.components().count().saturating_sub(1);
        let up = "../".repeat(depth);
        let base_dir = self.options.base_dir.clone();
        let assets = &mut self.assets;
        let mut rewrite = |kind: UrlKind, url: &str| match kind {
            UrlKind::Link => render::rewrite_markdown_href(url),
            UrlKind::Image => {
                if EXTERNAL_IMAGE_PREFIXES.iter().any(|p| url.starts_with(p)) {
                    return None;
                }
                assets
                    .copy_image(url, source, &base_dir)
                    .map(|name| format!("{up}{ASSETS_DIR}/{name}"))
            }
        };
        let html = self.renderer.render_html(&body, &mut rewrite)?;

        let html_rel = posix(&rel.with_extension("html"));
        let url = format!("{}/{html_rel}", self.options.base_url);
        let ctx = PageContext::new(&meta, &url, &self.options.base_url, html);
        let page = template.render(&ctx);

        let out = self.options.output_dir.join(&html_rel);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out, page)?;

        let parent_dir = rel.parent().map(posix).unwrap_or_default();
        self.pages.push(PageRecord {
            title: meta.title,
            path: html_rel,
            url,
            lastmod: meta.date_modified,
            priority: if source.file_name().is_some_and(|n| n == "README.md") { "0.8" } else { "0.6" },
            level: depth,
            parent_dir,
        });
        Ok(out)
    }

    /// `sitemap.xml` text for the pages generated so far, sorted by URL.
    #[must_use]
    pub fn generate_sitemap(&self) -> String {
        let mut pages: Vec<&PageRecord> = self.pages.iter().collect();
        pages.sort_by(|a, b| a.url.cmp(&b.url));
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        s.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
        for p in pages {
            let date = p.lastmod.split('T').next().unwrap_or(&p.lastmod);
            s.push_str("  <url>\n");
            let _ = writeln!(s, "    <loc>{}</loc>", template::escape_html(&p.url));
            let _ = writeln!(s, "    <lastmod>{}</lastmod>", template::escape_html(date));
            s.push_str("    <changefreq>weekly</changefreq>\n");
            let _ = writeln!(s, "    <priority>{}</priority>", p.priority);
            s.push_str("  </url>\n");
        }
        s.push_str("</urlset>\n");
        s
    }

    #[must_use]
    pub fn generate_robots_txt(&self) -> String {
        format!("User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n", self.options.base_url)
    }

    /// Navigation grouped by first directory, `Root` for top-level pages.
    ///
    /// # Errors
    /// Returns `LinkGraphError::Json` if serialization fails.
    pub fn generate_docs_json(&self) -> Result<String, LinkGraphError> {
        let mut pages: Vec<&PageRecord> = self.pages.iter().collect();
        pages.sort_by(|a, b| a.path.cmp(&b.path));

        let mut sections: Vec<NavSection<'_>> = Vec::new();
        for p in pages {
            let title = match p.parent_dir.split('/').next() {
                Some(first) if !first.is_empty() => metadata::title_case(first),
                _ => "Root".to_string(),
            };
            let item = NavItem { title: &p.title, path: &p.path, url: &p.url, level: p.level };
            match sections.iter_mut().find(|s| s.title == title) {
                Some(section) => section.items.push(item),
                None => sections.push(NavSection { title, items: vec![item] }),
            }
        }

        let nav = Navigation {
            generated: chrono::Utc::now().to_rfc3339(),
            base_url: &self.options.base_url,
            sections,
        };
        Ok(serde_json::to_string_pretty(&nav)?)
    }

    /// Build the whole site.
    ///
    /// Unpublished documents are skipped; a page that fails is logged and
    /// left out, and the run continues.
    ///
    /// # Errors
    /// Returns an error if the source directory is missing, the template
    /// cannot be read, or an index file cannot be written.
    pub fn generate_all(&mut self) -> Result<SiteStats, LinkGraphError> {
        self.options.base_dir = fs::canonicalize(&self.options.base_dir)?;
        fs::create_dir_all(&self.options.output_dir)?;
        let template = self.load_template()?;

        let excluder = PathExcluder::new(&self.options.discovery);
        let files = file_walker::find_markdown_files(&self.options.base_dir, &excluder);
        tracing::info!("Found {} markdown file(s) under {}", files.len(), self.options.base_dir.display());

        let mut stats = SiteStats { pages_total: files.len(), ..SiteStats::default() };
        for file in &files {
            let rel = file.strip_prefix(&self.options.base_dir).unwrap_or(file).to_path_buf();
            let content = match fs::read_to_string(file) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", rel.display());
                    continue;
                }
            };
            if !should_publish(&content, &rel) {
                tracing::info!("Skipped (not published): {}", rel.display());
                stats.pages_skipped += 1;
                continue;
            }
            match self.generate_page(file, &rel, &template) {
                Ok(out) => {
                    tracing::debug!("Wrote {}", out.display());
                    stats.pages_generated += 1;
                }
                Err(e) => tracing::warn!("Failed to generate {}: {e}", rel.display()),
            }
        }

        let out = &self.options.output_dir;
        fs::write(out.join("sitemap.xml"), self.generate_sitemap())?;
        fs::write(out.join("robots.txt"), self.generate_robots_txt())?;
        fs::write(out.join("docs.json"), self.generate_docs_json()?)?;

        stats.urls_in_sitemap = self.pages.len();
        stats.images_copied = self.assets.copied.len();
        Ok(stats)
    }
}

fn posix(p: &Path) -> String {
    p.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
