//! Page discovery and rendering.
//!
//! Every top-level entry of the content directory is one output page:
//!
//! - `hyoshi.md` → `dest/hyoshi.html`
//! - `index/` → `dest/index.html`, its `*.md` chapters concatenated in
//!   `NNN-name` order (see [`crate::naming`])
//!
//! The assets directory and hidden entries are skipped.
//!
//! ## Two phases
//!
//! The keyword index lists every definition in the book, so it cannot be
//! rendered until every page has been scanned. [`scan_pages`] renders all
//! pages in sorted order, registering keywords into one [`KeywordIndex`] and
//! leaving [`INDEX_PLACEHOLDER`] wherever `render-index` appears.
//! [`build_pages`] then renders the index once and substitutes it before
//! writing.
//!
//! Each call builds a fresh [`KeywordIndex`], so repeated builds in one
//! process (watch mode) produce identical anchor ids.
//!
//! ## Failures
//!
//! A page that cannot be read is logged and skipped; the rest of the book
//! still builds. Its sources are read in full before any rendering, so a
//! failed page registers no keywords.

use crate::config::Config;
use crate::highlight::Highlighter;
use crate::keyword::{KeywordIndex, render_index};
use crate::markdown::{INDEX_PLACEHOLDER, render_markdown};
use crate::naming::compare_chapters;
use crate::{debug, log};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl PageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A page and the markdown files it is made of, in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSource {
    /// Output stem: `index` for `index.md` or `index/`.
    pub name: String,
    pub files: Vec<PathBuf>,
    /// True for a directory of chapters.
    pub is_chapters: bool,
}

/// A page after the scan phase, index not yet substituted.
#[derive(Debug, Clone)]
pub struct ScannedPage {
    pub name: String,
    pub html: String,
    pub chapters: usize,
    pub has_index: bool,
}

#[derive(Debug, Clone)]
pub struct PageFailure {
    pub name: String,
    pub reason: String,
}

/// Result of the scan phase.
pub struct Scan {
    pub pages: Vec<ScannedPage>,
    pub failures: Vec<PageFailure>,
    pub index: KeywordIndex,
}

#[derive(Debug, Clone)]
pub struct PageSummary {
    pub name: String,
    pub output: PathBuf,
    pub chapters: usize,
    pub has_index: bool,
}

/// What a page build did.
#[derive(Debug, Clone, Default)]
pub struct PagesReport {
    pub written: Vec<PageSummary>,
    pub failures: Vec<PageFailure>,
    pub keywords: usize,
    pub definition_sites: usize,
}

/// List pages in the content directory, sorted by name.
pub fn discover_pages(config: &Config) -> Result<Vec<PageSource>, PageError> {
    let content = config.content_dir();
    let assets = config.assets_dir();

    let mut entries: Vec<PathBuf> = fs::read_dir(&content)
        .map_err(|e| PageError::io(&content, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !is_hidden(p) && !same_path(p, &assets))
        .collect();
    entries.sort();

    let mut pages: Vec<PageSource> = Vec::new();
    for path in entries {
        let page = if path.is_dir() {
            chapter_page(&path)?
        } else if is_markdown(&path) {
            path.file_stem().map(|stem| PageSource {
                name: stem.to_string_lossy().into_owned(),
                files: vec![path.clone()],
                is_chapters: false,
            })
        } else {
            None
        };

        let Some(page) = page else { continue };
        if pages.iter().any(|p| p.name == page.name) {
            log!("pages"; "skipping {}: another page is already named {}", path.display(), page.name);
            continue;
        }
        pages.push(page);
    }

    pages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pages)
}

/// A directory page, or `None` if it holds no markdown.
fn chapter_page(dir: &Path) -> Result<Option<PageSource>, PageError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    if files.is_empty() {
        return Ok(None);
    }
    files.sort_by(|a, b| {
        let ra = a.strip_prefix(dir).unwrap_or(a);
        let rb = b.strip_prefix(dir).unwrap_or(b);
        compare_chapters(ra, rb)
    });
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Some(PageSource {
        name,
        files,
        is_chapters: true,
    }))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Render every page in order, collecting keywords into a fresh index.
pub fn scan_pages(config: &Config, highlighter: &Highlighter) -> Result<Scan, PageError> {
    let sources = discover_pages(config)?;
    let mut index = KeywordIndex::new(config.keywords.slug_prefix.clone());
    let mut pages = Vec::new();
    let mut failures = Vec::new();

    for source in &sources {
        match scan_page(source, config, highlighter, &mut index) {
            Ok(page) => pages.push(page),
            Err(e) => {
                crate::logger::log_error("pages", &format!("skipping {}", source.name), &e);
                failures.push(PageFailure {
                    name: source.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(Scan {
        pages,
        failures,
        index,
    })
}

fn scan_page(
    source: &PageSource,
    config: &Config,
    highlighter: &Highlighter,
    index: &mut KeywordIndex,
) -> Result<ScannedPage, PageError> {
    let texts = source
        .files
        .iter()
        .map(|path| fs::read_to_string(path).map_err(|e| PageError::io(path, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut body = String::new();
    let mut title = None;
    let mut has_index = false;
    for (path, text) in source.files.iter().zip(&texts) {
        debug!("pages"; "rendering {}", path.display());
        let rendered = render_markdown(text, index, highlighter);
        title = title.or(rendered.title);
        has_index |= rendered.has_index;
        if source.is_chapters {
            body.push_str(&chapter_section(&rendered.html).into_string());
            body.push('\n');
        } else {
            body.push_str(&rendered.html);
        }
    }

    let title = title.unwrap_or_else(|| config.site.title.clone());
    let stylesheet = stylesheet_for(&source.name, config);
    let html = page_document(&title, &config.site.lang, &stylesheet, &body).into_string();

    Ok(ScannedPage {
        name: source.name.clone(),
        html,
        chapters: source.files.len(),
        has_index,
    })
}

/// Render all pages, substitute the keyword index, and write them out.
pub fn build_pages(config: &Config, highlighter: &Highlighter) -> Result<PagesReport, PageError> {
    let Scan {
        pages,
        mut failures,
        index,
    } = scan_pages(config, highlighter)?;

    let index_html = render_index(&index);
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).map_err(|e| PageError::io(&output_dir, e))?;

    let mut written = Vec::new();
    for page in pages {
        let html = if page.has_index {
            page.html.replace(INDEX_PLACEHOLDER, &index_html)
        } else {
            page.html
        };
        let output = output_dir.join(format!("{}.html", page.name));
        match fs::write(&output, html) {
            Ok(()) => written.push(PageSummary {
                name: page.name,
                output,
                chapters: page.chapters,
                has_index: page.has_index,
            }),
            Err(e) => {
                let err = PageError::io(&output, e);
                crate::logger::log_error("pages", &format!("failed to write {}", page.name), &err);
                failures.push(PageFailure {
                    name: page.name,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(PagesReport {
        written,
        failures,
        keywords: index.len(),
        definition_sites: index.site_count(),
    })
}

/// Output file name of the sheet a page links.
fn stylesheet_for(page: &str, config: &Config) -> String {
    let sheet = if page == config.pages.cover {
        &config.styles.cover
    } else {
        &config.styles.main
    };
    crate::styles::output_name(Path::new(sheet))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn page_document(title: &str, lang: &str, stylesheet: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(stylesheet);
            }
            body {
                (PreEscaped(body))
            }
        }
    }
}

fn chapter_section(html: &str) -> Markup {
    html! {
        section.chapter {
            (PreEscaped(html))
        }
    }
}
