//! CLI output formatting for all build stages.
//!
//! # Information-First Display
//!
//! Output leads with what was built (page names, keywords) and shows file
//! paths as secondary context after an arrow, relative to the project root.
//!
//! # Output Format
//!
//! ## Pages
//!
//! ```text
//! Pages
//! 001 hyoshi → dest/hyoshi.html
//! 002 index (4 chapters, keyword index) → dest/index.html
//! Failed
//!     broken: IO error on content/broken.md: stream did not contain valid UTF-8
//! Wrote 2 pages, 7 keywords, 9 definitions
//! ```
//!
//! ## Assets and styles
//!
//! ```text
//! Copied 2 assets (1.2 KB) → dest/assets
//!
//! Styles
//! style/main.css → dest/main.css (+ main.css.map)
//! style/hyoshi.css → dest/hyoshi.css
//! ```
//!
//! ## Keyword index (`check`)
//!
//! ```text
//! か
//!     001 かんすう|関数 → kwd_かんすう関数
//! し
//!     002 しょゆうけん|所有権 → kwd_しょゆうけん所有権, kwd_しょゆうけん所有権-1
//!
//! 7 keywords, 9 definitions
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure;
//! no I/O, no side effects.

use crate::assets::AssetsReport;
use crate::keyword::KeywordIndex;
use crate::keyword::collation::bucket_of_keyword;
use crate::pages::PagesReport;
use crate::styles::StylesReport;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display `path` relative to `root` when it lies inside it.
fn rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Human-readable byte size: `512 B`, `1.2 KB`, `3.4 MB`.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn failure_lines<'a>(failures: impl Iterator<Item = (String, &'a str)>) -> Vec<String> {
    let lines: Vec<String> = failures
        .map(|(what, reason)| format!("{}{}: {}", indent(1), what, reason))
        .collect();
    if lines.is_empty() {
        return lines;
    }
    std::iter::once("Failed".to_string()).chain(lines).collect()
}

// ============================================================================
// Pages
// ============================================================================

pub fn format_pages_report(report: &PagesReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in report.written.iter().enumerate() {
        let mut details = Vec::new();
        if page.chapters > 1 {
            details.push(plural(page.chapters, "chapter", "chapters"));
        }
        if page.has_index {
            details.push("keyword index".to_string());
        }
        let details = if details.is_empty() {
            String::new()
        } else {
            format!(" ({})", details.join(", "))
        };
        lines.push(format!(
            "{} {}{} \u{2192} {}",
            format_index(i + 1),
            page.name,
            details,
            rel(&page.output, root)
        ));
    }

    lines.extend(failure_lines(
        report
            .failures
            .iter()
            .map(|f| (f.name.clone(), f.reason.as_str())),
    ));

    lines.push(format!(
        "Wrote {}, {}, {}",
        plural(report.written.len(), "page", "pages"),
        plural(report.keywords, "keyword", "keywords"),
        plural(report.definition_sites, "definition", "definitions"),
    ));
    lines
}

pub fn print_pages_report(report: &PagesReport, root: &Path) {
    for line in format_pages_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Assets
// ============================================================================

pub fn format_assets_report(report: &AssetsReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Copied {} ({}) \u{2192} {}",
        plural(report.copied, "asset", "assets"),
        format_bytes(report.bytes),
        rel(&report.destination, root)
    )];
    lines.extend(failure_lines(
        report
            .failures
            .iter()
            .map(|f| (rel(&f.path, root), f.reason.as_str())),
    ));
    lines
}

pub fn print_assets_report(report: &AssetsReport, root: &Path) {
    for line in format_assets_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Styles
// ============================================================================

pub fn format_styles_report(report: &StylesReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Styles".to_string()];
    for sheet in &report.compiled {
        let map = sheet
            .source_map
            .as_ref()
            .and_then(|m| m.file_name())
            .map(|m| format!(" (+ {})", m.to_string_lossy()))
            .unwrap_or_default();
        lines.push(format!(
            "{} \u{2192} {}{}",
            rel(&sheet.source, root),
            rel(&sheet.output, root),
            map
        ));
    }
    for skipped in &report.skipped {
        lines.push(format!("{} (not found, skipped)", rel(skipped, root)));
    }
    lines.extend(failure_lines(
        report
            .failures
            .iter()
            .map(|f| (rel(&f.source, root), f.reason.as_str())),
    ));
    lines
}

pub fn print_styles_report(report: &StylesReport, root: &Path) {
    for line in format_styles_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Keyword index
// ============================================================================

/// Keyword inventory grouped by initial, in index order.
pub fn format_keyword_index(index: &KeywordIndex) -> Vec<String> {
    let mut lines = Vec::new();
    let mut bucket: Option<String> = None;
    for (i, (keyword, slugs)) in index.entries().enumerate() {
        let initial = bucket_of_keyword(keyword);
        if bucket.as_deref() != Some(initial.as_str()) {
            lines.push(initial.clone());
            bucket = Some(initial);
        }
        lines.push(format!(
            "{}{} {} \u{2192} {}",
            indent(1),
            format_index(i + 1),
            keyword,
            slugs.join(", ")
        ));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}, {}",
        plural(index.len(), "keyword", "keywords"),
        plural(index.site_count(), "definition", "definitions"),
    ));
    lines
}

pub fn print_keyword_index(index: &KeywordIndex) {
    for line in format_keyword_index(index) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::CopyFailure;
    use crate::pages::{PageFailure, PageSummary};
    use crate::styles::CompiledSheet;
    use std::path::PathBuf;

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_triple_digit() {
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
    }

    fn pages_report() -> PagesReport {
        PagesReport {
            written: vec![
                PageSummary {
                    name: "hyoshi".into(),
                    output: PathBuf::from("/book/dest/hyoshi.html"),
                    chapters: 1,
                    has_index: false,
                },
                PageSummary {
                    name: "index".into(),
                    output: PathBuf::from("/book/dest/index.html"),
                    chapters: 4,
                    has_index: true,
                },
            ],
            failures: vec![],
            keywords: 7,
            definition_sites: 9,
        }
    }

    #[test]
    fn pages_report_lines() {
        let lines = format_pages_report(&pages_report(), Path::new("/book"));
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 hyoshi \u{2192} dest/hyoshi.html",
                "002 index (4 chapters, keyword index) \u{2192} dest/index.html",
                "Wrote 2 pages, 7 keywords, 9 definitions",
            ]
        );
    }

    #[test]
    fn pages_report_lists_failures() {
        let mut report = pages_report();
        report.failures.push(PageFailure {
            name: "broken".into(),
            reason: "bad bytes".into(),
        });
        let lines = format_pages_report(&report, Path::new("/book"));
        assert!(lines.contains(&"Failed".to_string()));
        assert!(lines.contains(&"    broken: bad bytes".to_string()));
    }

    #[test]
    fn assets_report_lines() {
        let report = AssetsReport {
            copied: 2,
            bytes: 2048,
            failures: vec![CopyFailure {
                path: PathBuf::from("/book/content/assets/locked.png"),
                reason: "permission denied".into(),
            }],
            destination: PathBuf::from("/book/dest/assets"),
        };
        let lines = format_assets_report(&report, Path::new("/book"));
        assert_eq!(lines[0], "Copied 2 assets (2.0 KB) \u{2192} dest/assets");
        assert_eq!(lines[1], "Failed");
        assert_eq!(lines[2], "    content/assets/locked.png: permission denied");
    }

    #[test]
    fn styles_report_marks_source_maps_and_skips() {
        let report = StylesReport {
            compiled: vec![CompiledSheet {
                source: PathBuf::from("/book/style/main.css"),
                output: PathBuf::from("/book/dest/main.css"),
                source_map: Some(PathBuf::from("/book/dest/main.css.map")),
                bytes: 10,
            }],
            skipped: vec![PathBuf::from("/book/style/hyoshi.css")],
            failures: vec![],
        };
        let lines = format_styles_report(&report, Path::new("/book"));
        assert_eq!(
            lines,
            vec![
                "Styles",
                "style/main.css \u{2192} dest/main.css (+ main.css.map)",
                "style/hyoshi.css (not found, skipped)",
            ]
        );
    }

    #[test]
    fn keyword_index_groups_by_initial() {
        let mut index = KeywordIndex::default();
        index.register("だいにゅう|代入");
        index.register("たんご");
        index.register("かわ");
        index.register("たんご");

        let lines = format_keyword_index(&index);
        assert_eq!(
            lines,
            vec![
                "か",
                "    001 かわ \u{2192} kwd_かわ",
                "た",
                "    002 たんご \u{2192} kwd_たんご, kwd_たんご-1",
                "    003 だいにゅう|代入 \u{2192} kwd_だいにゅう代入",
                "",
                "3 keywords, 4 definitions",
            ]
        );
    }

    #[test]
    fn empty_keyword_index() {
        let lines = format_keyword_index(&KeywordIndex::default());
        assert_eq!(lines, vec!["0 keywords, 0 definitions"]);
    }
}
