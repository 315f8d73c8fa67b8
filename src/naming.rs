//! Chapter ordering by the `NNN-name` filename convention.
//!
//! A multi-chapter page is a directory of markdown files. Their order in the
//! rendered page is the number prefix, so authors can renumber without
//! renaming the rest:
//!
//! ```text
//! content/index/
//! ├── 010-intro.md          # first
//! ├── 020-ownership.md
//! ├── 020a-aside.md         # not numbered ("020a" is not a number) → after all numbered
//! └── appendix.md           # unnumbered → after numbered, by name
//! ```
//!
//! Ordering feeds keyword registration, and registration order fixes anchor
//! ids, so the sort must be total and stable across platforms. Ties fall back
//! to the full relative path.

use std::cmp::Ordering;
use std::path::Path;

/// Result of parsing a file stem like `020-ownership`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterName {
    /// Number prefix if present (`20` from `020-ownership`).
    pub number: Option<u32>,
    /// Name part after `NNN-`. For unnumbered stems, the full stem.
    pub name: String,
}

/// Parse a stem following the `NNN-name` convention.
///
/// - `"020-ownership"` → number=Some(20), name="ownership"
/// - `"001"` → number=Some(1), name=""
/// - `"appendix"` → number=None, name="appendix"
/// - `"2024-notes"` → number=Some(2024), name="notes"
pub fn parse_chapter_name(stem: &str) -> ChapterName {
    let (prefix, rest) = stem.split_once('-').unwrap_or((stem, ""));
    match prefix.parse::<u32>() {
        Ok(number) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            ChapterName {
                number: Some(number),
                name: rest.to_string(),
            }
        }
        _ => ChapterName {
            number: None,
            name: stem.to_string(),
        },
    }
}

/// Compare two chapter paths (relative to their page directory).
///
/// Paths are compared component by component, so `part1/` sorts as a unit
/// before `part2/`. Within a component: numbered before unnumbered, then by
/// number, then by name. Equal keys fall back to the raw path.
pub fn compare_chapters(a: &Path, b: &Path) -> Ordering {
    chapter_key(a)
        .cmp(&chapter_key(b))
        .then_with(|| a.cmp(b))
}

fn chapter_key(path: &Path) -> Vec<(bool, Option<u32>, String)> {
    path.components()
        .map(|component| {
            let stem = Path::new(component.as_os_str())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parsed = parse_chapter_name(&stem);
            (parsed.number.is_none(), parsed.number, parsed.name)
        })
        .collect()
}
