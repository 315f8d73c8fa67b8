//! Shared test utilities.
//!
//! Provides fixture setup and small extractors over generated HTML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = fixture_config(tmp.path());
//! build_pages(&config, &highlighter).unwrap();
//!
//! let index = read_output(tmp.path(), "index.html");
//! assert!(anchor_ids(&index).contains(&"kwd_やま".to_string()));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::Config;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/book/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/book");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Stock config rooted at `root`.
pub fn fixture_config(root: &Path) -> Config {
    Config {
        root: root.to_path_buf(),
        ..Config::default()
    }
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

// =========================================================================
// Output lookups; panics with a clear message on miss
// =========================================================================

/// Read a file from the default output directory. Panics if missing.
pub fn read_output(root: &Path, name: &str) -> String {
    let path = root.join("dest").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("output {} not readable: {e}", path.display()))
}

/// Ids of all keyword anchors in `html`, in document order.
pub fn anchor_ids(html: &str) -> Vec<String> {
    const MARKER: &str = r#"<div class="index-keyword" id=""#;
    html.match_indices(MARKER)
        .filter_map(|(at, _)| {
            let rest = &html[at + MARKER.len()..];
            rest.find('"').map(|end| rest[..end].to_string())
        })
        .collect()
}
