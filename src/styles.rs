//! Style sheet compilation.
//!
//! Each sheet is bundled with lightningcss: `@import` rules are inlined so the
//! output is one self-contained file next to the pages.
//!
//! | Sheet | Output | Source map |
//! |-------|--------|------------|
//! | `styles.main` (`main.css`) | `dest/main.css` | `dest/main.css.map` |
//! | `styles.cover` (`hyoshi.css`) | `dest/hyoshi.css` | none |
//!
//! A missing cover sheet is skipped. Any other failure is logged, counted in
//! the report, and the remaining sheet still compiles.

use crate::config::Config;
use crate::{debug, log};
use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions};
use parcel_sourcemap::SourceMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {message}")]
    Css { path: PathBuf, message: String },
    #[error("source map for {path}: {message}")]
    SourceMap { path: PathBuf, message: String },
}

/// A sheet written to the output directory.
#[derive(Debug, Clone)]
pub struct CompiledSheet {
    pub source: PathBuf,
    pub output: PathBuf,
    pub source_map: Option<PathBuf>,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SheetFailure {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct StylesReport {
    pub compiled: Vec<CompiledSheet>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<SheetFailure>,
}

/// Output file name for a sheet: its file name with a `.css` extension.
pub fn output_name(sheet: &Path) -> String {
    sheet
        .with_extension("css")
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "style.css".to_string())
}

/// Bundle one sheet, returning the CSS and optionally its source map JSON.
pub fn compile_sheet(
    path: &Path,
    root: &Path,
    minify: bool,
    with_map: bool,
) -> Result<(String, Option<String>), StyleError> {
    let css_err = |message: String| StyleError::Css {
        path: path.to_path_buf(),
        message,
    };

    let provider = FileProvider::new();
    let project_root = root.to_string_lossy().into_owned();
    let mut source_map = with_map.then(|| SourceMap::new(&project_root));

    let stylesheet = {
        let mut bundler = Bundler::new(&provider, source_map.as_mut(), ParserOptions::default());
        bundler.bundle(path).map_err(|e| css_err(e.to_string()))?
    };
    let code = stylesheet
        .to_css(PrinterOptions {
            minify,
            source_map: source_map.as_mut(),
            project_root: Some(&project_root),
            ..PrinterOptions::default()
        })
        .map_err(|e| css_err(e.to_string()))?
        .code;
    drop(stylesheet);

    let map = source_map
        .map(|mut sm| {
            sm.to_json(None).map_err(|e| StyleError::SourceMap {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })
        .transpose()?;
    Ok((code, map))
}

fn write(path: &Path, contents: &str) -> Result<(), StyleError> {
    fs::write(path, contents).map_err(|source| StyleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn compile_into(
    source: &Path,
    config: &Config,
    with_map: bool,
) -> Result<CompiledSheet, StyleError> {
    let name = output_name(source);
    let output = config.output_dir().join(&name);
    let (mut css, map) = compile_sheet(source, &config.root, config.styles.minify, with_map)?;

    let source_map = match map {
        Some(map) => {
            let map_path = output.with_file_name(format!("{name}.map"));
            write(&map_path, &map)?;
            if !css.ends_with('\n') {
                css.push('\n');
            }
            css.push_str(&format!("/*# sourceMappingURL={name}.map */\n"));
            Some(map_path)
        }
        None => None,
    };
    write(&output, &css)?;

    Ok(CompiledSheet {
        source: source.to_path_buf(),
        output,
        source_map,
        bytes: css.len(),
    })
}

/// Compile the main sheet (with source map) and the cover sheet.
pub fn compile_styles(config: &Config) -> Result<StylesReport, StyleError> {
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).map_err(|source| StyleError::Io {
        path: output_dir.clone(),
        source,
    })?;

    let style_dir = config.style_dir();
    let sheets = [
        (style_dir.join(&config.styles.main), true, false),
        (style_dir.join(&config.styles.cover), false, true),
    ];

    let mut report = StylesReport::default();
    for (source, with_map, optional) in sheets {
        if optional && !source.exists() {
            debug!("styles"; "no {}, skipping", source.display());
            report.skipped.push(source);
            continue;
        }
        match compile_into(&source, config, with_map) {
            Ok(sheet) => {
                log!("styles"; "{} → {}", source.display(), sheet.output.display());
                report.compiled.push(sheet);
            }
            Err(e) => {
                crate::logger::log_error("styles", &format!("failed to compile {}", source.display()), &e);
                report.failures.push(SheetFailure {
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn output_name_normalizes_extension() {
        assert_eq!(output_name(Path::new("main.css")), "main.css");
        assert_eq!(output_name(Path::new("sub/hyoshi.styl")), "hyoshi.css");
    }

    #[test]
    fn imports_are_inlined() {
        let tmp = setup_fixtures();
        let (css, map) =
            compile_sheet(&tmp.path().join("style/main.css"), tmp.path(), false, false).unwrap();
        assert!(!css.contains("@import"));
        assert!(css.contains("font-family"));
        assert!(css.contains(".index-keyword"));
        assert!(map.is_none());
    }

    #[test]
    fn main_sheet_gets_source_map() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        let report = compile_styles(&config).unwrap();

        assert_eq!(report.compiled.len(), 2);
        let main = read_output(tmp.path(), "main.css");
        assert!(main.ends_with("/*# sourceMappingURL=main.css.map */\n"));
        let map = read_output(tmp.path(), "main.css.map");
        assert!(map.contains("\"mappings\""));
    }

    #[test]
    fn cover_sheet_has_no_source_map() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        compile_styles(&config).unwrap();

        let cover = read_output(tmp.path(), "hyoshi.css");
        assert!(cover.contains("text-align"));
        assert!(!cover.contains("sourceMappingURL"));
        assert!(!tmp.path().join("dest/hyoshi.css.map").exists());
    }

    #[test]
    fn missing_cover_sheet_is_skipped() {
        let tmp = setup_fixtures();
        fs::remove_file(tmp.path().join("style/hyoshi.css")).unwrap();
        let config = fixture_config(tmp.path());
        let report = compile_styles(&config).unwrap();

        assert_eq!(report.compiled.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn broken_sheet_is_reported_and_other_still_compiles() {
        let tmp = setup_fixtures();
        write_file(tmp.path(), "style/main.css", "@import \"missing.css\";\n");
        let config = fixture_config(tmp.path());
        let report = compile_styles(&config).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.compiled.len(), 1);
        assert!(tmp.path().join("dest/hyoshi.css").exists());
    }

    #[test]
    fn minify_shrinks_output() {
        let tmp = setup_fixtures();
        let path = tmp.path().join("style/main.css");
        let (plain, _) = compile_sheet(&path, tmp.path(), false, false).unwrap();
        let (small, _) = compile_sheet(&path, tmp.path(), true, false).unwrap();
        assert!(small.len() < plain.len());
    }
}
