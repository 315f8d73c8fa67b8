//! Asset copying.
//!
//! Assets (images, fonts, downloads) are copied verbatim from the content
//! assets directory to `dest/assets/`. The destination is removed first so
//! files deleted from the source do not linger in the output.

use crate::config::Config;
use crate::{debug, log};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone)]
pub struct CopyFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssetsReport {
    pub copied: usize,
    pub bytes: u64,
    pub failures: Vec<CopyFailure>,
    /// Destination directory, even when nothing was copied.
    pub destination: PathBuf,
}

/// Remove the output assets directory. Missing is fine.
pub fn clean_assets(config: &Config) -> Result<(), AssetError> {
    let dest = config.output_assets_dir();
    match fs::remove_dir_all(&dest) {
        Ok(()) => {
            debug!("assets"; "removed {}", dest.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(AssetError::Io { path: dest, source }),
    }
}

/// Copy the assets tree into the output directory.
///
/// Expects [`clean_assets`] to have run first. A missing source directory
/// copies nothing.
pub fn copy_assets(config: &Config) -> Result<AssetsReport, AssetError> {
    let src = config.assets_dir();
    let dest = config.output_assets_dir();
    let mut report = AssetsReport {
        destination: dest.clone(),
        ..AssetsReport::default()
    };

    if !src.is_dir() {
        log!("assets"; "no assets at {}, nothing to copy", src.display());
        return Ok(report);
    }

    for entry in WalkDir::new(&src).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(&src) else {
            continue;
        };
        let target = dest.join(rel);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map(|()| None)
        } else {
            copy_file(entry.path(), &target).map(Some)
        };

        match result {
            Ok(Some(bytes)) => {
                report.copied += 1;
                report.bytes += bytes;
            }
            Ok(None) => {}
            Err(source) => {
                let err = AssetError::Io {
                    path: entry.path().to_path_buf(),
                    source,
                };
                crate::logger::log_error("assets", "copy failed", &err);
                report.failures.push(CopyFailure {
                    path: entry.path().to_path_buf(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn copy_file(src: &Path, dst: &Path) -> std::io::Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)
}
