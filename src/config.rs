//! Project configuration.
//!
//! Handles loading, validating, and merging `kotoba.toml`. The file lives in
//! the project root next to the content and style directories and is
//! optional: stock defaults cover the conventional layout.
//!
//! ```text
//! book/
//! ├── kotoba.toml        # Optional project config
//! ├── content/
//! │   ├── hyoshi.md      # Cover page → dest/hyoshi.html
//! │   ├── index/         # Multi-chapter page → dest/index.html
//! │   │   ├── 010-intro.md
//! │   │   └── 020-ownership.md
//! │   └── assets/        # Copied verbatim to dest/assets/
//! ├── style/
//! │   ├── main.css       # Main sheet (with source map)
//! │   └── hyoshi.css     # Cover sheet
//! └── dest/              # Build output
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Untitled"
//! lang = "ja"
//!
//! [paths]
//! content = "content"
//! assets = "content/assets"
//! style = "style"
//! output = "dest"
//!
//! [pages]
//! cover = "hyoshi"          # Page that links the cover sheet
//!
//! [styles]
//! main = "main.css"
//! cover = "hyoshi.css"
//! minify = false
//!
//! [keywords]
//! slug_prefix = "kwd_"
//!
//! [highlight]
//! class_prefix = ""
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 3000
//! reload_port = 3001
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "kotoba.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `kotoba.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub pages: PagesConfig,
    pub styles: StylesConfig,
    pub keywords: KeywordsConfig,
    pub highlight: HighlightConfig,
    pub serve: ServeConfig,
    /// Project root all `paths` are relative to. Set by the loader.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.styles.main.trim().is_empty() {
            return Err(ConfigError::Validation(
                "styles.main must not be empty".into(),
            ));
        }
        if self.paths.output == self.paths.content {
            return Err(ConfigError::Validation(
                "paths.output must differ from paths.content".into(),
            ));
        }
        if self
            .keywords
            .slug_prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '&' | '#'))
        {
            return Err(ConfigError::Validation(
                "keywords.slug_prefix must be usable inside an id attribute".into(),
            ));
        }
        if self.serve.port == 0 || self.serve.reload_port == 0 {
            return Err(ConfigError::Validation(
                "serve.port and serve.reload_port must be non-zero".into(),
            ));
        }
        if self.serve.port == self.serve.reload_port {
            return Err(ConfigError::Validation(
                "serve.port and serve.reload_port must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.paths.content)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(&self.paths.assets)
    }

    pub fn style_dir(&self) -> PathBuf {
        self.root.join(&self.paths.style)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.paths.output)
    }

    /// Where copied assets land: `<output>/<last component of paths.assets>`.
    pub fn output_assets_dir(&self) -> PathBuf {
        let name = Path::new(&self.paths.assets)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "assets".into());
        self.output_dir().join(name)
    }
}

/// Document-wide metadata used by the page shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Fallback `<title>` for pages without a `# heading`.
    pub title: String,
    /// `lang` attribute of every page.
    pub lang: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            lang: "ja".to_string(),
        }
    }
}

/// Source and output directories, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub content: String,
    pub assets: String,
    pub style: String,
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            assets: "content/assets".to_string(),
            style: "style".to_string(),
            output: "dest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Page name (file stem or directory name) that links the cover sheet.
    pub cover: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            cover: "hyoshi".to_string(),
        }
    }
}

/// Style sheet entry points, relative to `paths.style`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// Main sheet, compiled with an external source map.
    pub main: String,
    /// Cover sheet, compiled without a source map. Skipped if missing.
    pub cover: String,
    /// Minify compiled output.
    pub minify: bool,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            main: "main.css".to_string(),
            cover: "hyoshi.css".to_string(),
            minify: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordsConfig {
    /// Prepended to every keyword anchor id.
    pub slug_prefix: String,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            slug_prefix: crate::keyword::DEFAULT_SLUG_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
    /// Prefix for token class names in highlighted code.
    pub class_prefix: String,
}

/// Preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub interface: String,
    pub port: u16,
    /// WebSocket port the injected reload script connects to.
    pub reload_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 3000,
            reload_port: 3001,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config rooted at `root`.
///
/// `explicit` overrides the default `<root>/kotoba.toml` location; an explicit
/// path that does not exist is an error, a missing default file is not.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?.ok_or_else(|| {
            ConfigError::Validation(format!("config file not found: {}", path.display()))
        })?),
        None => load_raw_config(&root.join(CONFIG_FILENAME))?,
    };
    let mut config = resolve_config(overlay)?;
    config.root = root.to_path_buf();
    Ok(config)
}

/// Returns a fully-commented stock `kotoba.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# kotoba configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Document
# ---------------------------------------------------------------------------
[site]
# Fallback <title> for pages without a "# heading".
title = "Untitled"
# lang attribute of every generated page.
lang = "ja"

# ---------------------------------------------------------------------------
# Layout (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
content = "content"
# Copied to <output>/<last path component> on every asset run.
assets = "content/assets"
style = "style"
output = "dest"

[pages]
# Page (file stem or directory name) that links the cover sheet instead of
# the main sheet.
cover = "hyoshi"

# ---------------------------------------------------------------------------
# Style sheets (relative to paths.style)
# ---------------------------------------------------------------------------
[styles]
# Compiled with an external source map (main.css.map).
main = "main.css"
# Compiled without a source map. Skipped if the file does not exist.
cover = "hyoshi.css"
minify = false

# ---------------------------------------------------------------------------
# Keyword index
# ---------------------------------------------------------------------------
[keywords]
# Prepended to every keyword anchor id.
slug_prefix = "kwd_"

# ---------------------------------------------------------------------------
# Code highlighting
# ---------------------------------------------------------------------------
[highlight]
# Prefix for token class names, e.g. "hl-" gives <span class="hl-keyword">.
class_prefix = ""

# ---------------------------------------------------------------------------
# Preview server (serve / watch)
# ---------------------------------------------------------------------------
[serve]
interface = "127.0.0.1"
port = 3000
# WebSocket port used by the injected live-reload script.
reload_port = 3001
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_conventional_layout() {
        let config = Config::default();
        assert_eq!(config.paths.content, "content");
        assert_eq!(config.paths.assets, "content/assets");
        assert_eq!(config.paths.style, "style");
        assert_eq!(config.paths.output, "dest");
        assert_eq!(config.pages.cover, "hyoshi");
    }

    #[test]
    fn default_config_has_keyword_prefix() {
        assert_eq!(Config::default().keywords.slug_prefix, "kwd_");
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[site]
title = "Rust入門"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.site.title, "Rust入門");
        // Defaults preserved
        assert_eq!(config.site.lang, "ja");
        assert_eq!(config.styles.main, "main.css");
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[site]
titel = "typo"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[serve]\nport = 8080").unwrap();
        let merged = merge_toml(base, overlay);
        let config: Config = merged.try_into().unwrap();
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.reload_port, 3001);
        assert_eq!(config.serve.interface, "127.0.0.1");
    }

    #[test]
    fn merge_replaces_scalars() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn same_ports_rejected() {
        let overlay: toml::Value = toml::from_str("[serve]\nport = 4000\nreload_port = 4000").unwrap();
        let result = resolve_config(Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn output_equal_to_content_rejected() {
        let overlay: toml::Value = toml::from_str("[paths]\noutput = \"content\"").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn slug_prefix_with_quote_rejected() {
        let overlay: toml::Value = toml::from_str("[keywords]\nslug_prefix = 'a\"b'").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config.site.title, "Untitled");
        assert_eq!(config.root, tmp.path());
        assert_eq!(config.output_dir(), tmp.path().join("dest"));
    }

    #[test]
    fn load_config_reads_project_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[paths]\noutput = \"public\"\n[styles]\nminify = true\n",
        )
        .unwrap();
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config.output_dir(), tmp.path().join("public"));
        assert!(config.styles.minify);
        assert_eq!(config.styles.main, "main.css");
    }

    #[test]
    fn explicit_missing_config_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(load_config(tmp.path(), Some(&missing)).is_err());
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[site\n").unwrap();
        assert!(matches!(
            load_config(tmp.path(), None),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn output_assets_dir_uses_last_component() {
        let config = Config {
            root: PathBuf::from("/book"),
            ..Config::default()
        };
        assert_eq!(config.output_assets_dir(), PathBuf::from("/book/dest/assets"));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.site.title, defaults.site.title);
        assert_eq!(config.paths.output, defaults.paths.output);
        assert_eq!(config.styles.cover, defaults.styles.cover);
        assert_eq!(config.keywords.slug_prefix, defaults.keywords.slug_prefix);
        assert_eq!(config.serve.reload_port, defaults.serve.reload_port);
    }
}
