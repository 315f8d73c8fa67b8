//! # Kotoba
//!
//! A static book builder for technical writing in Japanese. Markdown pages
//! become HTML with highlighted, line-numbered code; keywords marked anywhere
//! in the book are gathered into an index ordered by reading, with voiced
//! kana filed under their unvoiced row (`だ` under `た`).
//!
//! # Architecture: Named Tasks
//!
//! Work is split into small tasks with declared predecessors, run in
//! dependency order by [`tasks::Runner`]:
//!
//! ```text
//! build = pages + (clean-assets → assets) + styles
//! watch = build + serve, then rebuild on change
//! ```
//!
//! Page rendering has two phases because the keyword index can only be
//! written once every definition in the book is known:
//!
//! ```text
//! 1. Scan    content/*.md  →  HTML with placeholders + KeywordIndex
//! 2. Write   index HTML substituted into placeholders  →  dest/*.html
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`keyword`] | Keyword registry, anchor slugs, kana bucketing, index rendering |
//! | [`highlight`] | syntect-based code highlighting with a line-number gutter |
//! | [`markdown`] | pulldown-cmark rendering with the `define-keyword` / `render-index` / code directives |
//! | [`pages`] | Page discovery, chapter ordering, the two-phase build, Maud page shell |
//! | [`naming`] | `NNN-name` chapter ordering |
//! | [`assets`] | Clean and copy the assets tree |
//! | [`styles`] | Style sheet bundling with lightningcss, source map for the main sheet |
//! | [`serve`] | Preview server over the output directory |
//! | [`reload`] | WebSocket hub that reloads open pages after a rebuild |
//! | [`watch`] | File watching, debouncing, change → task classification |
//! | [`tasks`] | Task graph and runner |
//! | [`config`] | `kotoba.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting for stage reports |
//! | [`logger`] | Colored `log!` / `debug!` macros |
//!
//! # Design Decisions
//!
//! ## Directives as Fenced Blocks
//!
//! Keyword definitions, the index location and code options are fenced code
//! blocks with a special info string. Content stays valid CommonMark, so any
//! markdown viewer shows something sensible, and no custom parser is needed.
//!
//! ## Fresh Index per Build
//!
//! Anchor ids carry collision suffixes (`kwd_やま`, `kwd_やま-1`). If the
//! registry survived between builds, every rebuild in watch mode would shift
//! the suffixes. Each page build starts from an empty [`keyword::KeywordIndex`]
//! so output depends only on content.
//!
//! ## Maud for Markup
//!
//! Anchors, index entries, code blocks and the page shell are built with
//! [Maud](https://maud.lambda.xyz/). Interpolation is escaped by default, so
//! a keyword like `<T>` cannot break the page.

pub mod assets;
pub mod config;
pub mod highlight;
pub mod keyword;
pub mod logger;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod pages;
pub mod reload;
pub mod serve;
pub mod styles;
pub mod tasks;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
