//! Keyword indexing.
//!
//! Content defines keywords with `define-keyword` blocks scattered through the
//! book. Each definition becomes an invisible anchor; the `render-index` block
//! later expands into an alphabetical listing linking back to every anchor.
//!
//! | Module | Role |
//! |--------|------|
//! | [`collation`] | First-character bucket with dakuten/handakuten folded onto the base kana |
//! | [`slug`] | Unique anchor ids, GitHub heading-id style |
//! | [`registry`] | [`KeywordIndex`]: keyword → definition-site slugs |
//! | [`render`] | Sorted, bucketed index fragment |
//!
//! Everything here is an in-memory transform with no I/O and no failure
//! modes. Registration order matters: it fixes slug suffixes and link order,
//! so callers must feed content in a deterministic order.

pub mod collation;
pub mod registry;
pub mod render;
pub mod slug;

pub use registry::{DEFAULT_SLUG_PREFIX, KeywordIndex, display_name};
pub use render::render_index;
