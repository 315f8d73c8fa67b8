//! Keyword registry: every keyword definition site seen during a content scan.
//!
//! A keyword is identified by its raw text, guide prefix included, so
//! `なまえ|名前` and `めい|名前` are separate entries. Each call to
//! [`KeywordIndex::register`] issues a fresh slug from the index's own
//! [`Slugger`] and appends it to the keyword's list, so a keyword defined in
//! three places links to all three.
//!
//! One `KeywordIndex` is built per page-build run. Nothing is global: a watch
//! rebuild starts from an empty index and reproduces the same ids.

use super::slug::Slugger;
use maud::html;
use std::collections::BTreeMap;

/// Prefix that keeps keyword anchors out of the heading-id namespace.
pub const DEFAULT_SLUG_PREFIX: &str = "kwd_";

#[derive(Debug)]
pub struct KeywordIndex {
    prefix: String,
    slugger: Slugger,
    /// Keyword → definition-site slugs in registration order.
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::new(DEFAULT_SLUG_PREFIX)
    }
}

impl KeywordIndex {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            slugger: Slugger::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Record one definition site for `keyword` and return its anchor id.
    pub fn register(&mut self, keyword: &str) -> String {
        let slug = format!("{}{}", self.prefix, self.slugger.slug(keyword));
        self.entries
            .entry(keyword.to_string())
            .or_default()
            .push(slug.clone());
        slug
    }

    /// Expand a `define-keyword` block into anchor elements.
    ///
    /// One keyword per non-blank line, trimmed, registered in line order.
    /// Each keyword becomes `<div class="index-keyword" id="…"></div>` on its
    /// own line.
    pub fn define(&mut self, block: &str) -> String {
        let tags: Vec<String> = block
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|keyword| {
                let slug = self.register(keyword);
                html! { div class="index-keyword" id=(slug) {} }.into_string()
            })
            .collect();
        tags.join("\n") + "\n"
    }

    /// Slugs registered for `keyword`, in registration order.
    pub fn slugs(&self, keyword: &str) -> Option<&[String]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    /// All keywords with their slugs, ordered by UTF-16 code units.
    ///
    /// Matches browser string ordering: supplementary-plane characters such
    /// as `𠮷` sort before `U+E000..=U+FFFF` (half-width kana included).
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        let mut sorted: Vec<(&str, &[String])> = self
            .entries
            .iter()
            .map(|(keyword, slugs)| (keyword.as_str(), slugs.as_slice()))
            .collect();
        sorted.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));
        sorted.into_iter()
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of definition sites across all keywords.
    pub fn site_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Split a raw keyword into its display text: everything after the first `|`.
pub fn display_name(keyword: &str) -> &str {
    keyword
        .split_once('|')
        .map(|(_, name)| name)
        .unwrap_or(keyword)
}
