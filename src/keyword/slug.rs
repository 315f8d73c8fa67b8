//! Anchor slugs in the style of GitHub heading ids.
//!
//! Text is lowercased, everything except letters, digits, `-`, `_` and
//! whitespace is dropped, and whitespace becomes `-`. Letters of any script
//! survive, so `なまえ|名前` slugs to `なまえ名前`.
//!
//! A [`Slugger`] never issues the same slug twice. Repeats get a numeric
//! suffix: `rust`, `rust-1`, `rust-2`. A suffixed candidate that collides with
//! a slug issued earlier (say the text was literally `rust-1`) keeps counting.

use std::collections::HashMap;

/// Normalize text into a bare slug token without disambiguation.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Issues unique slugs for the lifetime of the value.
#[derive(Debug, Default)]
pub struct Slugger {
    /// Issued slug → number of times its base has been re-requested.
    occurrences: HashMap<String, u32>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugify `text` and disambiguate against every slug issued so far.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        while self.occurrences.contains_key(&candidate) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.occurrences.insert(candidate.clone(), 0);
        candidate
    }
}
