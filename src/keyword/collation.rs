//! Gojūon bucketing for index section headers.
//!
//! Voiced (dakuten) and semi-voiced (handakuten) hiragana share a bucket with
//! their unvoiced base, so `だいじ` is filed under `た` and `ぱん` under `は`.
//! Everything else is bucketed by its uppercase form.

/// Voiced and semi-voiced hiragana paired with their unvoiced base.
const DAKUON: [(char, char); 25] = [
    ('が', 'か'),
    ('ぎ', 'き'),
    ('ぐ', 'く'),
    ('げ', 'け'),
    ('ご', 'こ'),
    ('ざ', 'さ'),
    ('じ', 'し'),
    ('ず', 'す'),
    ('ぜ', 'せ'),
    ('ぞ', 'そ'),
    ('だ', 'た'),
    ('ぢ', 'ち'),
    ('づ', 'つ'),
    ('で', 'て'),
    ('ど', 'と'),
    ('ば', 'は'),
    ('び', 'ひ'),
    ('ぶ', 'ふ'),
    ('べ', 'へ'),
    ('ぼ', 'ほ'),
    ('ぱ', 'は'),
    ('ぴ', 'ひ'),
    ('ぷ', 'ふ'),
    ('ぺ', 'へ'),
    ('ぽ', 'ほ'),
];

/// Return the bucket a character is filed under.
///
/// The result is a `String` because uppercasing is not always one-to-one
/// (`ß` uppercases to `SS`).
pub fn bucket_of(c: char) -> String {
    let upper: String = c.to_uppercase().collect();
    let mut chars = upper.chars();
    if let (Some(single), None) = (chars.next(), chars.next())
        && let Some(&(_, base)) = DAKUON.iter().find(|(voiced, _)| *voiced == single)
    {
        return base.to_string();
    }
    upper
}

/// Bucket of a keyword's first character. The empty keyword has the empty bucket.
pub fn bucket_of_keyword(keyword: &str) -> String {
    keyword.chars().next().map(bucket_of).unwrap_or_default()
}
