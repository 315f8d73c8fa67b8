//! Render the keyword index.
//!
//! Keywords are listed in UTF-16 string order of their raw text (guide prefix
//! included) and grouped under a header each time the collation bucket of the
//! first character changes. Bucketing is an overlay on that order, not a sort
//! key of its own.
//!
//! ```text
//! <div class="first-letter">か</div>
//! <li class="index-item"><div class="index-keyword-name">型</div><div class="index-keyword-links"><a href="#kwd_かた型"></a></div></li>
//! ```

use super::collation::bucket_of_keyword;
use super::registry::{KeywordIndex, display_name};
use maud::{Markup, html};

/// Render the full index fragment. An empty index renders as `""`.
pub fn render_index(index: &KeywordIndex) -> String {
    let mut output = String::new();
    let mut current: Option<String> = None;

    for (keyword, slugs) in index.entries() {
        let bucket = bucket_of_keyword(keyword);
        if current.as_deref() != Some(bucket.as_str()) {
            output.push_str(&bucket_header(&bucket).into_string());
            output.push('\n');
            current = Some(bucket);
        }
        output.push_str(&index_item(display_name(keyword), slugs).into_string());
        output.push('\n');
    }

    output
}

fn bucket_header(bucket: &str) -> Markup {
    html! { div class="first-letter" { (bucket) } }
}

fn index_item(name: &str, slugs: &[String]) -> Markup {
    html! {
        li class="index-item" {
            div class="index-keyword-name" { (name) }
            div class="index-keyword-links" {
                @for (i, slug) in slugs.iter().enumerate() {
                    @if i > 0 { ", " }
                    a href={ "#" (slug) } {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(html: &str) -> Vec<&str> {
        html.lines()
            .filter_map(|l| {
                l.strip_prefix(r#"<div class="first-letter">"#)
                    .and_then(|rest| rest.strip_suffix("</div>"))
            })
            .collect()
    }

    fn names(html: &str) -> Vec<&str> {
        html.match_indices(r#"<div class="index-keyword-name">"#)
            .map(|(pos, open)| {
                let rest = &html[pos + open.len()..];
                &rest[..rest.find("</div>").unwrap()]
            })
            .collect()
    }

    #[test]
    fn empty_index_renders_nothing() {
        assert_eq!(render_index(&KeywordIndex::default()), "");
    }

    #[test]
    fn keywords_listed_in_ascending_raw_order() {
        let mut index = KeywordIndex::default();
        for k in ["やま", "かわ", "あめ", "Box", "Arc"] {
            index.register(k);
        }
        let html = render_index(&index);
        assert_eq!(names(&html), vec!["Arc", "Box", "あめ", "かわ", "やま"]);
    }

    #[test]
    fn voiced_and_unvoiced_share_one_header() {
        let mut index = KeywordIndex::default();
        index.register("だいじ");
        index.register("たいじ");
        let html = render_index(&index);

        assert_eq!(headers(&html), vec!["た"]);
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], r#"<div class="first-letter">た</div>"#);
        assert!(lines[1].contains(">たいじ<"));
        assert!(lines[2].contains(">だいじ<"));
    }

    #[test]
    fn guide_prefix_sorts_but_is_not_displayed() {
        let mut index = KeywordIndex::default();
        index.register("なまえ|名前");
        index.register("いぬ|犬");
        let html = render_index(&index);

        assert_eq!(names(&html), vec!["犬", "名前"]);
        assert_eq!(headers(&html), vec!["い", "な"]);
        assert!(!html.contains("なまえ|"));
    }

    #[test]
    fn every_site_gets_a_link() {
        let mut index = KeywordIndex::default();
        let y1 = index.register("やま");
        let k = index.register("かわ");
        let y2 = index.register("やま");
        let html = render_index(&index);

        assert!(html.contains(&format!(r##"<a href="#{k}"></a></div>"##)));
        assert!(html.contains(&format!(r##"<a href="#{y1}"></a>, <a href="#{y2}"></a>"##)));
    }

    #[test]
    fn header_emitted_once_per_run() {
        let mut index = KeywordIndex::default();
        for k in ["かさ", "がけ", "きく", "ぎん"] {
            index.register(k);
        }
        // かさ < がけ < きく < ぎん: buckets か, か, き, き
        assert_eq!(headers(&render_index(&index)), vec!["か", "き"]);
    }

    #[test]
    fn latin_keywords_bucket_case_insensitively() {
        let mut index = KeywordIndex::default();
        index.register("Zebra");
        index.register("zero");
        assert_eq!(headers(&render_index(&index)), vec!["Z"]);
    }

    #[test]
    fn display_text_is_escaped() {
        let mut index = KeywordIndex::default();
        index.register("<T>");
        let html = render_index(&index);
        assert!(html.contains("&lt;T&gt;"));
        assert!(!html.contains("<T>"));
    }
}
