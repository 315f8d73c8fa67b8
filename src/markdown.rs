//! Markdown rendering with the book's three block directives.
//!
//! Directives are fenced code blocks whose info string names them, so content
//! stays plain CommonMark and renders sensibly on any markdown viewer:
//!
//! ````markdown
//! ```define-keyword
//! しょゆうけん|所有権
//! borrow checker
//! ```
//!
//! ```render-index
//! ```
//!
//! ```rust start=12
//! fn main() {}
//! ```
//! ````
//!
//! - `define-keyword`: each non-blank line registers a keyword and becomes an
//!   invisible anchor (see [`KeywordIndex::define`]).
//! - `render-index`: leaves [`INDEX_PLACEHOLDER`]. The index can only be
//!   rendered once every page has been scanned, so the page builder swaps the
//!   placeholder afterwards.
//! - anything else: a code block, highlighted by language with an optional
//!   `start=N` line-number gutter.

use crate::highlight::Highlighter;
use crate::keyword::KeywordIndex;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

/// Stand-in for the keyword index until all pages are scanned.
pub const INDEX_PLACEHOLDER: &str = "<!--kotoba:keyword-index-->";

pub const DEFINE_KEYWORD: &str = "define-keyword";
pub const RENDER_INDEX: &str = "render-index";

/// One rendered markdown document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    /// Text of the first level-1 heading.
    pub title: Option<String>,
    /// Whether a `render-index` directive appeared.
    pub has_index: bool,
}

/// What a fenced block's info string asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    DefineKeyword,
    RenderIndex,
    Code { lang: Option<String>, start: Option<i64> },
}

/// Parse a fence info string.
///
/// The first word is the directive or language. Later `key=value` words set
/// options: `start=N` (non-numeric values are ignored) and `lang=…`.
pub fn parse_info(info: &str) -> Directive {
    let mut words = info.split_whitespace();
    let head = words.next();
    match head {
        Some(DEFINE_KEYWORD) => return Directive::DefineKeyword,
        Some(RENDER_INDEX) => return Directive::RenderIndex,
        _ => {}
    }

    let mut lang = head.filter(|w| !w.contains('=')).map(str::to_string);
    let mut start = None;
    for word in head.into_iter().filter(|w| w.contains('=')).chain(words) {
        let Some((key, value)) = word.split_once('=') else {
            continue;
        };
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        match key {
            "start" => start = value.parse::<i64>().ok(),
            "lang" if !value.is_empty() => lang = Some(value.to_string()),
            _ => {}
        }
    }
    Directive::Code { lang, start }
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render `source`, registering keyword definitions into `index` in document order.
pub fn render_markdown(source: &str, index: &mut KeywordIndex, highlighter: &Highlighter) -> Rendered {
    let mut events: Vec<Event> = Vec::new();
    let mut block: Option<(Directive, String)> = None;
    let mut title: Option<String> = None;
    let mut heading_text: Option<String> = None;
    let mut has_index = false;

    for event in Parser::new_ext(source, options()) {
        if let Some((_, text)) = block.as_mut() {
            match event {
                Event::Text(t) => text.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((directive, text)) = block.take() {
                        let html = match directive {
                            Directive::DefineKeyword => index.define(&text),
                            Directive::RenderIndex => {
                                has_index = true;
                                format!("{INDEX_PLACEHOLDER}\n")
                            }
                            Directive::Code { lang, start } => {
                                highlighter.highlight(&text, lang.as_deref(), start) + "\n"
                            }
                        };
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                _ => {}
            }
            continue;
        }

        match &event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let directive = match kind {
                    CodeBlockKind::Fenced(info) => parse_info(info),
                    CodeBlockKind::Indented => Directive::Code {
                        lang: None,
                        start: None,
                    },
                };
                block = Some((directive, String::new()));
                continue;
            }
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if title.is_none() => heading_text = Some(String::new()),
            Event::Text(t) | Event::Code(t) => {
                if let Some(h) = heading_text.as_mut() {
                    h.push_str(t);
                }
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(h) = heading_text.take() {
                    title = Some(h.trim().to_string());
                }
            }
            _ => {}
        }
        events.push(event);
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    Rendered {
        html: out,
        title,
        has_index,
    }
}
