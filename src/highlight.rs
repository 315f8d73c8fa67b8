//! Code block highlighting.
//!
//! Wraps syntect's classed HTML generator so token colors come from the
//! book's style sheet rather than inline styles. Languages are looked up by
//! name or extension (`rust`, `rs`, `Python`, `js`); an unknown language is
//! not an error, the code is simply escaped and passed through.
//!
//! With a start line the block gets a line-number gutter that a style sheet
//! can number with a CSS counter:
//!
//! ```text
//! <pre class="line-numbers" data-start="10"><code class="language-rust">
//!   <span class="line-numbers-rows" style="counter-reset: linenumber 9">
//!     <span></span> (one per source line)
//!   </span>
//!   …highlighted code…
//! </code></pre>
//! ```

use crate::debug;
use maud::{PreEscaped, html};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Language tags that mean "no highlighting".
const PLAIN_TAGS: &[&str] = &["", "plain", "text", "txt", "plaintext"];

pub struct Highlighter {
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl Highlighter {
    /// Create a highlighter with syntect's bundled syntax definitions.
    ///
    /// `class_prefix` is prepended to every token class. syntect wants it as
    /// `&'static str`, so a non-empty prefix is leaked once per highlighter.
    pub fn new(class_prefix: &str) -> Self {
        let class_style = if class_prefix.is_empty() {
            ClassStyle::Spaced
        } else {
            ClassStyle::SpacedPrefixed {
                prefix: Box::leak(class_prefix.to_string().into_boxed_str()),
            }
        };
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style,
        }
    }

    /// Look up a syntax by language tag. `None` means pass the code through.
    pub fn syntax_for(&self, lang: &str) -> Option<&SyntaxReference> {
        if PLAIN_TAGS.iter().any(|t| t.eq_ignore_ascii_case(lang)) {
            return None;
        }
        self.syntax_set.find_syntax_by_token(lang)
    }

    /// Render a code block as `<pre><code>` markup.
    ///
    /// `start` adds the line-number gutter whose counter begins at `start - 1`.
    pub fn highlight(&self, code: &str, lang: Option<&str>, start: Option<i64>) -> String {
        let lang = lang.map(str::trim).filter(|l| !l.is_empty());
        let body = lang
            .and_then(|l| self.syntax_for(l))
            .and_then(|syntax| self.classed(code, syntax))
            .unwrap_or_else(|| html! { (code) }.into_string());
        let gutter = start.map(|s| line_number_gutter(code, s));
        let code_class = format!("language-{}", lang.unwrap_or("plain"));

        html! {
            pre class=[start.map(|_| "line-numbers")] data-start=[start] {
                code class=(code_class) {
                    @if let Some(gutter) = gutter {
                        (PreEscaped(gutter))
                    }
                    (PreEscaped(body))
                }
            }
        }
        .into_string()
    }

    fn classed(&self, code: &str, syntax: &SyntaxReference) -> Option<String> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, self.class_style);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                debug!("highlight"; "{} failed, passing through: {e}", syntax.name);
                return None;
            }
        }
        Some(generator.finalize())
    }
}

/// One empty gutter row per source line, counter starting at `start - 1`.
fn line_number_gutter(code: &str, start: i64) -> String {
    let rows = code.lines().count();
    html! {
        span class="line-numbers-rows" style={ "counter-reset: linenumber " (start.saturating_sub(1)) } {
            @for _ in 0..rows {
                span {}
            }
        }
    }
    .into_string()
}
