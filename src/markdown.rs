//! Markdown to HTML conversion.
//!
//! Wraps pulldown-cmark. The base dialect enables tables, strikethrough,
//! task lists and footnotes. Two per-document features layer on top:
//!
//! - **Math**: `$inline$` and `$$display$$` spans become
//!   `<span class="math math-inline">` / `<span class="math math-display">`
//!   markup that KaTeX typesets in the browser.
//! - **Code highlighting**: fenced code blocks are highlighted at build time
//!   with syntect. Tokens get `hljs-` prefixed classes so the linked
//!   highlight.js theme styles them.
//!
//! Conversion never fails: pulldown-cmark accepts any input, and a code
//! block whose grammar chokes falls back to escaped plain text.

use pulldown_cmark_escape::escape_html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

/// Conversion features for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub math: bool,
    pub highlight: bool,
}

/// Convert a Markdown body to an HTML fragment.
pub fn to_html(markdown: &str, features: Features) -> String {
    let mut options = base_options();
    if features.math {
        options.insert(Options::ENABLE_MATH);
    }

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    if features.highlight {
        html::push_html(&mut out, Highlighter::new(parser));
    } else {
        html::push_html(&mut out, parser);
    }
    out
}

fn base_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Event adapter that swaps fenced code blocks for highlighted HTML.
struct Highlighter<'a, I> {
    inner: I,
    block: Option<CodeBlock<'a>>,
}

struct CodeBlock<'a> {
    lang: CowStr<'a>,
    code: String,
}

impl<'a, I: Iterator<Item = Event<'a>>> Highlighter<'a, I> {
    fn new(inner: I) -> Self {
        Self { inner, block: None }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Highlighter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(label) => label,
                        CodeBlockKind::Indented => CowStr::Borrowed(""),
                    };
                    self.block = Some(CodeBlock {
                        lang,
                        code: String::new(),
                    });
                }
                Event::Text(text) if self.block.is_some() => {
                    if let Some(block) = self.block.as_mut() {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if self.block.is_some() => {
                    let block = self.block.take()?;
                    return Some(Event::Html(render_code_block(&block).into()));
                }
                event => return Some(event),
            }
        }
    }
}

/// First word of a fence label: "rust,ignore" and "rust title=x" mean rust.
fn fence_language(label: &str) -> &str {
    label
        .split(|c: char| c == ',' || c.is_whitespace())
        .next()
        .unwrap_or("")
}

fn find_syntax(lang: &str) -> &'static SyntaxReference {
    if lang.is_empty() {
        return SYNTAX_SET.find_syntax_plain_text();
    }
    SYNTAX_SET
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

fn render_code_block(block: &CodeBlock<'_>) -> String {
    let lang = fence_language(&block.lang);
    let body = highlight_code(&block.code, find_syntax(lang)).unwrap_or_else(|| {
        let mut plain = String::with_capacity(block.code.len());
        let _ = escape_html(&mut plain, &block.code);
        plain
    });

    let mut out = String::from("<pre><code class=\"hljs");
    if !lang.is_empty() {
        out.push_str(" language-");
        let _ = escape_html(&mut out, lang);
    }
    out.push_str("\">");
    out.push_str(&body);
    out.push_str("</code></pre>\n");
    out
}

fn highlight_code(code: &str, syntax: &SyntaxReference) -> Option<String> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(syntax = %syntax.name, %err, "highlighting failed, using plain text");
            return None;
        }
    }
    Some(generator.finalize())
}
