//! HTML skeleton for generated pages.
//!
//! The skeleton is fixed; what varies per page is an ordered set of optional
//! head slots and the converted body. Slots render in a fixed priority
//! order (title, stylesheet, math support, highlight theme) and an absent
//! slot renders nothing, so there is no placeholder text that could survive
//! into the output or collide with page content.
//!
//! Math is typeset in the browser. The page ships the raw TeX inside
//! `.math` spans and the KaTeX script renders them on load; no KaTeX markup
//! is produced at build time, so a page with math needs JavaScript to show
//! formulas.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Head values are auto-escaped; the body is inserted verbatim since it is
//! already HTML from the Markdown converter.

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Typesets every `.math` span produced by the Markdown converter once the
/// KaTeX script has loaded.
const KATEX_RENDER: &str = r#"document.addEventListener("DOMContentLoaded", function () {
  document.querySelectorAll(".math").forEach(function (el) {
    katex.render(el.textContent, el, {
      displayMode: el.classList.contains("math-display"),
      throwOnError: false
    });
  });
});"#;

/// KaTeX assets linked by a page with math enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathAssets {
    pub css: String,
    pub integrity: Option<String>,
    pub js: String,
}

/// Optional head fragments, in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    pub title: Option<String>,
    /// `href` of the page stylesheet, relative to the page.
    pub stylesheet: Option<String>,
    pub math: Option<MathAssets>,
    /// Full URL of the highlight theme stylesheet.
    pub highlight_theme: Option<String>,
}

/// A page ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub head: Head,
    pub body: String,
}

impl RenderedPage {
    pub fn render(&self) -> Markup {
        base_document(&self.head, &self.body)
    }

    pub fn into_string(self) -> String {
        self.render().into_string()
    }
}

fn base_document(head: &Head, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (head_fragments(head))
            }
            body {
                (PreEscaped(body))
            }
        }
    }
}

fn head_fragments(head: &Head) -> Markup {
    html! {
        @if let Some(title) = &head.title {
            title { (title) }
        }
        @if let Some(href) = &head.stylesheet {
            link rel="stylesheet" href=(href);
        }
        @if let Some(math) = &head.math {
            link rel="stylesheet" href=(math.css) integrity=[math.integrity.as_deref()] crossorigin="anonymous";
            script defer src=(math.js) crossorigin="anonymous" {}
            script { (PreEscaped(KATEX_RENDER)) }
        }
        @if let Some(href) = &head.highlight_theme {
            link rel="stylesheet" href=(href);
        }
    }
}
