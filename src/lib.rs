//! # mdsite
//!
//! A small static site generator. Point it at a directory: Markdown files
//! become HTML pages, Sass stylesheets become CSS, and everything else is
//! copied as is into `<dir>/out`, mirroring the source layout.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan     <dir>/            →  documents + assets   (walk order, out/ excluded)
//! 2. Pages    *.md              →  out/**/*.html        (options block, markdown, template)
//! 3. Assets   *.scss, *.sass    →  out/**/*.css         (grass)
//!             everything else   →  out/**               (byte copy)
//! 4. Serve    out/              →  http://127.0.0.1:3000 (optional, with watcher)
//! ```
//!
//! A full build runs stages 1-3 once and returns a [`build::BuildSummary`].
//! In serve mode the watcher re-runs stage 2 or 3 for a single changed file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Opens the site root, walks it, and holds the shared `classify` rule |
//! | [`options`] | Parses the `%%` options block at the top of a document |
//! | [`markdown`] | pulldown-cmark rendering with math spans and syntect highlighting |
//! | [`template`] | Typed maud page skeleton with optional head slots |
//! | [`page`] | One document to one HTML file |
//! | [`asset`] | One asset to transpiled CSS or a byte copy |
//! | [`mirror`] | Source to output path mapping and atomic writes |
//! | [`build`] | Full builds and single-file rebuilds |
//! | [`serve`] | axum static server over `out/` and the notify watcher |
//! | [`config`] | Optional `mdsite.toml` loading and validation |
//! | [`output`] | Colored CLI output |
//! | [`types`] | `FileEntry` and `FileKind` |
//!
//! # Design Decisions
//!
//! ## Options Block, Not YAML Front Matter
//!
//! Documents carry a handful of `key = value` lines between two `%%` lines.
//! There is no nesting and no typing; every value is a string and the page
//! builder decides what it means. A line without `=` is an error that names
//! its line number, rather than something silently dropped.
//!
//! ## Typed Head Slots
//!
//! The page skeleton is maud markup with one optional slot per head fragment
//! (title, stylesheet, math, highlight theme). An unset slot emits nothing,
//! so there is no placeholder text that could leak into a page.
//!
//! ## Everything Is Returned, Nothing Is Counted Globally
//!
//! A build returns its summary. The watcher's rebuilds return what they
//! wrote. Neither touches shared counters, so a rebuild in serve mode cannot
//! skew the numbers printed for the initial build.
//!
//! ## Atomic Writes
//!
//! Output files are written to a temporary file in the destination directory
//! and renamed into place. The dev server never serves a half-written page.

pub mod asset;
pub mod build;
pub mod config;
pub mod markdown;
pub mod mirror;
pub mod options;
pub mod output;
pub mod page;
pub mod scan;
pub mod serve;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
