//! Per-document options block.
//!
//! A document may open with a block of `key = value` lines fenced by `%%`
//! marker lines:
//!
//! ```text
//! %%
//! title = Home
//! style = style.scss
//! math = yes
//! %%
//! # Markdown starts here
//! ```
//!
//! Parsing happens in two phases: [`split_block`] finds the marker lines and
//! separates the raw option lines from the body, then each line is split on
//! its first `=` into a trimmed key and value. Blank lines are skipped, later
//! keys overwrite earlier ones, and a non-blank line without `=` is an error.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const MARKER: &str = "%%";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    #[error("line {line}: expected `key = value`, found {text:?}")]
    Malformed { line: usize, text: String },
    #[error("options block opened with `%%` is never closed")]
    Unterminated,
}

/// Options parsed from a document's leading block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocumentOptions {
    values: BTreeMap<String, String>,
}

impl DocumentOptions {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw lookup. Empty values read as absent, matching how every
    /// recognized option treats them.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    /// Stylesheet path, relative to the document's directory.
    pub fn style(&self) -> Option<&str> {
        self.get("style")
    }

    pub fn math(&self) -> bool {
        self.get("math") == Some("yes")
    }

    /// Any `code` value turns on highlighting of fenced code blocks.
    pub fn code(&self) -> bool {
        self.get("code").is_some()
    }

    /// `code = yes` additionally links a highlight theme stylesheet.
    pub fn highlight_theme_linked(&self) -> bool {
        self.get("code") == Some("yes")
    }

    pub fn highlight(&self) -> Option<&str> {
        self.get("highlight")
    }

    /// Keys present in the block that no feature reads.
    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        const KNOWN: &[&str] = &["title", "style", "math", "code", "highlight"];
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| !KNOWN.contains(k))
    }

    fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DocumentOptions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A document split into its options and Markdown body.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedDocument<'a> {
    pub options: DocumentOptions,
    pub body: &'a str,
}

/// Parse the options block (if any) and return the remaining body.
pub fn parse(text: &str) -> Result<ParsedDocument<'_>, OptionsError> {
    let Some(block) = split_block(text)? else {
        return Ok(ParsedDocument {
            options: DocumentOptions::default(),
            body: text,
        });
    };

    let mut options = DocumentOptions::default();
    for (idx, raw) in block.lines.iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        // The opening marker is line 1.
        let line = idx + 2;
        let (key, value) = raw.split_once('=').ok_or_else(|| OptionsError::Malformed {
            line,
            text: raw.to_string(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(OptionsError::Malformed {
                line,
                text: raw.to_string(),
            });
        }
        options.insert(key, value.trim());
    }

    Ok(ParsedDocument {
        options,
        body: block.body,
    })
}

/// Raw option lines plus the body that follows the closing marker.
struct Block<'a> {
    lines: Vec<&'a str>,
    body: &'a str,
}

/// Phase one: locate the opening and closing marker lines.
///
/// Returns `None` when the text does not start with a marker line.
fn split_block(text: &str) -> Result<Option<Block<'_>>, OptionsError> {
    let Some(mut rest) = strip_marker_line(text) else {
        return Ok(None);
    };

    let mut lines = Vec::new();
    loop {
        if rest.is_empty() {
            return Err(OptionsError::Unterminated);
        }
        let (line, next) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line == MARKER {
            return Ok(Some(Block { lines, body: next }));
        }
        lines.push(line);
        rest = next;
    }
}

fn strip_marker_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(MARKER)?;
    rest.strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
}
