//! CLI output formatting.
//!
//! Every message is a [`Line`]: a label and the text after it. `format_*`
//! functions build lines and are pure, so tests compare their plain-text
//! rendering. [`Output`] is the only place that touches the terminal; it
//! colors the label and writes to stderr.
//!
//! ```text
//! mdsite v0.4.0
//! base directory: /home/me/site
//! done! generated 2 static files
//! done! copied 4 static assets
//! done! site generated in /home/me/site/out
//! done! in 0.04 seconds
//! done! server running at http://127.0.0.1:3000
//! done! watching for file changes
//! ```
//!
//! Per-file progress goes through `tracing`, not through this module.

use crate::build::{BuildError, BuildSummary};
use console::{Style, Term};
use std::fmt;
use std::path::Path;

/// Leading label of an output line; decides its color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Product name in the banner (green).
    Banner,
    /// `done!` (green).
    Done,
    /// A `name:` prefix (cyan).
    Field(&'static str),
    /// `warning:` (yellow).
    Warning,
    /// `error[category]:` (red).
    Error(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub label: Label,
    pub text: String,
}

impl Line {
    fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }

    fn label_text(&self) -> String {
        match &self.label {
            Label::Banner => "mdsite".to_string(),
            Label::Done => "done!".to_string(),
            Label::Field(name) => format!("{name}:"),
            Label::Warning => "warning:".to_string(),
            Label::Error(category) => format!("error[{category}]:"),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label_text(), self.text)
    }
}

// ============================================================================
// Formatters
// ============================================================================

pub fn format_banner(version: &str, root: &Path) -> Vec<Line> {
    vec![
        Line::new(Label::Banner, format!("v{version}")),
        Line::new(Label::Field("base directory"), root.display().to_string()),
    ]
}

/// Summary of a full build. Failures recorded under `keep_going` are listed
/// after the counts, each with its category.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<Line> {
    let mut lines = vec![
        Line::new(
            Label::Done,
            format!("generated {} static files", summary.documents),
        ),
        Line::new(
            Label::Done,
            format!("copied {} static assets", summary.assets),
        ),
        Line::new(
            Label::Done,
            format!("site generated in {}", summary.out_dir.display()),
        ),
        Line::new(
            Label::Done,
            format!("in {:.2} seconds", summary.elapsed.as_secs_f64()),
        ),
    ];

    if summary.skipped > 0 {
        lines.push(Line::new(
            Label::Field("skipped"),
            format!("{} sass partials", summary.skipped),
        ));
    }

    for failure in &summary.failures {
        lines.push(Line::new(
            Label::Error(failure.error.category()),
            failure.error.to_string(),
        ));
    }
    if !summary.failures.is_empty() {
        lines.push(Line::new(
            Label::Warning,
            format!("{} files failed to build", summary.failures.len()),
        ));
    }
    lines
}

pub fn format_build_error(err: &BuildError) -> Line {
    Line::new(Label::Error(err.category()), err.to_string())
}

pub fn format_server_started(host: &str, port: u16) -> Vec<Line> {
    vec![
        Line::new(
            Label::Done,
            format!("server running at http://{host}:{port}"),
        ),
        Line::new(Label::Done, "watching for file changes"),
    ]
}

// ============================================================================
// Terminal
// ============================================================================

/// Colored terminal writer.
pub struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan: Style,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red().bold(),
            cyan: Style::new().cyan(),
        }
    }

    pub fn line(&self, line: &Line) {
        let style = match line.label {
            Label::Banner | Label::Done => &self.green,
            Label::Field(_) => &self.cyan,
            Label::Warning => &self.yellow,
            Label::Error(_) => &self.red,
        };
        let label = style.apply_to(line.label_text());
        let _ = self.term.write_line(&format!("{label} {}", line.text));
    }

    pub fn lines(&self, lines: &[Line]) {
        for line in lines {
            self.line(line);
        }
    }

    /// An error outside the build taxonomy (CLI, config, server).
    pub fn error(&self, msg: &str) {
        let label = self.red.apply_to("error:");
        let _ = self.term.write_line(&format!("{label} {msg}"));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Failure;
    use crate::options::OptionsError;
    use crate::page::PageError;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::Duration;

    fn render(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::to_string).collect()
    }

    fn summary() -> BuildSummary {
        BuildSummary {
            documents: 2,
            assets: 4,
            skipped: 0,
            failures: Vec::new(),
            out_dir: PathBuf::from("/site/out"),
            elapsed: Duration::from_millis(1234),
        }
    }

    #[test]
    fn banner_lines() {
        assert_eq!(
            render(&format_banner("1.2.3", Path::new("/site"))),
            vec!["mdsite v1.2.3", "base directory: /site"]
        );
    }

    #[test]
    fn summary_lines() {
        assert_eq!(
            render(&format_build_summary(&summary())),
            vec![
                "done! generated 2 static files",
                "done! copied 4 static assets",
                "done! site generated in /site/out",
                "done! in 1.23 seconds",
            ]
        );
    }

    #[test]
    fn summary_mentions_skipped_partials() {
        let summary = BuildSummary {
            skipped: 1,
            ..summary()
        };
        let lines = render(&format_build_summary(&summary));
        assert_eq!(lines.last().unwrap(), "skipped: 1 sass partials");
    }

    #[test]
    fn summary_lists_failures_with_category() {
        let summary = BuildSummary {
            failures: vec![Failure {
                path: PathBuf::from("/site/a.md"),
                error: PageError::Options {
                    path: PathBuf::from("/site/a.md"),
                    source: OptionsError::Unterminated,
                }
                .into(),
            }],
            ..summary()
        };

        let lines = format_build_summary(&summary);

        assert_eq!(lines[4].label, Label::Error("option-parse"));
        assert!(lines[4].text.contains("/site/a.md"));
        assert_eq!(lines[5].to_string(), "warning: 1 files failed to build");
    }

    #[test]
    fn build_error_line_is_categorized() {
        let err: BuildError = PageError::StylesheetNotFound {
            document: PathBuf::from("/site/index.md"),
            style: PathBuf::from("/site/nope.scss"),
        }
        .into();

        let line = format_build_error(&err);

        assert!(
            line.to_string()
                .starts_with("error[stylesheet-not-found]: stylesheet /site/nope.scss")
        );
    }

    #[test]
    fn server_lines() {
        assert_eq!(
            render(&format_server_started("127.0.0.1", 3000)),
            vec![
                "done! server running at http://127.0.0.1:3000",
                "done! watching for file changes",
            ]
        );
    }
}
