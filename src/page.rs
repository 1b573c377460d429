//! Document → HTML page.
//!
//! For one Markdown document:
//!
//! 1. read the source and split off its options block ([`crate::options`])
//! 2. check the referenced stylesheet exists
//! 3. convert the body ([`crate::markdown`]) with the features the options
//!    ask for
//! 4. fill the head slots and render the skeleton ([`crate::template`])
//! 5. write `<name>.html` into the mirrored output tree
//!
//! The stylesheet itself is transpiled by the asset copier when the walk
//! reaches it; the page only links to its `.css` name. A Sass partial
//! (`_name.scss`) is never emitted, so a page cannot use one as its
//! stylesheet.
//!
//! Pages are written exactly as maud renders them. There is no
//! pretty-printing pass; the markup is compact and identical between builds.

use crate::asset::{self, AssetKind};
use crate::config::CdnConfig;
use crate::markdown::{self, Features};
use crate::mirror::{self, MirrorError};
use crate::options::{self, DocumentOptions, OptionsError};
use crate::scan::Site;
use crate::template::{Head, MathAssets, RenderedPage};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid options in {path}: {source}")]
    Options {
        path: PathBuf,
        source: OptionsError,
    },
    #[error("stylesheet {style} referenced by {document} not found")]
    StylesheetNotFound { document: PathBuf, style: PathBuf },
    #[error("stylesheet {style} referenced by {document} is a sass partial and is never emitted")]
    StylesheetIsPartial { document: PathBuf, style: PathBuf },
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

/// Build one document into the output tree. Returns the written path.
pub fn build_page(site: &Site, source: &Path) -> Result<PathBuf, PageError> {
    tracing::info!(path = %source.display(), "processing document");

    let text = fs::read_to_string(source).map_err(|err| PageError::Read {
        path: source.to_path_buf(),
        source: err,
    })?;
    let parsed = options::parse(&text).map_err(|err| PageError::Options {
        path: source.to_path_buf(),
        source: err,
    })?;
    if !parsed.options.is_empty() {
        tracing::debug!(
            options = %serde_json::to_string(&parsed.options).unwrap_or_default(),
            "parsed options"
        );
    }
    for key in parsed.options.unrecognized() {
        tracing::debug!(key, "ignoring unrecognized option");
    }

    check_stylesheet(source, &parsed.options)?;

    let page = render_page(parsed.body, &parsed.options, &site.config().cdn);

    let target = site.output().output_path(source)?;
    site.output().write(&target, page.into_string().as_bytes())?;
    tracing::debug!(path = %target.display(), "wrote html file");
    Ok(target)
}

/// Convert a document body and fill the head slots from its options.
pub fn render_page(body: &str, options: &DocumentOptions, cdn: &CdnConfig) -> RenderedPage {
    let features = Features {
        math: options.math(),
        highlight: options.code(),
    };
    let html = markdown::to_html(body, features);

    let head = Head {
        title: options.title().map(str::to_string),
        stylesheet: options.style().map(mirror::stylesheet_href),
        math: features.math.then(|| MathAssets {
            css: cdn.katex_css.clone(),
            integrity: Some(cdn.katex_css_integrity.clone()).filter(|s| !s.is_empty()),
            js: cdn.katex_js.clone(),
        }),
        highlight_theme: options.highlight_theme_linked().then(|| {
            let theme = options.highlight().unwrap_or(&cdn.highlight_theme);
            cdn.highlight_theme_url(theme)
        }),
    };

    RenderedPage { head, body: html }
}

fn check_stylesheet(source: &Path, options: &DocumentOptions) -> Result<(), PageError> {
    let Some(style) = options.style() else {
        return Ok(());
    };
    let dir = source.parent().unwrap_or(Path::new(""));
    let style_path = dir.join(style);
    if !style_path.is_file() {
        return Err(PageError::StylesheetNotFound {
            document: source.to_path_buf(),
            style: style_path,
        });
    }
    if asset::asset_kind(&style_path) == AssetKind::SassPartial {
        return Err(PageError::StylesheetIsPartial {
            document: source.to_path_buf(),
            style: style_path,
        });
    }
    tracing::debug!(style, "imported styles");
    Ok(())
}
