//! Non-document files → output tree.
//!
//! Sass sources (`.scss`, `.sass`) are compiled with
//! [grass](https://docs.rs/grass) and written with a `.css` extension;
//! `@import`/`@use` resolve relative to the stylesheet. Partials (file name
//! starting with `_`) only exist to be imported and are not emitted.
//! Everything else is copied byte for byte.

use crate::mirror::{self, MirrorError};
use crate::scan::Site;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("{}", transpile_message(.path, .line, .message))]
    Transpile {
        path: PathBuf,
        /// 1-based line of the offending source, when the compiler knows it.
        line: Option<usize>,
        message: String,
    },
    #[error("cannot copy {path}: {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

fn transpile_message(path: &Path, line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!(
            "transpiling styles {} (line {line}): {message}",
            path.display()
        ),
        None => format!("transpiling styles {}: {message}", path.display()),
    }
}

/// How the copier treats an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Sass source compiled to CSS.
    Stylesheet,
    /// `_name.scss`: import-only, never emitted.
    SassPartial,
    /// Copied unchanged.
    Plain,
}

pub fn asset_kind(path: &Path) -> AssetKind {
    let is_sass = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "scss" || e == "sass");
    if !is_sass {
        return AssetKind::Plain;
    }
    let is_partial = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'));
    if is_partial {
        AssetKind::SassPartial
    } else {
        AssetKind::Stylesheet
    }
}

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    Copied(PathBuf),
    Transpiled(PathBuf),
    Skipped,
}

/// Mirror one asset into the output tree.
pub fn copy_asset(site: &Site, source: &Path) -> Result<AssetOutcome, AssetError> {
    tracing::info!(path = %source.display(), "processing asset");

    match asset_kind(source) {
        AssetKind::SassPartial => {
            tracing::debug!(path = %source.display(), "skipped sass partial");
            Ok(AssetOutcome::Skipped)
        }
        AssetKind::Stylesheet => {
            let css = compile_stylesheet(source)?;
            let target = site.output().output_path(source)?;
            site.output().write(&target, css.as_bytes())?;
            tracing::debug!(path = %target.display(), "transpiled styles");
            Ok(AssetOutcome::Transpiled(target))
        }
        AssetKind::Plain => {
            let copy_error = |err: std::io::Error| AssetError::Copy {
                path: source.to_path_buf(),
                source: err,
            };
            let bytes = fs::read(source).map_err(copy_error)?;
            let metadata = fs::metadata(source).map_err(copy_error)?;
            let target = site.output().output_path(source)?;
            site.output().write_with_permissions(
                &target,
                &bytes,
                mirror::copied_permissions(&metadata),
            )?;
            tracing::debug!(path = %target.display(), "copied asset");
            Ok(AssetOutcome::Copied(target))
        }
    }
}

/// Compile a Sass source to CSS. The syntax follows the file extension.
pub fn compile_stylesheet(source: &Path) -> Result<String, AssetError> {
    let options = grass::Options::default();
    grass::from_path(source, &options).map_err(|err| transpile_error(source, *err))
}

fn transpile_error(source: &Path, err: grass::Error) -> AssetError {
    match err.kind() {
        grass::ErrorKind::ParseError { message, loc, .. } => AssetError::Transpile {
            path: source.to_path_buf(),
            line: Some(loc.begin.line + 1),
            message,
        },
        grass::ErrorKind::IoError(io) => AssetError::Copy {
            path: source.to_path_buf(),
            source: std::io::Error::new(io.kind(), io.to_string()),
        },
        grass::ErrorKind::FromUtf8Error(message) => AssetError::Transpile {
            path: source.to_path_buf(),
            line: None,
            message,
        },
        _ => AssetError::Transpile {
            path: source.to_path_buf(),
            line: None,
            message: "unknown compiler error".to_string(),
        },
    }
}
