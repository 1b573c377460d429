//! Build orchestration.
//!
//! A full pass walks the source tree once, builds every document, then
//! mirrors every asset, in walk order and one file at a time. The pass
//! returns a [`BuildSummary`] by value; nothing is counted in shared state.
//!
//! By default the first failing file aborts the pass. With `keep_going` the
//! failure is recorded and the pass moves on; [`BuildSummary::is_success`]
//! tells a caller whether every file built.
//!
//! [`rebuild`] is the incremental path used by the watcher: it processes one
//! changed file and nothing else.

use crate::asset::{self, AssetError, AssetKind, AssetOutcome};
use crate::mirror::MirrorError;
use crate::page::{self, PageError};
use crate::scan::{self, ScanError, Site};
use crate::types::{FileEntry, FileKind};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl BuildError {
    /// Short category label for operator-facing messages.
    pub fn category(&self) -> &'static str {
        match self {
            BuildError::Scan(ScanError::InputNotFound(_) | ScanError::NotADirectory(_)) => {
                "input-not-found"
            }
            BuildError::Scan(ScanError::Config(_)) => "config",
            BuildError::Scan(ScanError::Mirror(err))
            | BuildError::Page(PageError::Mirror(err))
            | BuildError::Asset(AssetError::Mirror(err)) => mirror_category(err),
            BuildError::Scan(_) => "io",
            BuildError::Page(PageError::Options { .. }) => "option-parse",
            BuildError::Page(PageError::StylesheetNotFound { .. }) => "stylesheet-not-found",
            BuildError::Page(PageError::StylesheetIsPartial { .. }) => "stylesheet-partial",
            BuildError::Page(PageError::Read { .. }) => "io",
            BuildError::Asset(AssetError::Transpile { .. }) => "stylesheet-transpile",
            BuildError::Asset(AssetError::Copy { .. }) => "asset-io",
        }
    }
}

fn mirror_category(err: &MirrorError) -> &'static str {
    match err {
        MirrorError::DirectoryCreate { .. } => "directory-create",
        MirrorError::Write { .. } | MirrorError::OutsideSource(_) => "asset-io",
    }
}

/// Knobs for a full build pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Record failures and continue instead of stopping at the first one.
    pub keep_going: bool,
}

/// A file that failed during a `keep_going` pass.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: BuildError,
}

/// Outcome of a full build pass.
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Documents rendered to HTML.
    pub documents: usize,
    /// Assets copied or transpiled.
    pub assets: usize,
    /// Sass partials, which are not emitted.
    pub skipped: usize,
    pub failures: Vec<Failure>,
    pub out_dir: PathBuf,
    pub elapsed: Duration,
}

impl BuildSummary {
    /// True when every file built.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the whole site: every document, then every asset.
pub fn build_site(site: &Site, options: BuildOptions) -> Result<BuildSummary, BuildError> {
    let start = Instant::now();
    let files = scan::scan(site)?;

    let mut summary = BuildSummary {
        out_dir: site.output().root().to_path_buf(),
        ..BuildSummary::default()
    };

    for entry in files.documents.iter().chain(&files.assets) {
        match build_entry(site, entry) {
            Ok(Built::Document) => summary.documents += 1,
            Ok(Built::Asset) => summary.assets += 1,
            Ok(Built::Skipped) => summary.skipped += 1,
            Err(error) if options.keep_going => {
                tracing::warn!(path = %entry.path.display(), %error, "build failed, continuing");
                summary.failures.push(Failure {
                    path: entry.path.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    summary.elapsed = start.elapsed();
    tracing::debug!(
        documents = summary.documents,
        assets = summary.assets,
        failures = summary.failures.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "build finished"
    );
    Ok(summary)
}

enum Built {
    Document,
    Asset,
    Skipped,
}

fn build_entry(site: &Site, entry: &FileEntry) -> Result<Built, BuildError> {
    match entry.kind {
        FileKind::Document => {
            page::build_page(site, &entry.path)?;
            Ok(Built::Document)
        }
        FileKind::Asset => match asset::copy_asset(site, &entry.path)? {
            AssetOutcome::Skipped => Ok(Built::Skipped),
            AssetOutcome::Copied(_) | AssetOutcome::Transpiled(_) => Ok(Built::Asset),
        },
    }
}

/// Files written by one incremental rebuild.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Rebuilt {
    pub outputs: Vec<PathBuf>,
}

/// Rebuild a single changed file.
///
/// A changed Sass partial is never emitted itself, so every stylesheet in the
/// tree is recompiled instead; any of them may import it.
pub fn rebuild(site: &Site, entry: &FileEntry) -> Result<Rebuilt, BuildError> {
    let mut rebuilt = Rebuilt::default();
    match entry.kind {
        FileKind::Document => {
            rebuilt.outputs.push(page::build_page(site, &entry.path)?);
        }
        FileKind::Asset if asset::asset_kind(&entry.path) == AssetKind::SassPartial => {
            let files = scan::scan(site)?;
            let stylesheets = files
                .assets
                .iter()
                .filter(|a| asset::asset_kind(&a.path) == AssetKind::Stylesheet);
            for stylesheet in stylesheets {
                if let AssetOutcome::Transpiled(target) = asset::copy_asset(site, &stylesheet.path)? {
                    rebuilt.outputs.push(target);
                }
            }
        }
        FileKind::Asset => match asset::copy_asset(site, &entry.path)? {
            AssetOutcome::Copied(target) | AssetOutcome::Transpiled(target) => {
                rebuilt.outputs.push(target);
            }
            AssetOutcome::Skipped => {}
        },
    }
    Ok(rebuilt)
}
