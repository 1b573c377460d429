//! Source tree discovery.
//!
//! Walks the source directory depth-first and classifies every file as a
//! [`FileKind::Document`] (`.md`) or a [`FileKind::Asset`] (everything
//! else). The `out` directory at the root and the site config file are never
//! part of the source set.
//!
//! [`classify`] is the single classification rule. The dev server's watcher
//! calls it for changed paths, so incremental rebuilds and full builds always
//! agree on what a file is.
//!
//! Entries are sorted by file name within each directory, so two walks over
//! the same tree yield the same order.

use crate::config::{self, ConfigError, SiteConfig};
use crate::mirror::{MirrorError, OutputTree};
use crate::types::{FileEntry, FileKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

/// An opened source tree: canonical root, output tree and configuration.
#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
    output: OutputTree,
    config: SiteConfig,
}

impl Site {
    /// Open a source directory.
    ///
    /// Fails fast when the directory is missing, loads `mdsite.toml` if
    /// present, and creates `<root>/out`.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        if !path.exists() {
            return Err(ScanError::InputNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(ScanError::NotADirectory(path.to_path_buf()));
        }
        let root = path.canonicalize()?;
        let config = config::load_config(&root)?;
        let output = OutputTree::new(&root);
        output.ensure_root()?;
        Ok(Self {
            root,
            output,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output(&self) -> &OutputTree {
        &self.output
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SiteConfig {
        &mut self.config
    }

    /// Whether a path belongs to the source set at all: inside the root,
    /// outside `out/`, and not the config file.
    pub fn is_source(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !self.output.contains(path)
            && path != self.root.join(config::CONFIG_FILE)
    }

    /// Classify a changed path, or `None` when it is not a source file.
    pub fn entry_for(&self, path: &Path) -> Option<FileEntry> {
        (self.is_source(path) && path.is_file()).then(|| FileEntry::new(path, classify(path)))
    }
}

/// The classification rule shared by full builds and watch rebuilds.
///
/// Extensions match case-sensitively: `README.MD` is an asset and is copied
/// unchanged.
pub fn classify(path: &Path) -> FileKind {
    let is_markdown = path.extension().is_some_and(|ext| ext == "md");
    if is_markdown {
        FileKind::Document
    } else {
        FileKind::Asset
    }
}

/// Result of walking the source tree, in walk order.
#[derive(Debug, Default)]
pub struct SourceFiles {
    pub documents: Vec<FileEntry>,
    pub assets: Vec<FileEntry>,
}

impl SourceFiles {
    pub fn len(&self) -> usize {
        self.documents.len() + self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Enumerate and classify every source file under the site root.
pub fn scan(site: &Site) -> Result<SourceFiles, ScanError> {
    let mut files = SourceFiles::default();

    let walker = WalkDir::new(site.root())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !site.output().contains(entry.path()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !site.is_source(entry.path()) {
            continue;
        }
        let file = FileEntry::new(entry.path(), classify(entry.path()));
        match file.kind {
            FileKind::Document => files.documents.push(file),
            FileKind::Asset => files.assets.push(file),
        }
    }

    tracing::debug!(
        documents = files.documents.len(),
        assets = files.assets.len(),
        "scanned source tree"
    );
    Ok(files)
}
