//! Shared types used across the build pipeline.
//!
//! A [`FileEntry`] is produced once per walk (or once per watch event) and
//! handed to either the page builder or the asset copier depending on its
//! [`FileKind`].

use std::path::{Path, PathBuf};

/// How a source file is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A Markdown document (`.md`), rendered to `.html`.
    Document,
    /// Anything else: stylesheets are transpiled, the rest copied verbatim.
    Asset,
}

/// An absolute source path plus its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub kind: FileKind,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_document(&self) -> bool {
        self.kind == FileKind::Document
    }
}
