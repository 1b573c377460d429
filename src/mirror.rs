//! The output tree: `<root>/out`, mirroring the source layout.
//!
//! ```text
//! site/                      site/out/
//! ├── index.md          →    ├── index.html
//! ├── style.scss        →    ├── style.css
//! ├── img.png           →    ├── img.png
//! └── docs/                  └── docs/
//!     └── guide.md      →        └── guide.html
//! ```
//!
//! Directories are created on demand right before the first write into
//! them, so the tree only contains directories that hold output. Writes go
//! to a temporary file in the destination directory and are renamed into
//! place, so a reader (the dev server) sees either the old file or the new
//! one, never a partial write.

use std::ffi::OsStr;
use std::fs::{Metadata, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the output directory under the source root.
pub const OUT_DIR: &str = "out";

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("cannot create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not inside the source tree")]
    OutsideSource(PathBuf),
}

/// Maps source paths to their mirrored output paths.
#[derive(Debug, Clone)]
pub struct OutputTree {
    source_root: PathBuf,
    out_dir: PathBuf,
}

impl OutputTree {
    pub fn new(source_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            out_dir: source_root.join(OUT_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.out_dir
    }

    /// Whether `path` lies inside the output tree.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.out_dir)
    }

    /// Output path for a source file, with its extension rewritten per
    /// [`output_extension`].
    pub fn output_path(&self, source: &Path) -> Result<PathBuf, MirrorError> {
        let relative = source
            .strip_prefix(&self.source_root)
            .map_err(|_| MirrorError::OutsideSource(source.to_path_buf()))?;
        let mut target = self.out_dir.join(relative);
        if let Some(ext) = source.extension().and_then(output_extension) {
            target.set_extension(ext);
        }
        Ok(target)
    }

    /// Create the output directory itself. Already existing is fine.
    pub fn ensure_root(&self) -> Result<(), MirrorError> {
        create_dir(&self.out_dir)
    }

    /// Write generated `contents` to `target`, creating parent directories
    /// first. The file gets the usual `0644` mode on Unix.
    pub fn write(&self, target: &Path, contents: &[u8]) -> Result<(), MirrorError> {
        self.write_with_permissions(target, contents, generated_permissions())
    }

    /// Like [`write`](Self::write), with explicit permissions for the
    /// written file. `None` keeps whatever the platform gives a new file.
    pub fn write_with_permissions(
        &self,
        target: &Path,
        contents: &[u8],
        permissions: Option<Permissions>,
    ) -> Result<(), MirrorError> {
        let dir = target
            .parent()
            .ok_or_else(|| MirrorError::OutsideSource(target.to_path_buf()))?;
        ensure_dir(dir)?;
        write_atomic(dir, target, contents, permissions).map_err(|source| MirrorError::Write {
            path: target.to_path_buf(),
            source,
        })
    }
}

/// Extension a generated file gets, when it differs from its source.
pub fn output_extension(source_ext: &OsStr) -> Option<&'static str> {
    let ext = source_ext.to_str()?;
    match ext {
        "md" => Some("html"),
        "scss" | "sass" => Some("css"),
        _ => None,
    }
}

/// Rewrite a stylesheet reference the way the output tree renames it:
/// `theme.scss` → `theme.css`, `plain.css` unchanged.
pub fn stylesheet_href(style: &str) -> String {
    let path = Path::new(style);
    match path.extension().and_then(output_extension) {
        Some("css") => path.with_extension("css").to_string_lossy().into_owned(),
        _ => style.to_string(),
    }
}

fn ensure_dir(dir: &Path) -> Result<(), MirrorError> {
    if dir.is_dir() {
        return Ok(());
    }
    create_dir(dir)?;
    tracing::debug!(path = %dir.display(), "created directory");
    Ok(())
}

fn create_dir(dir: &Path) -> Result<(), MirrorError> {
    std::fs::create_dir_all(dir).map_err(|source| MirrorError::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// Permissions a byte-for-byte copy takes over from its source. Only Unix
/// modes are carried; elsewhere the copy is a plain new file.
pub fn copied_permissions(source: &Metadata) -> Option<Permissions> {
    cfg!(unix).then(|| source.permissions())
}

#[cfg(unix)]
fn generated_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn generated_permissions() -> Option<Permissions> {
    None
}

// Temp files start out owner-only, so the final mode is set before the
// rename makes the file visible.
fn write_atomic(
    dir: &Path,
    target: &Path,
    contents: &[u8],
    permissions: Option<Permissions>,
) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".mdsite-")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}
