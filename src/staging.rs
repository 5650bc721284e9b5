//! Private staging and atomic replacement
//!
//! Compressed output is never written straight to its final location. It is
//! produced inside a private directory and moved into place only once it is
//! complete, so a reader of the destination sees either the old file or the
//! whole new one.

use crate::constants::STAGING_DIR_PREFIX;
use crate::error::{CompressionError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempDir};
use tracing::debug;

/// A private directory for one compression call, removed on drop
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Create a staging directory under `root`, or the OS temp dir when `None`
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let builder = {
            let mut builder = Builder::new();
            builder.prefix(STAGING_DIR_PREFIX);
            builder
        };
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)
                    .map_err(|_| CompressionError::DirectoryCreationFailed(root.to_path_buf()))?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a staged file named after `source`
    pub fn file_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "staged".into());
        self.dir.path().join(name)
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

/// Create the parent directory of `path` if it is missing
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|_| CompressionError::DirectoryCreationFailed(parent.to_path_buf()))?;
    }
    Ok(())
}

/// Move a fully written file to `destination`.
///
/// Missing parent directories are created and an existing destination is
/// overwritten, keeping its permission bits. A plain rename is tried first;
/// when that is impossible (different filesystems) the bytes are copied into
/// a temporary file next to the destination, synced, and renamed over it.
/// The destination is never observed half-written.
pub fn move_into_place(staged: &Path, destination: &Path) -> Result<()> {
    if !staged.is_file() {
        return Err(CompressionError::OutputNotProduced(staged.to_path_buf()));
    }
    ensure_parent_dir(destination)?;

    if let Ok(existing) = fs::metadata(destination) {
        fs::set_permissions(staged, existing.permissions())?;
    }

    match fs::rename(staged, destination) {
        Ok(()) => {
            debug!(from = %staged.display(), to = %destination.display(), "Renamed into place");
            Ok(())
        }
        Err(rename_err) => {
            debug!(
                from = %staged.display(),
                to = %destination.display(),
                error = %rename_err,
                "Rename failed, copying through a sibling temp file"
            );
            copy_into_place(staged, destination)?;
            fs::remove_file(staged)?;
            Ok(())
        }
    }
}

fn copy_into_place(staged: &Path, destination: &Path) -> Result<()> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut source = File::open(staged)?;
        io::copy(&mut source, tmp.as_file_mut())?;
    }
    tmp.as_file().set_permissions(fs::metadata(staged)?.permissions())?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

/// Remove a file that may or may not exist
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
