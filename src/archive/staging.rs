use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Scratch directory that each candidate is copied into before encoding.
///
/// Only one run may own a given staging path at a time. The directory is
/// removed when the value is dropped.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    /// Creates the staging directory, discarding anything a previous run left behind.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let staging = Self { path: path.into() };
        staging.reset()?;
        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empties the staging directory, recreating it if it was moved away.
    pub fn reset(&self) -> Result<()> {
        if fs::symlink_metadata(&self.path).is_ok() {
            remove_tree(&self.path).map_err(|err| Error::io(&self.path, err))?;
        }
        fs::create_dir_all(&self.path).map_err(|err| Error::io(&self.path, err))?;
        debug!("Staging area ready at {}", self.path.display());
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if fs::symlink_metadata(&self.path).is_err() {
            return;
        }
        if let Err(err) = remove_tree(&self.path) {
            warn!(
                "Failed to remove staging area {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

/// `remove_dir_all`, retried once after making every directory involved
/// writable. Staged copies keep their source permissions, read-only
/// directories included. A read-only parent gets its mode back afterwards.
pub(super) fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            for entry in WalkDir::new(path).follow_links(false).into_iter().flatten() {
                if entry.file_type().is_dir() {
                    let _ = unlock_dir(entry.path());
                }
            }

            let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
            let parent_mode = match parent {
                Some(parent) => unlock_dir(parent).ok(),
                None => None,
            };

            let result = fs::remove_dir_all(path);
            if let (Some(parent), Some(permissions)) = (parent, parent_mode) {
                if let Err(err) = fs::set_permissions(parent, permissions) {
                    warn!("Could not restore permissions on {}: {}", parent.display(), err);
                }
            }
            result
        }
        other => other,
    }
}

/// Makes `dir` owner-writable, returning the permissions it had before.
fn unlock_dir(dir: &Path) -> io::Result<fs::Permissions> {
    let original = fs::symlink_metadata(dir)?.permissions();
    let mut permissions = original.clone();
    make_writable(&mut permissions);
    fs::set_permissions(dir, permissions)?;
    Ok(original)
}

#[cfg(unix)]
fn make_writable(permissions: &mut fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() | 0o700);
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(permissions: &mut fs::Permissions) {
    permissions.set_readonly(false);
}
