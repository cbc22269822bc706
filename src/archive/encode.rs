use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Component, Path};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::copy::copy_tree;
use super::staging::remove_tree;
use crate::error::{Error, Result};
use crate::scanner::walk;

/// Packs the regular files under `source_dir` into a deflate-compressed zip at
/// `archive_path`, one entry per file named by its forward-slash relative path.
///
/// The container is assembled in a temporary file beside `archive_path` and
/// renamed over it only once complete, so a failure never leaves a truncated
/// archive behind. An existing archive at the same path is replaced.
pub fn encode_zip(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let parent = archive_path.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(parent).map_err(|err| Error::io(parent, err))?;

    let mut zip = ZipWriter::new(BufWriter::new(temp));
    let mut names = HashSet::new();
    for entry in walk(source_dir) {
        let entry = entry?;
        if !entry.is_file() {
            if entry.is_symlink() {
                debug!("Not storing symlink {}", entry.path.display());
            }
            continue;
        }

        let name = entry_name(&entry.relative);
        if !names.insert(name.clone()) {
            return Err(Error::DuplicateEntry {
                path: archive_path.to_path_buf(),
                name,
            });
        }
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(entry.size >= u32::MAX as u64);
        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            options.unix_permissions(entry.metadata.permissions().mode())
        };

        zip.start_file(name, options)
            .map_err(|err| Error::zip(archive_path, err))?;
        let mut reader = File::open(&entry.path).map_err(|err| Error::io(&entry.path, err))?;
        io::copy(&mut reader, &mut zip).map_err(|err| Error::io(&entry.path, err))?;
    }

    let writer = zip.finish().map_err(|err| Error::zip(archive_path, err))?;
    let temp = writer
        .into_inner()
        .map_err(|err| Error::io(archive_path, err.into_error()))?;
    temp.persist(archive_path)
        .map_err(|err| Error::io(archive_path, err.error))?;

    Ok(())
}

/// Zip entry name for a relative path: components joined with `/`.
/// Names that are not valid UTF-8 are stored lossily.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Moves the staged directory to `dest_dir`, replacing whatever is there.
///
/// A rename is tried first; when it fails (e.g. across volumes) the tree is
/// copied instead and `source_dir` stays in place for the caller to clear.
pub fn relocate_or_copy(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    if fs::symlink_metadata(dest_dir).is_ok() {
        debug!("Replacing existing {}", dest_dir.display());
        remove_tree(dest_dir).map_err(|err| Error::io(dest_dir, err))?;
    }

    match fs::rename(source_dir, dest_dir) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(
                "Rename {} -> {} failed ({}), copying instead",
                source_dir.display(),
                dest_dir.display(),
                err
            );
            copy_tree(source_dir, dest_dir)
        }
    }
}
