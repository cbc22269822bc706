use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Symlink,
    Other,
}

/// One filesystem entry seen during a walk. Metadata is read with lstat, so a
/// symlink describes the link itself rather than its target.
#[derive(Debug, Clone)]
pub struct FsEntry {
    pub path: PathBuf,
    /// Path relative to the walk root. Empty for the root itself.
    pub relative: PathBuf,
    pub depth: usize,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: SystemTime,
    pub metadata: Metadata,
}

impl FsEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Lazy, depth-first walk over `root` and everything below it, in file name
/// order. Links are never followed.
pub struct EntryWalker {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

pub fn walk(root: &Path) -> EntryWalker {
    EntryWalker {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
    }
}

impl EntryWalker {
    /// Stop descending into the directory most recently yielded.
    pub fn skip_current_dir(&mut self) {
        self.inner.skip_current_dir();
    }

    fn to_entry(&self, entry: walkdir::DirEntry) -> Result<FsEntry> {
        let path = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(|err| {
            let path = err.path().unwrap_or(entry.path()).to_path_buf();
            Error::io(path, io::Error::from(err))
        })?;
        let modified = metadata
            .modified()
            .map_err(|err| Error::io(&path, err))?;

        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        let relative = path
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(FsEntry {
            size: metadata.len(),
            depth: entry.depth(),
            path,
            relative,
            kind,
            modified,
            metadata,
        })
    }
}

impl Iterator for EntryWalker {
    type Item = Result<FsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next()?;
        Some(match next {
            Ok(entry) => self.to_entry(entry),
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                Err(Error::io(path, io::Error::from(err)))
            }
        })
    }
}
