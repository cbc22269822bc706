use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scanner::{walk, EntryKind};

/// Recursively replicates `src` into `dst`.
///
/// Regular files are streamed into new files, symlinks are recreated with the
/// same target string, and directories get their source permission bits once
/// everything inside them has been written. The first failure aborts the copy
/// and a partial `dst` is left for the caller to clean up.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let mut dir_permissions: Vec<(PathBuf, fs::Permissions)> = Vec::new();

    for entry in walk(src) {
        let entry = entry?;
        let target = dst.join(&entry.relative);

        match entry.kind {
            EntryKind::Dir => {
                fs::create_dir_all(&target).map_err(|err| Error::io(&target, err))?;
                dir_permissions.push((target, entry.metadata.permissions()));
            }
            EntryKind::File => {
                copy_file(&entry.path, &target)?;
                fs::set_permissions(&target, entry.metadata.permissions())
                    .map_err(|err| Error::io(&target, err))?;
            }
            EntryKind::Symlink => {
                let link = fs::read_link(&entry.path).map_err(|err| Error::io(&entry.path, err))?;
                make_symlink(&link, &target).map_err(|err| Error::io(&target, err))?;
            }
            EntryKind::Other => {
                debug!("Skipping special file {}", entry.path.display());
            }
        }
    }

    // Deepest first, so a read-only parent does not block its children.
    for (path, permissions) in dir_permissions.into_iter().rev() {
        fs::set_permissions(&path, permissions).map_err(|err| Error::io(&path, err))?;
    }

    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = File::open(src).map_err(|err| Error::io(src, err))?;
    let mut writer = File::create(dst).map_err(|err| Error::io(dst, err))?;
    io::copy(&mut reader, &mut writer).map_err(|err| Error::io(src, err))?;
    Ok(())
}

#[cfg(unix)]
fn make_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(windows)]
fn make_symlink(link: &Path, target: &Path) -> io::Result<()> {
    let resolved = target.parent().map(|p| p.join(link)).unwrap_or_else(|| link.to_path_buf());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(link, target)
    } else {
        std::os::windows::fs::symlink_file(link, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::size::directory_size;
    use tempfile::tempdir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/nested/data.bin"), vec![7u8; 4096]).unwrap();
    }

    #[test]
    fn test_copy_tree_duplicates_contents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);

        copy_tree(&src, &dst).unwrap();

        assert_eq!(directory_size(&src).unwrap(), directory_size(&dst).unwrap());
        assert_eq!(
            fs::read(dst.join("src/nested/data.bin")).unwrap(),
            vec![7u8; 4096]
        );
        assert_eq!(
            fs::read_to_string(dst.join("src/main.rs")).unwrap(),
            "fn main() {}\n"
        );
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_into_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);
        fs::create_dir(&dst).unwrap();

        copy_tree(&src, &dst).unwrap();
        assert!(dst.join("Cargo.toml").is_file());
    }

    #[test]
    fn test_missing_source_fails_with_path() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("missing");
        match copy_tree(&src, &dir.path().join("dst")) {
            Err(Error::Io { path, .. }) => assert_eq!(path, src),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_copied_as_links() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);
        std::os::unix::fs::symlink("src/main.rs", src.join("entry")).unwrap();
        std::os::unix::fs::symlink("/nowhere/at/all", src.join("dangling")).unwrap();

        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_link(dst.join("entry")).unwrap(), PathBuf::from("src/main.rs"));
        assert_eq!(
            fs::read_link(dst.join("dangling")).unwrap(),
            PathBuf::from("/nowhere/at/all")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        build_tree(&src);
        fs::set_permissions(src.join("src"), fs::Permissions::from_mode(0o750)).unwrap();

        copy_tree(&src, &dst).unwrap();

        let mode = fs::metadata(dst.join("src")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
