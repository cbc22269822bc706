use std::path::{Path, PathBuf};
use tracing::debug;

use super::staging::remove_tree;
use crate::error::{Error, Result};
use crate::scanner::walk;

/// Deletes every directory under `root` named exactly `target_name`, without
/// descending into the ones it removes. Stops at the first failure.
///
/// Returns the removed directories in walk order.
pub fn prune_named(root: &Path, target_name: &str) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut walker = walk(root);

    while let Some(entry) = walker.next() {
        let entry = entry?;
        if entry.depth == 0 || !entry.is_dir() || entry.file_name() != Some(target_name) {
            continue;
        }

        walker.skip_current_dir();
        remove_tree(&entry.path).map_err(|err| Error::io(&entry.path, err))?;
        debug!("Removed {}", entry.path.display());
        removed.push(entry.path);
    }

    Ok(removed)
}
