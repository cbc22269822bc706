use std::path::Path;

use crate::error::Result;
use crate::scanner::walk;

/// Total bytes of the regular files under `path`. Directories and symlinks
/// contribute nothing.
pub fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in walk(path) {
        let entry = entry?;
        if entry.is_file() {
            total += entry.size;
        }
    }
    Ok(total)
}
