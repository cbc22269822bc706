use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use super::walk::walk;
use crate::config::{ArchiveOptions, ARCHIVE_DIR_NAME};
use crate::error::{Error, Result};

/// An immediate child directory of the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Display name. Lossy for names that are not valid UTF-8.
    pub name: String,
    /// Exact directory name, used to build artifact paths.
    pub file_name: OsString,
    pub path: PathBuf,
}

impl Candidate {
    /// `<file_name>.zip`, built without going through the display name.
    pub fn zip_file_name(&self) -> OsString {
        let mut zip_name = self.file_name.clone();
        zip_name.push(".zip");
        zip_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Newest entry is older than the cutoff.
    Stale,
    /// Archived regardless of age (`--all`).
    Forced,
    /// Modified within the window.
    Recent,
    /// The tree could not be fully read; the message names the cause.
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct CandidateStatus {
    pub candidate: Candidate,
    pub latest_modified: Option<SystemTime>,
    pub eligibility: Eligibility,
}

impl CandidateStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self.eligibility, Eligibility::Stale | Eligibility::Forced)
    }
}

/// Newest modification time of `path` and everything beneath it. Any entry
/// that cannot be read fails the whole call.
pub fn latest_mod_time(path: &Path) -> Result<SystemTime> {
    let mut latest = SystemTime::UNIX_EPOCH;
    for entry in walk(path) {
        let entry = entry?;
        if entry.modified > latest {
            latest = entry.modified;
        }
    }
    Ok(latest)
}

/// Immediate child directories of `root`, sorted by name, excluding `exclude_name`.
/// Symlinks to directories are not candidates.
pub fn list_candidates(root: &Path, exclude_name: &str) -> Result<Vec<Candidate>> {
    let entries = fs::read_dir(root).map_err(|err| Error::io(root, err))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(root, err))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| Error::io(&path, err))?;
        if !file_type.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        if file_name == *exclude_name {
            continue;
        }
        candidates.push(Candidate {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            path,
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}

/// Lists every candidate under the root and classifies it against the cutoff.
/// Only failing to list the root itself is an error.
pub fn scan_candidates(options: &ArchiveOptions, now: SystemTime) -> Result<Vec<CandidateStatus>> {
    let cutoff = options.cutoff(now);
    let candidates = list_candidates(&options.root, ARCHIVE_DIR_NAME)?;

    let statuses = candidates
        .into_iter()
        .map(|candidate| match latest_mod_time(&candidate.path) {
            Ok(latest) => {
                let eligibility = if options.archive_all {
                    Eligibility::Forced
                } else if latest < cutoff {
                    Eligibility::Stale
                } else {
                    Eligibility::Recent
                };
                debug!("{}: {:?}", candidate.path.display(), eligibility);
                CandidateStatus {
                    candidate,
                    latest_modified: Some(latest),
                    eligibility,
                }
            }
            Err(err) => {
                warn!("Skipping {}: {}", candidate.path.display(), err);
                CandidateStatus {
                    candidate,
                    latest_modified: None,
                    eligibility: Eligibility::Unreadable(err.to_string()),
                }
            }
        })
        .collect();

    Ok(statuses)
}
