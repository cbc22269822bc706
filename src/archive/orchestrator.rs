use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

use super::copy::copy_tree;
use super::encode::{encode_zip, relocate_or_copy};
use super::prune::prune_named;
use super::size::directory_size;
use super::staging::StagingArea;
use crate::config::{ArchiveOptions, STAGING_DIR_NAME};
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::prompt::Confirm;
use crate::scanner::{scan_candidates, Candidate, CandidateStatus};
use crate::stats::{percent_saved, RunStats, StatsTimer};

pub const PROCEED_PROMPT: &str = "Proceed with archiving?";
pub const DELETE_PROMPT: &str = "Delete original directories?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was eligible; no prompt was shown and nothing was written.
    NothingToArchive,
    Completed,
}

#[derive(Debug, Clone)]
pub struct ArchivedCandidate {
    pub candidate: Candidate,
    /// `<archive>/<name>.zip` or `<archive>/<name>`.
    pub artifact: PathBuf,
    pub original_bytes: u64,
    pub archived_bytes: u64,
}

impl ArchivedCandidate {
    pub fn percent_saved(&self) -> f64 {
        percent_saved(self.original_bytes, self.archived_bytes)
    }
}

#[derive(Debug, Clone)]
pub struct FailedCandidate {
    pub candidate: Candidate,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every top-level directory found, eligible or not.
    pub candidates: Vec<CandidateStatus>,
    pub archived: Vec<ArchivedCandidate>,
    pub failed: Vec<FailedCandidate>,
    pub deleted: Vec<Candidate>,
    pub deletion_failures: Vec<FailedCandidate>,
    pub stats: RunStats,
    pub elapsed: Duration,
}

impl RunReport {
    fn new(outcome: RunOutcome, candidates: Vec<CandidateStatus>) -> Self {
        Self {
            outcome,
            candidates,
            archived: Vec::new(),
            failed: Vec::new(),
            deleted: Vec::new(),
            deletion_failures: Vec::new(),
            stats: RunStats::default(),
            elapsed: Duration::ZERO,
        }
    }

    /// Candidates that were not archived, for whatever reason.
    pub fn skipped(&self) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .map(|status| &status.candidate)
            .filter(|candidate| {
                !self
                    .archived
                    .iter()
                    .any(|archived| &archived.candidate == *candidate)
            })
            .collect()
    }

    /// Candidates that were never attempted: ineligible or unreadable.
    pub fn not_attempted(&self) -> Vec<&Candidate> {
        self.skipped()
            .into_iter()
            .filter(|candidate| {
                !self
                    .failed
                    .iter()
                    .any(|failed| &failed.candidate == *candidate)
            })
            .collect()
    }
}

/// Runs the scan → confirm → archive → report → delete pipeline for one root.
pub struct Archiver {
    options: ArchiveOptions,
    now: SystemTime,
}

impl Archiver {
    pub fn new(options: ArchiveOptions) -> Self {
        Self {
            options,
            now: SystemTime::now(),
        }
    }

    /// Reference time for the staleness cutoff.
    pub fn with_now(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }

    /// Candidates are processed one at a time through a single staging area.
    /// Per-candidate failures are reported and skipped; only an unreadable
    /// root, an unusable archive directory, or a declined first prompt end
    /// the run with an error.
    pub fn run(
        &self,
        confirm: &mut dyn Confirm,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunReport> {
        let mut timer = StatsTimer::new();

        info!("Scanning {}", self.options.root.display());
        let statuses = scan_candidates(&self.options, self.now)?;
        reporter.on_scan_complete(&statuses);

        let eligible: Vec<Candidate> = statuses
            .iter()
            .filter(|status| status.is_eligible())
            .map(|status| status.candidate.clone())
            .collect();

        if eligible.is_empty() {
            info!("No directories to archive");
            let mut report = RunReport::new(RunOutcome::NothingToArchive, statuses);
            report.elapsed = timer.finish();
            reporter.on_report(&report);
            return Ok(report);
        }

        if !confirm.confirm(PROCEED_PROMPT) {
            return Err(Error::UserAborted);
        }

        let archive_root = self.options.archive_root();
        fs::create_dir_all(&archive_root).map_err(|err| Error::io(&archive_root, err))?;

        let mut report = RunReport::new(RunOutcome::Completed, statuses);
        let staging = StagingArea::create(self.options.staging_dir())?;

        for (index, candidate) in eligible.iter().enumerate() {
            reporter.on_candidate_start(candidate, index, eligible.len());

            let result = self.archive_candidate(candidate, &staging);
            // The staging area must be empty again before the next copy.
            staging.reset()?;

            match result {
                Ok(archived) => {
                    info!(
                        "Archived {} -> {}",
                        candidate.path.display(),
                        archived.artifact.display()
                    );
                    report
                        .stats
                        .record(archived.original_bytes, archived.archived_bytes);
                    reporter.on_candidate_archived(&archived);
                    report.archived.push(archived);
                }
                Err(err) => {
                    error!("Failed to archive {}: {}", candidate.path.display(), err);
                    reporter.on_candidate_failed(candidate, &err);
                    report.failed.push(FailedCandidate {
                        candidate: candidate.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        drop(staging);

        report.elapsed = timer.finish();
        info!(
            "Archived {} of {} directories in {}: {}",
            report.archived.len(),
            eligible.len(),
            timer.get_duration_human(),
            report.stats.summary()
        );
        reporter.on_report(&report);

        if !report.archived.is_empty() && confirm.confirm(DELETE_PROMPT) {
            self.delete_originals(&mut report, reporter);
        }

        Ok(report)
    }

    fn archive_candidate(
        &self,
        candidate: &Candidate,
        staging: &StagingArea,
    ) -> Result<ArchivedCandidate> {
        let archive_root = self.options.archive_root();
        if !self.options.use_zip && candidate.file_name == *STAGING_DIR_NAME {
            return Err(Error::ReservedArtifact {
                path: archive_root.join(&candidate.file_name),
            });
        }

        debug!("Staging {}", candidate.path.display());
        copy_tree(&candidate.path, staging.path())?;

        let original_bytes = directory_size(staging.path()).unwrap_or_else(|err| {
            warn!("Could not measure {}: {}", candidate.path.display(), err);
            0
        });

        if self.options.remove_dependency_caches {
            for name in &self.options.dependency_cache_names {
                let removed = prune_named(staging.path(), name)?;
                if !removed.is_empty() {
                    info!(
                        "Removed {} {} director{} from {}",
                        removed.len(),
                        name,
                        if removed.len() == 1 { "y" } else { "ies" },
                        candidate.name
                    );
                }
            }
        }

        let artifact = if self.options.use_zip {
            let artifact = archive_root.join(candidate.zip_file_name());
            debug!("Zipping {} -> {}", candidate.name, artifact.display());
            encode_zip(staging.path(), &artifact)?;
            artifact
        } else {
            let artifact = archive_root.join(&candidate.file_name);
            debug!("Moving {} -> {}", candidate.name, artifact.display());
            relocate_or_copy(staging.path(), &artifact)?;
            artifact
        };

        let measured = if self.options.use_zip {
            fs::metadata(&artifact)
                .map(|metadata| metadata.len())
                .map_err(|err| Error::io(&artifact, err))
        } else {
            directory_size(&artifact)
        };
        let archived_bytes = measured.unwrap_or_else(|err| {
            warn!("Could not measure {}: {}", artifact.display(), err);
            0
        });

        Ok(ArchivedCandidate {
            candidate: candidate.clone(),
            artifact,
            original_bytes,
            archived_bytes,
        })
    }

    fn delete_originals(&self, report: &mut RunReport, reporter: &dyn ProgressReporter) {
        let candidates: Vec<Candidate> = report
            .archived
            .iter()
            .map(|archived| archived.candidate.clone())
            .collect();

        for candidate in candidates {
            match fs::remove_dir_all(&candidate.path) {
                Ok(()) => {
                    info!("Deleted {}", candidate.path.display());
                    reporter.on_original_deleted(&candidate);
                    report.deleted.push(candidate);
                }
                Err(err) => {
                    let err = Error::io(&candidate.path, err);
                    error!("Failed to delete {}: {}", candidate.path.display(), err);
                    reporter.on_delete_failed(&candidate, &err);
                    report.deletion_failures.push(FailedCandidate {
                        candidate,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}
