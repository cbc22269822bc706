use crate::archive::{ArchivedCandidate, RunReport};
use crate::error::Error;
use crate::scanner::{Candidate, CandidateStatus};

/// Hooks for reporting archive progress.
///
/// The CLI renders these with indicatif and colored output. All methods have
/// default no-op implementations.
pub trait ProgressReporter {
    fn on_scan_complete(&self, _statuses: &[CandidateStatus]) {}
    fn on_candidate_start(&self, _candidate: &Candidate, _index: usize, _total: usize) {}
    fn on_candidate_archived(&self, _archived: &ArchivedCandidate) {}
    fn on_candidate_failed(&self, _candidate: &Candidate, _error: &Error) {}
    fn on_report(&self, _report: &RunReport) {}
    fn on_original_deleted(&self, _candidate: &Candidate) {}
    fn on_delete_failed(&self, _candidate: &Candidate, _error: &Error) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
