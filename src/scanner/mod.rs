mod candidates;
pub mod walk;

pub use candidates::{
    latest_mod_time, list_candidates, scan_candidates, Candidate, CandidateStatus, Eligibility,
};
pub use walk::{walk, EntryKind, EntryWalker, FsEntry};
