mod copy;
mod encode;
mod orchestrator;
mod prune;
mod size;
mod staging;

pub use copy::copy_tree;
pub use encode::{encode_zip, relocate_or_copy};
pub use orchestrator::{
    ArchivedCandidate, Archiver, FailedCandidate, RunOutcome, RunReport, DELETE_PROMPT,
    PROCEED_PROMPT,
};
pub use prune::prune_named;
pub use size::directory_size;
pub use staging::StagingArea;
