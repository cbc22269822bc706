//! dclean: archive top-level directories that have gone stale.
//!
//! Each immediate child directory of a root is checked for its newest
//! modification time. Stale ones are copied into a staging area, optionally
//! stripped of dependency caches such as `node_modules`, then zipped (or
//! moved) into `<root>/archive`. Originals are only deleted after a second
//! confirmation.

pub mod archive;
pub mod config;
pub mod error;
pub mod progress;
pub mod prompt;
pub mod scanner;
pub mod stats;

pub use archive::{Archiver, RunOutcome, RunReport};
pub use config::{AppConfig, ArchiveOptions};
pub use error::{Error, Result};
pub use progress::{ProgressReporter, SilentReporter};
pub use prompt::{AssumeYes, Confirm, TerminalConfirm};
