use chrono::{DateTime, Local};
use colored::*;
use dclean::archive::{ArchivedCandidate, RunOutcome, RunReport};
use dclean::scanner::{Candidate, CandidateStatus, Eligibility};
use dclean::{Error, ProgressReporter};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::{Duration, SystemTime};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Console reporter: a spinner while each directory is archived, colored
/// summaries on stdout.
pub struct ConsoleReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            bar: RefCell::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Some(old) = self.bar.borrow_mut().replace(pb) {
            old.finish_and_clear();
        }
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

pub fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "unknown".to_string(),
    }
}

/// One line per top-level directory, used by both `scan` and `archive`.
pub fn print_statuses(statuses: &[CandidateStatus]) {
    for status in statuses {
        let label = match &status.eligibility {
            Eligibility::Stale => "old".yellow(),
            Eligibility::Forced => "all".yellow(),
            Eligibility::Recent => "recent".green(),
            Eligibility::Unreadable(_) => "unreadable".red(),
        };
        println!(
            "  {:<10} {:<16} {}",
            label,
            format_time(status.latest_modified),
            status.candidate.name
        );
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_scan_complete(&self, statuses: &[CandidateStatus]) {
        if statuses.is_empty() {
            return;
        }
        println!("Checked {} directories:", statuses.len());
        print_statuses(statuses);

        let eligible: Vec<&str> = statuses
            .iter()
            .filter(|s| s.is_eligible())
            .map(|s| s.candidate.name.as_str())
            .collect();
        if !eligible.is_empty() {
            println!();
            println!("Directories to archive:");
            for name in eligible {
                println!("  {}", name.bold());
            }
        }
    }

    fn on_candidate_start(&self, candidate: &Candidate, index: usize, total: usize) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(format!(
            "[{}/{}] Archiving {}...",
            index + 1,
            total,
            candidate.name
        ));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_candidate_archived(&self, archived: &ArchivedCandidate) {
        self.finish_bar();
        println!(
            "  {} {} -> {} ({} -> {}, {:.2}% saved)",
            "✓".green(),
            archived.candidate.name,
            archived.artifact.display(),
            HumanBytes(archived.original_bytes),
            HumanBytes(archived.archived_bytes),
            archived.percent_saved()
        );
    }

    fn on_candidate_failed(&self, candidate: &Candidate, error: &Error) {
        self.finish_bar();
        println!("  {} {}: {}", "✗".red(), candidate.name, error);
    }

    fn on_report(&self, report: &RunReport) {
        self.finish_bar();
        println!();

        if report.outcome == RunOutcome::NothingToArchive {
            println!("No directories to archive.");
            return;
        }

        let stats = &report.stats;
        println!("{}", "Summary".bold());
        println!(
            "  Original size: {} bytes ({})",
            stats.original_bytes,
            HumanBytes(stats.original_bytes)
        );
        println!(
            "  Archived size: {} bytes ({})",
            stats.archived_bytes,
            HumanBytes(stats.archived_bytes)
        );
        println!(
            "  Saved:         {} bytes ({:.2}%)",
            stats.saved_bytes(),
            stats.percent_saved()
        );
        println!(
            "  {} archived, {} skipped, {} failed in {}",
            format!("{}", report.archived.len()).green(),
            format!("{}", report.not_attempted().len()).yellow(),
            format!("{}", report.failed.len()).red(),
            indicatif::HumanDuration(report.elapsed)
        );

        if !report.archived.is_empty() {
            println!("Archived:");
            for archived in &report.archived {
                println!("  {}", archived.candidate.name);
            }
        }
        if !report.failed.is_empty() {
            println!("Needs attention:");
            for failed in &report.failed {
                println!("  {}: {}", failed.candidate.name.red(), failed.error);
            }
        }
    }

    fn on_original_deleted(&self, candidate: &Candidate) {
        println!("  {} deleted {}", "✓".green(), candidate.path.display());
    }

    fn on_delete_failed(&self, candidate: &Candidate, error: &Error) {
        println!("  {} could not delete {}: {}", "✗".red(), candidate.path.display(), error);
    }
}
