use indicatif::{HumanBytes, HumanDuration};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StatsTimer {
    start_time: Instant,
    duration: Option<Duration>,
}

impl Default for StatsTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTimer {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            duration: None,
        }
    }

    pub fn finish(&mut self) -> Duration {
        let duration = self.start_time.elapsed();
        self.duration = Some(duration);
        duration
    }

    /// Elapsed time, frozen once `finish` has been called.
    pub fn get_duration(&self) -> Duration {
        self.duration.unwrap_or_else(|| self.start_time.elapsed())
    }

    pub fn get_duration_human(&self) -> String {
        HumanDuration(self.get_duration()).to_string()
    }
}

/// Byte totals for the candidates archived in one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub original_bytes: u64,
    pub archived_bytes: u64,
}

impl RunStats {
    pub fn record(&mut self, original_bytes: u64, archived_bytes: u64) {
        self.original_bytes += original_bytes;
        self.archived_bytes += archived_bytes;
    }

    /// Negative when the archive came out larger than its input.
    pub fn saved_bytes(&self) -> i64 {
        self.original_bytes as i64 - self.archived_bytes as i64
    }

    pub fn percent_saved(&self) -> f64 {
        percent_saved(self.original_bytes, self.archived_bytes)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} -> {} (saved {} bytes, {:.2}%)",
            HumanBytes(self.original_bytes),
            HumanBytes(self.archived_bytes),
            self.saved_bytes(),
            self.percent_saved()
        )
    }
}

/// Share of `original` saved, as a percentage. Zero when `original` is zero.
pub fn percent_saved(original: u64, archived: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - archived as f64) / original as f64 * 100.0
}
