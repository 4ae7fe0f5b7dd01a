//! Result types for reduction runs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::oracle::Verdict;

/// Counters kept by the engine while it reduces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionStats {
    /// Outer rounds started, including the final round that removed nothing.
    pub rounds: usize,

    /// Oracle invocations, including calibration and the sanity check.
    pub oracle_calls: usize,

    /// Line removals attempted, counted once per line per batch.
    pub lines_tried: usize,

    /// Lines permanently removed.
    pub lines_removed: usize,

    /// Batches whose removal preserved the verdict.
    pub accepted_batches: usize,

    /// Batches that had to be reverted.
    pub rejected_batches: usize,

    /// Stride passes performed across all rounds.
    pub stride_passes: usize,

    /// Wall-clock time of the reduction.
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl ReductionStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of `size` lines that could be removed.
    pub fn record_accepted(&mut self, size: usize) {
        self.accepted_batches += 1;
        self.lines_removed += size;
    }

    /// Record a batch that had to be restored.
    pub fn record_rejected(&mut self) {
        self.rejected_batches += 1;
    }

    /// Total number of batches tested.
    pub fn total_batches(&self) -> usize {
        self.accepted_batches + self.rejected_batches
    }

    /// Fraction of batches that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.total_batches();
        if total == 0 {
            0.0
        } else {
            self.accepted_batches as f64 / total as f64
        }
    }
}

impl fmt::Display for ReductionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ {} rounds, {} oracle calls, {}/{} batches accepted ({:.1}%)",
            self.rounds,
            self.oracle_calls,
            self.accepted_batches,
            self.total_batches(),
            self.acceptance_rate() * 100.0
        )?;
        if let Some(duration) = self.duration {
            write!(f, ", {:?}", duration)?;
        }
        write!(f, " }}")
    }
}

/// The outcome of a completed reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductionOutcome {
    /// Where the reduced file was written.
    pub output: PathBuf,

    /// The verdict that was preserved.
    pub expected: Verdict,

    /// Lines in the original input.
    pub original_lines: usize,

    /// Lines in the reduced file.
    pub kept_lines: usize,

    /// Lines that were eligible for removal.
    pub window_lines: usize,

    /// Run statistics.
    pub stats: ReductionStats,
}

impl ReductionOutcome {
    /// Lines removed from the input.
    pub fn removed_lines(&self) -> usize {
        self.original_lines - self.kept_lines
    }

    /// Percentage of the window that was removed.
    pub fn reduction_percentage(&self) -> f64 {
        if self.window_lines == 0 {
            0.0
        } else {
            self.removed_lines() as f64 / self.window_lines as f64 * 100.0
        }
    }
}

impl fmt::Display for ReductionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done. Kept {} lines, removed {}/{} lines. Minimized file written to {}.",
            self.kept_lines,
            self.removed_lines(),
            self.window_lines,
            self.output.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_rates() {
        let mut stats = ReductionStats::new();
        stats.record_accepted(4);
        stats.record_accepted(1);
        stats.record_rejected();

        assert_eq!(stats.lines_removed, 5);
        assert_eq!(stats.total_batches(), 3);
        assert!((stats.acceptance_rate() - 0.666).abs() < 0.01);
        assert_eq!(ReductionStats::new().acceptance_rate(), 0.0);
    }

    #[test]
    fn test_outcome_summary() {
        let outcome = ReductionOutcome {
            output: PathBuf::from("out.txt"),
            expected: Verdict(1),
            original_lines: 10,
            kept_lines: 1,
            window_lines: 10,
            stats: ReductionStats::default(),
        };

        assert_eq!(outcome.removed_lines(), 9);
        assert!((outcome.reduction_percentage() - 90.0).abs() < 0.01);
        assert_eq!(
            outcome.to_string(),
            "Done. Kept 1 lines, removed 9/10 lines. Minimized file written to out.txt."
        );
    }

    #[test]
    fn test_outcome_serializes_without_duration() {
        let mut stats = ReductionStats::default();
        stats.duration = Some(Duration::from_secs(3));
        let outcome = ReductionOutcome {
            output: PathBuf::from("out.txt"),
            expected: Verdict(256),
            original_lines: 4,
            kept_lines: 4,
            window_lines: 2,
            stats,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["expected"], 256);
        assert_eq!(json["kept_lines"], 4);
        assert!(json["stats"].get("duration").is_none());
    }
}
