//! Hierarchical line reduction.
//!
//! The engine repeatedly removes batches of lines and asks the oracle whether
//! the smaller file still produces the expected verdict. Each round sweeps the
//! active window coarse to fine: the first pass tries to drop every enabled
//! line at once, and each following pass halves the batch size until single
//! lines are tried. Accepted batches stay removed and the output file is
//! rewritten immediately; rejected batches are restored and are not split
//! further until the next, smaller pass. Rounds repeat until one removes
//! nothing, which leaves a result that is 1-minimal for the chosen direction.
//!
//! # Example
//!
//! ```rust,ignore
//! use linedd_reducer::{CommandOracle, OracleCommand, Reducer, ReducerConfig};
//!
//! let oracle = CommandOracle::new(OracleCommand::parse(&args.command)?);
//! let reducer = Reducer::new(oracle, ReducerConfig::default());
//!
//! let reduction = reducer.prepare(Path::new("crash.c")).await?;
//! let outcome = reduction.run(Path::new("crash.min.c")).await?;
//! println!("{outcome}");
//! ```

use std::ops::Range;
use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info, trace};

use crate::config::{Mode, ReducerConfig};
use crate::error::{ReduceError, Result};
use crate::lines::{materialize, LineSequence, Selection};
use crate::oracle::{Oracle, Verdict};
use crate::result::{ReductionOutcome, ReductionStats};

/// Reduces files against an oracle.
pub struct Reducer<O> {
    oracle: O,
    config: ReducerConfig,
}

impl<O: Oracle> Reducer<O> {
    /// Create a reducer.
    pub fn new(oracle: O, config: ReducerConfig) -> Self {
        Self { oracle, config }
    }

    /// Read `input`, establish the expected verdict and run the sanity check.
    ///
    /// Nothing is written outside the scratch file until [`Reduction::run`]
    /// is called, so a failed check leaves the output path untouched.
    ///
    /// # Errors
    ///
    /// * `ReduceError::Io` - the input cannot be read or the scratch file
    ///   cannot be written.
    /// * `ReduceError::InvalidWindow` - the window does not fit the input.
    /// * `ReduceError::Spawn` - the oracle could not be run.
    /// * `ReduceError::SanityCheck` - the unmodified input does not reproduce
    ///   the expected verdict.
    pub async fn prepare(&self, input: &Path) -> Result<Reduction<'_, O>> {
        let lines = LineSequence::read(input).await?;
        let window = self.config.window(lines.len())?;
        let mut stats = ReductionStats::new();

        let expected = match self.config.expected {
            Some(expected) => Verdict(expected),
            None => {
                stats.oracle_calls += 1;
                self.oracle.verdict(input).await?
            }
        };

        info!(
            input = %input.display(),
            lines = lines.len(),
            first = window.start,
            last = window.end,
            expected = %expected,
            exit_value = expected.exit_value(),
            signal = expected.signal(),
            "Starting line reduction"
        );

        let scratch = NamedTempFile::new().map_err(|e| ReduceError::io(std::env::temp_dir(), e))?;
        let selection = Selection::all(lines.len());
        materialize(&lines, &selection, scratch.path()).await?;

        if self.config.runs_sanity_check() {
            stats.oracle_calls += 1;
            let actual = self.oracle.verdict(scratch.path()).await?;
            if actual != expected {
                return Err(ReduceError::SanityCheck {
                    expected: expected.0,
                    actual: actual.0,
                    path: scratch.path().to_path_buf(),
                });
            }
            debug!("Sanity check passed");
        }

        Ok(Reduction {
            oracle: &self.oracle,
            config: &self.config,
            order: self.config.traversal(window.clone()),
            lines,
            selection,
            window,
            expected,
            scratch,
            stats,
            started: Instant::now(),
        })
    }

    /// Prepare and run a reduction in one step.
    pub async fn reduce(&self, input: &Path, output: &Path) -> Result<ReductionOutcome> {
        self.prepare(input).await?.run(output).await
    }
}

/// A reduction whose premise has been checked and which is ready to run.
pub struct Reduction<'a, O> {
    oracle: &'a O,
    config: &'a ReducerConfig,
    lines: LineSequence,
    selection: Selection,
    window: Range<usize>,
    order: Vec<usize>,
    expected: Verdict,
    scratch: NamedTempFile,
    stats: ReductionStats,
    started: Instant,
}

#[derive(Debug, Default)]
struct PassSummary {
    tried: usize,
    removed: usize,
}

impl<O: Oracle> Reduction<'_, O> {
    /// The verdict being preserved.
    pub fn expected(&self) -> Verdict {
        self.expected
    }

    /// The scratch file candidates are written to.
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Reduce until a round removes nothing, writing the best file so far to
    /// `output` after every accepted batch.
    pub async fn run(mut self, output: &Path) -> Result<ReductionOutcome> {
        let window_lines = self.window.len();
        let mut changed = true;

        while changed {
            self.stats.rounds += 1;
            let round = self.stats.rounds;
            let mut tried = 0;
            let mut removed = 0;

            let mut stride = match self.config.mode {
                Mode::Linear => 1,
                Mode::Hierarchical => self.selection.count_enabled_in(self.window.clone()),
            };

            while stride >= 1 {
                let pass = self.stride_pass(stride, output).await?;
                tried += pass.tried;
                removed += pass.removed;

                if stride == 1 {
                    break;
                }
                stride /= 2;
            }

            changed = removed > 0;
            info!(
                round,
                tried,
                removed,
                remaining = self.selection.count_enabled_in(self.window.clone()),
                window = window_lines,
                "Round complete"
            );
        }

        // The output may have been touched by someone else during the run.
        materialize(&self.lines, &self.selection, output).await?;

        let scratch_path = self.scratch.path().to_path_buf();
        self.scratch
            .close()
            .map_err(|e| ReduceError::io(scratch_path, e))?;

        let mut stats = self.stats;
        stats.duration = Some(self.started.elapsed());

        let outcome = ReductionOutcome {
            output: output.to_path_buf(),
            expected: self.expected,
            original_lines: self.lines.len(),
            kept_lines: self.selection.count_enabled(),
            window_lines,
            stats,
        };

        info!(
            kept = outcome.kept_lines,
            removed = outcome.removed_lines(),
            reduction_percent = format!("{:.1}%", outcome.reduction_percentage()),
            oracle_calls = outcome.stats.oracle_calls,
            duration = ?outcome.stats.duration,
            "Reduction complete"
        );

        Ok(outcome)
    }

    /// Walk the window once, testing batches of `stride` enabled lines and a
    /// final partial batch.
    async fn stride_pass(&mut self, stride: usize, output: &Path) -> Result<PassSummary> {
        assert!(stride > 0, "stride must be positive");
        self.stats.stride_passes += 1;
        debug!(round = self.stats.rounds, stride, "Stride pass");

        let mut summary = PassSummary::default();
        let mut batch = Vec::with_capacity(stride);

        for pos in 0..self.order.len() {
            let index = self.order[pos];
            if !self.selection.is_enabled(index) {
                continue;
            }

            self.selection.disable(index);
            batch.push(index);
            summary.tried += 1;
            self.stats.lines_tried += 1;

            if batch.len() == stride {
                if self.test_batch(&batch, output).await? {
                    summary.removed += batch.len();
                }
                batch.clear();
            }
        }

        if !batch.is_empty() {
            if self.test_batch(&batch, output).await? {
                summary.removed += batch.len();
            }
            batch.clear();
        }

        Ok(summary)
    }

    /// Test the selection with `batch` already disabled. Keeps the removal and
    /// persists `output` if the verdict is unchanged, restores the batch
    /// otherwise.
    async fn test_batch(&mut self, batch: &[usize], output: &Path) -> Result<bool> {
        materialize(&self.lines, &self.selection, self.scratch.path()).await?;
        self.stats.oracle_calls += 1;
        let verdict = self.oracle.verdict(self.scratch.path()).await?;

        if verdict == self.expected {
            materialize(&self.lines, &self.selection, output).await?;
            self.stats.record_accepted(batch.len());
            debug!(
                size = batch.len(),
                first_line = batch[0],
                removed_total = self.stats.lines_removed,
                "Batch removed"
            );
            Ok(true)
        } else {
            for &index in batch {
                self.selection.enable(index);
            }
            self.stats.record_rejected();
            trace!(size = batch.len(), %verdict, "Batch restored");
            Ok(false)
        }
    }
}
