//! Reducer configuration.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{ReduceError, Result};

/// Order in which enabled lines are grouped into batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending line index.
    #[default]
    Forward,
    /// Descending line index.
    Reverse,
}

/// Batch sizing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Start with one batch spanning the window and halve down to single lines.
    #[default]
    Hierarchical,
    /// Only ever remove one line at a time.
    Linear,
}

/// Configuration for a reduction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Traversal order for batches.
    pub direction: Direction,

    /// Hierarchical or linear batch sizing.
    pub mode: Mode,

    /// First line (0-based) that may be removed.
    pub first: usize,

    /// One past the last line that may be removed; `None` means end of input.
    pub last: Option<usize>,

    /// Verdict to preserve. When unset, the oracle is run on the input file.
    pub expected: Option<i32>,

    /// Force the sanity check on or off. When unset it runs only if the
    /// expected verdict was not supplied.
    pub sanity_check: Option<bool>,
}

impl ReducerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the traversal direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the batch sizing mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict removal to lines `first..last`.
    pub fn with_window(mut self, first: usize, last: Option<usize>) -> Self {
        self.first = first;
        self.last = last;
        self
    }

    /// Supply the verdict to preserve instead of measuring it.
    pub fn with_expected(mut self, expected: Option<i32>) -> Self {
        self.expected = expected;
        self
    }

    /// Force the sanity check on or off.
    pub fn with_sanity_check(mut self, enabled: bool) -> Self {
        self.sanity_check = Some(enabled);
        self
    }

    /// Whether the unmodified input must be re-tested before reducing.
    pub fn runs_sanity_check(&self) -> bool {
        self.sanity_check.unwrap_or(self.expected.is_none())
    }

    /// Resolve the active window against an input of `len` lines.
    pub fn window(&self, len: usize) -> Result<Range<usize>> {
        let last = self.last.unwrap_or(len);
        if self.first > last || last > len {
            return Err(ReduceError::InvalidWindow {
                first: self.first,
                last,
                len,
            });
        }
        Ok(self.first..last)
    }

    /// Window indices in traversal order.
    pub(crate) fn traversal(&self, window: Range<usize>) -> Vec<usize> {
        match self.direction {
            Direction::Forward => window.collect(),
            Direction::Reverse => window.rev().collect(),
        }
    }
}
