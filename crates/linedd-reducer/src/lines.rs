//! Line storage and candidate materialization.
//!
//! The input file is captured once as a [`LineSequence`] of raw byte lines,
//! terminators included. The engine tracks which of those lines are still
//! believed necessary with a [`Selection`], and [`materialize`] writes the
//! selected lines back out byte for byte.

use std::ops::Range;
use std::path::Path;

use crate::error::{ReduceError, Result};

/// The immutable lines of the input file.
///
/// Each entry keeps its trailing `\n` (and any `\r` before it); only the
/// final line may lack a terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<Vec<u8>>,
}

impl LineSequence {
    /// Split raw file contents into lines.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let lines = bytes
            .split_inclusive(|b| *b == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        Self { lines }
    }

    /// Read and split a file.
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ReduceError::io(path, e))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the input had no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The bytes of line `index`, terminator included.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    /// Iterate over all lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(Vec::as_slice)
    }
}

/// Per-line membership flags: `true` means the line is still kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    enabled: Vec<bool>,
}

impl Selection {
    /// A selection with every one of `len` lines enabled.
    pub fn all(len: usize) -> Self {
        Self {
            enabled: vec![true; len],
        }
    }

    /// Whether line `index` is kept.
    pub fn is_enabled(&self, index: usize) -> bool {
        self.enabled[index]
    }

    /// Keep line `index`.
    pub fn enable(&mut self, index: usize) {
        self.enabled[index] = true;
    }

    /// Drop line `index`.
    pub fn disable(&mut self, index: usize) {
        self.enabled[index] = false;
    }

    /// Total number of kept lines.
    pub fn count_enabled(&self) -> usize {
        self.enabled.iter().filter(|e| **e).count()
    }

    /// Number of kept lines inside `window`.
    pub fn count_enabled_in(&self, window: Range<usize>) -> usize {
        self.enabled[window].iter().filter(|e| **e).count()
    }

    /// Concatenate the kept lines in their original order.
    pub fn render(&self, lines: &LineSequence) -> Vec<u8> {
        let mut out = Vec::new();
        for (line, _) in lines
            .iter()
            .zip(&self.enabled)
            .filter(|(_, enabled)| **enabled)
        {
            out.extend_from_slice(line);
        }
        out
    }
}

/// Write the lines kept by `selection` to `path`, replacing its contents.
pub async fn materialize(lines: &LineSequence, selection: &Selection, path: &Path) -> Result<()> {
    tokio::fs::write(path, selection.render(lines))
        .await
        .map_err(|e| ReduceError::io(path, e))
}
