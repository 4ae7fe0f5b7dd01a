//! # linedd-reducer
//!
//! Delta debugging for line-oriented files.
//!
//! Given an input file and an external oracle command, this crate removes as
//! many lines as it can while the command keeps producing the same verdict
//! (exit code, or raw wait status when signals matter). It knows nothing about
//! the file's syntax beyond line boundaries.
//!
//! ## Components
//!
//! - **Oracle** ([`oracle`]): runs `command [args...] <file>` and reports a
//!   [`Verdict`]. Tests substitute an [`OracleFn`] closure.
//! - **Materializer** ([`lines`]): writes the currently kept lines, byte for
//!   byte, to the scratch or output file.
//! - **Engine** ([`engine`]): coarse-to-fine batched removal until a round
//!   removes nothing.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linedd_reducer::{CommandOracle, OracleCommand, Reducer, ReducerConfig, Direction};
//!
//! let command = OracleCommand::parse(&["./crashes.sh".to_string()])?;
//! let reducer = Reducer::new(
//!     CommandOracle::new(command),
//!     ReducerConfig::new().with_direction(Direction::Reverse),
//! );
//!
//! let outcome = reducer.reduce(Path::new("big.smt2"), Path::new("small.smt2")).await?;
//! println!("{outcome}");
//! ```
//!
//! The result is 1-minimal: removing any single remaining line inside the
//! window changes the verdict. It is not guaranteed to be the smallest file
//! that reproduces.

pub mod config;
pub mod engine;
pub mod error;
pub mod lines;
pub mod oracle;
pub mod result;

pub use config::{Direction, Mode, ReducerConfig};
pub use engine::{Reducer, Reduction};
pub use error::{ReduceError, Result};
pub use lines::{materialize, LineSequence, Selection};
pub use oracle::{CommandOracle, Oracle, OracleCommand, OracleFn, Verdict, VerdictMode};
pub use result::{ReductionOutcome, ReductionStats};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _config = ReducerConfig::default();
        let _stats = ReductionStats::default();
        let _mode = VerdictMode::default();
    }
}
