//! Oracle invocation.
//!
//! An oracle maps a candidate file to a [`Verdict`]. The engine only ever
//! compares verdicts for equality, so anything that can answer "what does the
//! command say about this file" can drive a reduction: the real
//! [`CommandOracle`] that spawns a process, or an [`OracleFn`] closure in
//! tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use linedd_reducer::{CommandOracle, OracleCommand, VerdictMode};
//!
//! let command = OracleCommand::parse(&["gcc -fsyntax-only".to_string()])?;
//! let oracle = CommandOracle::new(command).with_mode(VerdictMode::WaitStatus);
//! let verdict = oracle.verdict(Path::new("crash.c")).await?;
//! println!("exit={} signal={}", verdict.exit_value(), verdict.signal());
//! ```

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::trace;

use crate::error::{ReduceError, Result};

/// The observable outcome of one oracle run.
///
/// Depending on the [`VerdictMode`] this is either a plain exit code or a raw
/// wait status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verdict(pub i32);

impl Verdict {
    /// Exit value encoded in a raw wait status.
    pub fn exit_value(self) -> i32 {
        self.0 >> 8
    }

    /// Terminating signal byte of a raw wait status.
    pub fn signal(self) -> i32 {
        self.0 & 0xff
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a finished process is turned into a [`Verdict`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictMode {
    /// Only the exit value (`wait status >> 8`).
    #[default]
    ExitCode,
    /// The full raw wait status, so a change of terminating signal counts.
    WaitStatus,
}

impl VerdictMode {
    /// Convert an exit status according to this mode.
    pub fn verdict(self, status: ExitStatus) -> Verdict {
        let raw = raw_wait_status(status);
        match self {
            VerdictMode::ExitCode => Verdict(raw >> 8),
            VerdictMode::WaitStatus => Verdict(raw),
        }
    }
}

#[cfg(unix)]
fn raw_wait_status(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.into_raw()
}

#[cfg(not(unix))]
fn raw_wait_status(status: ExitStatus) -> i32 {
    status.code().map(|code| code << 8).unwrap_or(-1 << 8)
}

/// Something that can judge a candidate file.
///
/// Implementations must be deterministic for the reduction result to be
/// meaningful; the engine never retries.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Run the oracle against `path` and report its verdict.
    ///
    /// # Errors
    ///
    /// Returns an error only when the oracle itself could not be run. A
    /// verdict that differs from the expected one is a normal result.
    async fn verdict(&self, path: &Path) -> Result<Verdict>;
}

/// Adapts a plain closure into an [`Oracle`].
pub struct OracleFn<F> {
    f: F,
}

impl<F> OracleFn<F>
where
    F: Fn(&Path) -> Result<Verdict> + Send + Sync,
{
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Oracle for OracleFn<F>
where
    F: Fn(&Path) -> Result<Verdict> + Send + Sync,
{
    async fn verdict(&self, path: &Path) -> Result<Verdict> {
        (self.f)(path)
    }
}

/// The argument vector of an external oracle command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCommand {
    program: String,
    args: Vec<String>,
}

impl OracleCommand {
    /// Build a command from a program and its static arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build a command from command-line tokens.
    ///
    /// A single token containing whitespace (`"cmd arg1 arg2"`) is split on
    /// whitespace; several tokens are used verbatim.
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let mut parts: Vec<String> = match tokens {
            [single] => single.split_whitespace().map(str::to_string).collect(),
            many => many.to_vec(),
        };
        if parts.is_empty() || parts[0].is_empty() {
            return Err(ReduceError::EmptyCommand);
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }

    /// The program to execute.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Static arguments placed before the candidate path.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for OracleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs an external command with the candidate path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    command: OracleCommand,
    mode: VerdictMode,
}

impl CommandOracle {
    /// Create an oracle in exit-code mode.
    pub fn new(command: OracleCommand) -> Self {
        Self {
            command,
            mode: VerdictMode::default(),
        }
    }

    /// Set how exit statuses become verdicts.
    pub fn with_mode(mut self, mode: VerdictMode) -> Self {
        self.mode = mode;
        self
    }

    fn build_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args);
        cmd.arg(path);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    async fn verdict(&self, path: &Path) -> Result<Verdict> {
        let status = self
            .build_command(path)
            .status()
            .await
            .map_err(|source| ReduceError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;
        let verdict = self.mode.verdict(status);
        trace!(path = %path.display(), %verdict, "Oracle returned");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_decoding() {
        // exit(3) after no signal
        let v = Verdict(3 << 8);
        assert_eq!(v.exit_value(), 3);
        assert_eq!(v.signal(), 0);

        // killed by SIGSEGV
        let v = Verdict(11);
        assert_eq!(v.exit_value(), 0);
        assert_eq!(v.signal(), 11);
    }

    #[test]
    fn test_parse_single_string() {
        let cmd = OracleCommand::parse(&["grep -q  needle".to_string()]).unwrap();
        assert_eq!(cmd.program(), "grep");
        assert_eq!(cmd.args(), &["-q".to_string(), "needle".to_string()]);
        assert_eq!(cmd.to_string(), "grep -q needle");
    }

    #[test]
    fn test_parse_token_vector_is_verbatim() {
        let tokens = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let cmd = OracleCommand::parse(&tokens).unwrap();
        assert_eq!(cmd.program(), "sh");
        assert_eq!(cmd.args(), &["-c".to_string(), "exit 3".to_string()]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            OracleCommand::parse(&[]),
            Err(ReduceError::EmptyCommand)
        ));
        assert!(matches!(
            OracleCommand::parse(&["   ".to_string()]),
            Err(ReduceError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_oracle_fn() {
        let oracle = OracleFn::new(|path: &Path| {
            Ok(Verdict(path.to_string_lossy().len() as i32))
        });
        let verdict = oracle.verdict(Path::new("abcd")).await.unwrap();
        assert_eq!(verdict, Verdict(4));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> CommandOracle {
        CommandOracle::new(OracleCommand::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "oracle".to_string()],
        ))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "needle\n").unwrap();

        // The candidate path arrives as $1.
        let oracle = sh("grep -q needle \"$1\" && exit 7; exit 2");
        assert_eq!(oracle.verdict(&path).await.unwrap(), Verdict(7));

        std::fs::write(&path, "haystack\n").unwrap();
        assert_eq!(oracle.verdict(&path).await.unwrap(), Verdict(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_wait_status_keeps_signal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "x\n").unwrap();

        let oracle = sh("kill -9 $$").with_mode(VerdictMode::WaitStatus);
        let verdict = oracle.verdict(&path).await.unwrap();
        assert_eq!(verdict.signal() & 0x7f, 9);
        assert_eq!(verdict.exit_value(), 0);

        let oracle = sh("exit 5").with_mode(VerdictMode::WaitStatus);
        let verdict = oracle.verdict(&path).await.unwrap();
        assert_eq!(verdict, Verdict(5 << 8));
        assert_eq!(verdict.exit_value(), 5);
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let oracle = CommandOracle::new(OracleCommand::new(
            "linedd-test-no-such-program",
            Vec::new(),
        ));
        let err = oracle.verdict(Path::new("whatever")).await.unwrap_err();
        assert!(matches!(err, ReduceError::Spawn { .. }));
    }
}
