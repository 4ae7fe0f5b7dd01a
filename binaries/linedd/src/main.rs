//! linedd - delta debugger for line-oriented text files.
//!
//! Given a command that expects a file as its last argument, linedd runs it
//! on the input and records the exit status. It then repeatedly removes
//! lines, re-running the command on the smaller file and keeping each removal
//! that preserves the status, until no single line can be removed.
//!
//! # Usage
//!
//! ```bash
//! # Minimize while the compiler keeps crashing with the same exit code
//! linedd crash.c crash.min.c "gcc -c -o /dev/null"
//!
//! # Also require the same terminating signal, and skip measuring the input
//! linedd --signal --expect 139 big.smt2 small.smt2 ./solver --timeout 60
//!
//! # Only touch lines 100..400, walking from the end of the file
//! linedd --reverse -f 100 -l 400 input.txt output.txt ./check.sh
//! ```
//!
//! The command is run as `command [args...] <candidate>`; its stdout and
//! stderr are discarded. An existing output file is moved to
//! `<output>.backup` (or a numbered backup) before it is overwritten.

mod backup;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{LineddConfig, LoggingConfig};
use linedd_reducer::{CommandOracle, OracleCommand, Reducer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for linedd.
#[derive(Parser, Debug)]
#[command(
    name = "linedd",
    about = "Minimize a line-oriented file while preserving a command's exit status",
    version,
    author
)]
pub struct CliArgs {
    /// File to minimize. It is never modified.
    #[arg(value_name = "INPUT", required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Where the minimized file is written.
    #[arg(value_name = "OUTPUT", required_unless_present = "print_config")]
    output: Option<PathBuf>,

    /// Oracle command; the candidate file is appended as its last argument.
    /// A single quoted string is split on whitespace.
    #[arg(
        value_name = "COMMAND",
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "print_config"
    )]
    command: Vec<String>,

    /// Expected verdict. Skips measuring it on the input, and the sanity
    /// check unless --sanity-check is given.
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    expect: Option<i32>,

    /// Compare raw wait statuses, so the terminating signal must match too.
    #[arg(long)]
    signal: bool,

    /// Walk lines from the end of the window towards the start.
    #[arg(long)]
    reverse: bool,

    /// Remove one line at a time instead of halving batch sizes.
    #[arg(long)]
    linear: bool,

    /// First line (0-based) that may be removed.
    #[arg(short = 'f', long, value_name = "LINE")]
    first: Option<usize>,

    /// One past the last line that may be removed.
    #[arg(short = 'l', long, value_name = "LINE")]
    last: Option<usize>,

    /// Only report warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Re-test the unmodified input even when --expect is given.
    #[arg(long, conflicts_with = "no_sanity_check")]
    sanity_check: bool,

    /// Do not re-test the unmodified input.
    #[arg(long)]
    no_sanity_check: bool,

    /// Refuse to run if the output file already exists.
    #[arg(long)]
    no_clobber: bool,

    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,

    /// Print the default configuration and exit.
    #[arg(long)]
    print_config: bool,
}

/// Initialize the tracing subscriber. Logs go to stderr so stdout only
/// carries the final summary.
fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if args.print_config {
        let config = LineddConfig::default();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut config = if let Some(ref config_path) = args.config {
        LineddConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        LineddConfig::default()
    };
    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    // clap requires both paths unless --print-config was given.
    let input = args.input.as_deref().context("Missing input file")?;
    let output = args.output.as_deref().context("Missing output file")?;
    let command = OracleCommand::parse(&args.command).context("Invalid oracle command")?;

    info!(
        command = %command,
        input = %input.display(),
        signal = config.oracle.signal,
        "Running oracle command"
    );

    let oracle = CommandOracle::new(command).with_mode(config.verdict_mode());
    let reducer = Reducer::new(oracle, config.reduction.clone());

    let reduction = reducer
        .prepare(input)
        .await
        .with_context(|| format!("Cannot reduce {}", input.display()))?;

    backup::backup_existing(output, &config.output)?;

    let outcome = reduction
        .run(output)
        .await
        .with_context(|| format!("Reduction of {} failed", input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome);
    }

    Ok(())
}
