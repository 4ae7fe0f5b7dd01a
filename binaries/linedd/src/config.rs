//! linedd configuration.
//!
//! Settings can come from a TOML file (`--config`) and are then overridden
//! by command-line flags.

use std::path::Path;

use linedd_reducer::{Direction, Mode, ReducerConfig, VerdictMode};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineddConfig {
    /// Reduction engine settings.
    pub reduction: ReducerConfig,

    /// Oracle settings.
    pub oracle: OracleConfig,

    /// Output file handling.
    pub output: OutputConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Oracle configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Compare raw wait statuses so the terminating signal must match too.
    pub signal: bool,
}

/// Output file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Refuse to run if the output file already exists.
    pub abort_on_existing: bool,

    /// Numbered backups tried after `<output>.backup` before overwriting
    /// the last one.
    pub max_backups: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            abort_on_existing: false,
            max_backups: 9,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LineddConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(expect) = args.expect {
            self.reduction.expected = Some(expect);
        }
        if args.reverse {
            self.reduction.direction = Direction::Reverse;
        }
        if args.linear {
            self.reduction.mode = Mode::Linear;
        }
        if let Some(first) = args.first {
            self.reduction.first = first;
        }
        if let Some(last) = args.last {
            self.reduction.last = Some(last);
        }
        if args.sanity_check {
            self.reduction.sanity_check = Some(true);
        }
        if args.no_sanity_check {
            self.reduction.sanity_check = Some(false);
        }

        if args.signal {
            self.oracle.signal = true;
        }

        if args.no_clobber {
            self.output.abort_on_existing = true;
        }

        // An explicit level wins over --quiet
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        } else if args.quiet {
            self.logging.level = "warn".to_string();
        }
        if args.json_logs {
            self.logging.format = "json".to_string();
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        if let Some(last) = self.reduction.last {
            if self.reduction.first > last {
                anyhow::bail!(
                    "First line {} is after last line {}",
                    self.reduction.first,
                    last
                );
            }
        }

        Ok(())
    }

    /// How oracle exit statuses are compared.
    pub fn verdict_mode(&self) -> VerdictMode {
        if self.oracle.signal {
            VerdictMode::WaitStatus
        } else {
            VerdictMode::ExitCode
        }
    }
}
