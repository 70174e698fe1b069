//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(
    name = "ibtesterd",
    version,
    about = "One-wire iButton presence tester controlled over MQTT"
)]
pub struct Cli {
    /// Configuration file (prefer `--config`).
    #[arg(value_name = "CONFIG")]
    pub legacy_config: Option<PathBuf>,

    /// Configuration file.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise verbosity by one level per occurrence.
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Numeric level: 0 error, 1 warn, 2 info, 3 debug. Out-of-range values are clamped.
    #[arg(long = "log-level", value_name = "N", allow_negative_numbers = true)]
    pub log_level: Option<i64>,

    /// Enumerate the bus once, log the result and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// The configuration path; `--config` wins over the positional form.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| self.legacy_config.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Filter directive requested on the command line, if any.
    ///
    /// `--log-level` wins over `-q`, which wins over `-v`.
    pub fn log_directive(&self) -> Option<String> {
        let level = if let Some(level) = self.log_level {
            level.clamp(0, 3)
        } else if self.quiet {
            1
        } else if self.verbose > 0 {
            (2 + i64::from(self.verbose)).min(3)
        } else {
            return None;
        };
        Some(format!("ibtester={}", level_name(level)))
    }
}

fn level_name(level: i64) -> &'static str {
    match level {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}
