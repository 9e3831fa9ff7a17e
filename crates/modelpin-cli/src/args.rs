//! Command-line argument definitions for the modelpin CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the graph description, the report
//! destination, configuration, directive overrides and logging verbosity.

use clap::Parser;

use modelpin::ModelpinError;

/// Command-line arguments for the modelpin tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the graph description (TOML)
    #[arg(help = "Path to the graph description file")]
    pub input: String,

    /// Path to the output report (TOML); printed to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Source framework (tensorflow, caffe, onnx, generic)
    #[arg(short, long)]
    pub framework: Option<String>,

    /// Conversion directive, may be repeated
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Splits every `-D key=value` argument on its first `=`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelpinError::Config`] for an entry without `=` or with an
    /// empty key.
    pub fn directive_overrides(&self) -> Result<Vec<(&str, &str)>, ModelpinError> {
        self.defines
            .iter()
            .map(|define| match define.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
                _ => Err(ModelpinError::Config(format!(
                    "invalid directive `{define}`, expected KEY=VALUE"
                ))),
            })
            .collect()
    }
}
