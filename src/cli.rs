//! CLI argument parsing (spec.md §6), mirroring the teacher's `Cli`/
//! `LogLevel` split (`src/bin/why/cli.rs`): a thin `clap::Parser` struct
//! translated into the plain configuration structs the pipeline consumes.

use clap::{Parser, ValueEnum};

use crate::config::{PipelineConfig, PrinterConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Indent width in spaces. `0` means flat, single-line output.
    #[arg(short = 'i', long, default_value_t = 4)]
    pub indent: usize,

    /// Equivalent to `-i 0`. Mutually exclusive with `--indent`.
    #[arg(short = 'f', long, conflicts_with = "indent")]
    pub flatten: bool,

    /// Lower every non-JSON construct and emit strict JSON.
    #[arg(short = 'j', long = "json-output")]
    pub json_output: bool,

    /// Disable trailing commas in verbatim mode (always disabled in JSON mode).
    #[arg(short = 'T', long = "no-trailing-commas")]
    pub no_trailing_commas: bool,

    /// Escape non-ASCII code points in string output as `\uXXXX`.
    #[arg(long)]
    pub ensure_ascii: bool,

    /// Character encoding of the input byte stream. Only `utf-8` is implemented.
    #[arg(short = 'I', long = "input-encoding", default_value = "utf-8")]
    pub input_encoding: String,

    /// Character encoding of the output byte stream. Only `utf-8` is implemented.
    #[arg(short = 'O', long = "output-encoding", default_value = "utf-8")]
    pub output_encoding: String,

    /// Specify the log level of canif.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    pub fn printer_config(&self) -> PrinterConfig {
        let indent = if self.flatten { 0 } else { self.indent };
        PrinterConfig {
            indent,
            trailing_commas: !self.no_trailing_commas && !self.json_output,
            ensure_ascii: self.ensure_ascii,
            json_mode: self.json_output,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            json_output: self.json_output,
            input_encoding: self.input_encoding.clone(),
            output_encoding: self.output_encoding.clone(),
        }
    }
}

/// Enum for specifying the log level of canif.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings, e.g. an ignored, already-false `--no-trailing-commas` in JSON mode.
    #[value(alias("1"))]
    Warn,

    /// Log general pipeline progress (stage start/stop, configuration in effect).
    #[value(alias("2"))]
    Info,

    /// Log individual tokens and parse events as they're produced.
    #[value(alias("3"))]
    Debug,

    /// Log everything, including lexer cursor movement.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
