//! Streaming parser and pretty-printer for JSON and its permissive,
//! script-flavoured supersets: tuples, sets, unquoted keys, trailing
//! commas, string prefixes, function-call expressions, repr-blobs, bare
//! identifiers, and empty array slots.
//!
//! The pipeline is four pull-based stages, each reading no more of its
//! predecessor than it needs to produce one unit of output:
//!
//! ```text
//! Lexer -> Parser -> [JsonLowerer] -> Printer
//! ```
//!
//! [`parser::Parser`] is the event producer most callers want; [`value`]
//! offers a simpler, non-streaming in-memory alternative for callers who
//! don't need the event API directly.

pub mod cli;
pub mod config;
pub mod error;
pub mod escape;
pub mod event;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod printer;
pub mod reserved;
pub mod token;
pub mod value;

use std::io::Write;

use config::{PipelineConfig, PrinterConfig};
use error::CanifError;
use event::ParseEvent;
use lowering::JsonLowerer;
use parser::Parser;
use printer::Printer;

/// Runs the full pipeline over `input`, writing formatted output to `out`.
/// This is the entry point the CLI binary drives; library consumers who
/// want the raw event stream should use [`parser::Parser`] (and
/// [`lowering::JsonLowerer`]) directly instead.
pub fn run(
    input: &str,
    out: impl Write,
    pipeline: &PipelineConfig,
    printer_config: PrinterConfig,
) -> Result<(), CanifError> {
    pipeline.validate()?;
    let mut printer = Printer::new(out, printer_config);
    if pipeline.json_output {
        printer.print(JsonLowerer::new(Parser::new(input)))
    } else {
        printer.print(Parser::new(input))
    }
}

/// Parses `input` into a bare event stream, with no lowering applied.
pub fn parse(input: &str) -> impl Iterator<Item = Result<ParseEvent, CanifError>> + '_ {
    Parser::new(input)
}
