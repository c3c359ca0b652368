//! # canif
//!
//! The `canif` binary reads a JSON-superset document from stdin and writes
//! a reformatted rendering to stdout, either preserving its non-JSON
//! constructs ("verbatim" mode) or lowering them to strict JSON.

use std::io::{self, Read, Write};

use colored::Colorize;
use log::debug;

use canif::cli::Cli;
use canif::error::CanifError;

fn main() {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    if let Err(err) = run(&args) {
        report(&err);
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<(), CanifError> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    debug!(
        "running pipeline: indent={} json_output={} ensure_ascii={}",
        args.indent, args.json_output, args.ensure_ascii
    );

    let stdout = io::stdout();
    canif::run(&input, stdout.lock(), &args.pipeline_config(), args.printer_config())?;
    io::stdout().flush()?;
    Ok(())
}

/// A single-line diagnostic on stderr, with the offending span highlighted
/// the way the teacher's parser error rendering does (`colored::Colorize`).
fn report(err: &CanifError) {
    eprintln!("{} {}", "error:".red().bold(), err);
}
