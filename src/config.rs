//! Plain configuration structs consumed by the printer and pipeline,
//! built once from parsed CLI flags (spec.md §6).

/// Controls how the printer lays out events (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// `0` means flat, single-line output; any other value is the number of
    /// spaces added per nesting level.
    pub indent: usize,
    /// Ignored (forced `false`) whenever `json_mode` is set.
    pub trailing_commas: bool,
    pub ensure_ascii: bool,
    /// Whether the printer is consuming an already-lowered JSON event stream.
    /// Affects only string/key quoting and reserved-atom text.
    pub json_mode: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            indent: 4,
            trailing_commas: true,
            ensure_ascii: false,
            json_mode: false,
        }
    }
}

/// Selects which stages the pipeline assembles, independent of layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub json_output: bool,
    pub input_encoding: String,
    pub output_encoding: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            json_output: false,
            input_encoding: "utf-8".to_string(),
            output_encoding: "utf-8".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Only UTF-8 is actually implemented (spec.md framing: character-set
    /// decoding is an external collaborator); any other requested encoding
    /// is a clear, early I/O-class error rather than a silently ignored flag.
    pub fn validate(&self) -> Result<(), crate::error::CanifError> {
        for (flag, name) in [
            ("--input-encoding", &self.input_encoding),
            ("--output-encoding", &self.output_encoding),
        ] {
            if !name.eq_ignore_ascii_case("utf-8") && !name.eq_ignore_ascii_case("utf8") {
                return Err(crate::error::CanifError::io(format!(
                    "unsupported encoding '{name}' for {flag}: only utf-8 is implemented"
                )));
            }
        }
        Ok(())
    }
}
