//! The incremental printer (spec.md §4.4): consumes a parse-event stream and
//! writes formatted output, tracking only a per-depth frame stack so memory
//! stays bounded regardless of how large any single container is.

use std::io::Write;

use crate::config::PrinterConfig;
use crate::error::CanifError;
use crate::escape::{ensure_ascii_lexeme, json_escape};
use crate::event::{Atom, AtomKind, MapKey, ParseEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Map,
    Array,
    Tuple,
    Set,
}

impl FrameKind {
    fn closer(self) -> char {
        match self {
            FrameKind::Map | FrameKind::Set => '}',
            FrameKind::Array => ']',
            FrameKind::Tuple => ')',
        }
    }
}

struct Frame {
    kind: FrameKind,
    /// Items written into this container so far (key+value counts as one
    /// for maps). Drives comma/newline placement; the authoritative total
    /// for the trailing-comma decision comes from the `*Close` event payload.
    written: usize,
    /// Set immediately after a `MapKey` is written; cleared by the value
    /// event that follows, so that value doesn't get its own separator.
    awaiting_value: bool,
    /// Whether the previous item in this container was an empty array slot.
    /// An empty slot contributes no text of its own, so the flat-mode
    /// separator on either side of one is a bare `,` rather than `, `
    /// (spec.md §4.4: `[1,,,4]`, not `[1, , , 4]`).
    prev_was_empty: bool,
}

pub struct Printer<W> {
    out: W,
    config: PrinterConfig,
    frames: Vec<Frame>,
    /// Set after a `FunctionCall` event; the immediately following
    /// `TupleOpen` consumes it instead of treating itself as a fresh item.
    pending_call: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, config: PrinterConfig) -> Self {
        Printer {
            out,
            config,
            frames: Vec::new(),
            pending_call: false,
        }
    }

    pub fn print<I>(&mut self, events: I) -> Result<(), CanifError>
    where
        I: IntoIterator<Item = Result<ParseEvent, CanifError>>,
    {
        for event in events {
            match event? {
                ParseEvent::MapOpen => self.open(FrameKind::Map, '{')?,
                ParseEvent::ArrayOpen => self.open(FrameKind::Array, '[')?,
                ParseEvent::SetOpen => self.open(FrameKind::Set, '{')?,
                ParseEvent::TupleOpen => {
                    if self.pending_call {
                        self.pending_call = false;
                        self.write_raw("(")?;
                        self.frames.push(Frame {
                            kind: FrameKind::Tuple,
                            written: 0,
                            awaiting_value: false,
                            prev_was_empty: false,
                        });
                    } else {
                        self.open(FrameKind::Tuple, '(')?;
                    }
                }
                ParseEvent::MapKey(key) => self.write_map_key(&key)?,
                ParseEvent::FunctionCall { head, .. } => {
                    self.begin_value(false)?;
                    self.write_raw(&head)?;
                    self.pending_call = true;
                }
                ParseEvent::Atom(atom) => {
                    let is_empty_slot = atom.kind == AtomKind::EmptySlot;
                    self.begin_value(is_empty_slot)?;
                    let text = self.render_atom(&atom);
                    self.write_raw(&text)?;
                }
                ParseEvent::MapClose { count }
                | ParseEvent::ArrayClose { count }
                | ParseEvent::TupleClose { count }
                | ParseEvent::SetClose { count } => self.close(count)?,
            }
        }
        self.write_raw("\n")?;
        Ok(())
    }

    fn open(&mut self, kind: FrameKind, bracket: char) -> Result<(), CanifError> {
        self.begin_value(false)?;
        self.write_raw(&bracket.to_string())?;
        self.frames.push(Frame {
            kind,
            written: 0,
            awaiting_value: false,
            prev_was_empty: false,
        });
        Ok(())
    }

    fn close(&mut self, count: usize) -> Result<(), CanifError> {
        let frame = self.frames.pop().expect("unbalanced close event");
        if frame.written == 0 {
            // Empty container: always one line, no interior whitespace,
            // regardless of configured indent.
            self.write_raw(&frame.kind.closer().to_string())?;
            return Ok(());
        }
        let trailing_comma =
            self.config.indent > 0 && self.config.trailing_commas && !self.config.json_mode && count > 0;
        if trailing_comma {
            self.write_raw(",")?;
        }
        if self.config.indent > 0 {
            self.write_raw("\n")?;
            self.write_indent(self.frames.len())?;
        }
        self.write_raw(&frame.kind.closer().to_string())?;
        Ok(())
    }

    /// Called immediately before writing any value-position token (atom,
    /// container open bracket, function-call head). Handles the
    /// separator/indent for ordinary container items; for a map value
    /// following its key, the key already placed the cursor, so this is a
    /// no-op beyond clearing the flag. `is_empty_slot` marks an array hole
    /// (`[1,,,4]`), which needs a bare `,` separator rather than `, ` in flat
    /// mode, on either side of it.
    fn begin_value(&mut self, is_empty_slot: bool) -> Result<(), CanifError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        if frame.kind == FrameKind::Map && frame.awaiting_value {
            frame.awaiting_value = false;
            frame.prev_was_empty = is_empty_slot;
            return Ok(());
        }
        let written = frame.written;
        let no_space = frame.prev_was_empty || is_empty_slot;
        frame.written += 1;
        frame.prev_was_empty = is_empty_slot;
        self.write_separator(written, no_space)
    }

    fn write_map_key(&mut self, key: &MapKey) -> Result<(), CanifError> {
        let frame = self.frames.last_mut().expect("MapKey outside a map");
        let written = frame.written;
        frame.written += 1;
        frame.awaiting_value = true;
        frame.prev_was_empty = false;
        self.write_separator(written, false)?;
        let text = self.render_key(key);
        self.write_raw(&text)?;
        self.write_raw(": ")
    }

    fn write_separator(&mut self, written_before: usize, no_space: bool) -> Result<(), CanifError> {
        let depth = self.frames.len();
        if written_before == 0 {
            if self.config.indent > 0 {
                self.write_raw("\n")?;
                self.write_indent(depth)?;
            }
        } else if self.config.indent > 0 {
            self.write_raw(",\n")?;
            self.write_indent(depth)?;
        } else if no_space {
            self.write_raw(",")?;
        } else {
            self.write_raw(", ")?;
        }
        Ok(())
    }

    fn write_indent(&mut self, depth: usize) -> Result<(), CanifError> {
        self.write_raw(&" ".repeat(depth * self.config.indent))
    }

    fn write_raw(&mut self, text: &str) -> Result<(), CanifError> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn render_key(&self, key: &MapKey) -> String {
        if self.config.json_mode {
            format!("\"{}\"", json_escape(&key.decoded, self.config.ensure_ascii))
        } else if self.config.ensure_ascii {
            ensure_ascii_lexeme(&key.lexeme)
        } else {
            key.lexeme.clone()
        }
    }

    fn render_atom(&self, atom: &Atom) -> String {
        match &atom.kind {
            AtomKind::EmptySlot => String::new(),
            AtomKind::String(_) => {
                if self.config.json_mode {
                    format!(
                        "\"{}\"",
                        json_escape(atom.decoded.as_deref().unwrap_or(""), self.config.ensure_ascii)
                    )
                } else if self.config.ensure_ascii {
                    ensure_ascii_lexeme(&atom.lexeme)
                } else {
                    atom.lexeme.clone()
                }
            }
            // Numbers, reserved words, bare identifiers and repr-blobs are
            // already carrying print-ready text in `lexeme`: the lexer for
            // verbatim mode, the lowerer for JSON mode.
            AtomKind::Number | AtomKind::Reserved(_) | AtomKind::Ident | AtomKind::ReprBlob => {
                atom.lexeme.clone()
            }
        }
    }
}
