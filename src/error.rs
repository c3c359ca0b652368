//! Crate-wide error type.
//!
//! Every stage of the pipeline (lexer, parser, lowerer, printer, CLI) reports
//! failures through a single [`CanifError`], tagged with one of the three
//! families from the spec: lexical, syntactic, or I/O. The pipeline aborts on
//! the first error; there is no recovery.

use std::fmt::{self, Display};
use std::io;

/// A single point in the source text: line and column are 1-based, `offset`
/// is the 0-based byte offset. Used both for token positions and for error
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Span {
    pub fn start() -> Self {
        Span {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    InvalidEscape,
    UnterminatedReprBlob,
    UnrecognisedChar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    UnterminatedContainer,
    MissingColon,
    ValueExpected,
    TrailingData,
}

/// The three error families from the spec, collapsed into one kind tag so
/// the library surface can expose a single error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex(LexErrorKind),
    Parse(ParseErrorKind),
    Io,
}

#[derive(Debug, Clone)]
pub struct CanifError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
}

impl CanifError {
    pub fn lex(kind: LexErrorKind, span: Span, message: impl Into<String>) -> Self {
        CanifError {
            kind: ErrorKind::Lex(kind),
            span,
            message: message.into(),
        }
    }

    pub fn parse(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        CanifError {
            kind: ErrorKind::Parse(kind),
            span,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        CanifError {
            kind: ErrorKind::Io,
            span: Span::default(),
            message: message.into(),
        }
    }
}

impl Display for CanifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.kind, ErrorKind::Io) {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.span, self.message)
        }
    }
}

impl std::error::Error for CanifError {}

impl From<io::Error> for CanifError {
    fn from(err: io::Error) -> Self {
        CanifError::io(err.to_string())
    }
}

impl From<fmt::Error> for CanifError {
    fn from(err: fmt::Error) -> Self {
        CanifError::io(err.to_string())
    }
}

pub type CanifResult<T> = Result<T, CanifError>;
