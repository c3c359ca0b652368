//! Token kinds and the [`Token`] record produced by the lexer.

use crate::error::Span;

/// The prefix letters a string literal may carry, per spec.md §4.1.
///
/// At most two of these combine (e.g. `rb"..."`, `Rf'...'`); the lexer
/// records which categories were present, not which literal letters were
/// used, since casing and ordering never affect decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringPrefix {
    pub raw: bool,
    pub binary: bool,
    pub unicode: bool,
    pub format: bool,
}

impl StringPrefix {
    /// Strings whose body must never be escape-decoded: raw strings keep
    /// backslashes literal, format strings are "stripped of the prefix and
    /// kept literal" per spec.md §4.3.
    pub fn is_literal(&self) -> bool {
        self.raw || self.format
    }

    fn apply(&mut self, c: char) {
        match c {
            'r' | 'R' => self.raw = true,
            'b' | 'B' => self.binary = true,
            'u' | 'U' => self.unicode = true,
            'f' | 'F' => self.format = true,
            _ => unreachable!("apply called with non-prefix character"),
        }
    }
}

pub fn is_prefix_letter(c: char) -> bool {
    matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F')
}

pub(crate) fn apply_prefix(prefix: &mut StringPrefix, c: char) {
    prefix.apply(c);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// One of `{ } [ ] ( ) , :`.
    Punct(char),
    Number,
    String(StringPrefix),
    /// Includes reserved words (`true`, `null`, ...) and compound `new X`
    /// lexemes; the parser decides meaning via [`crate::reserved::Reserved`].
    Ident,
    /// `<...>` repr-blob; `decoded` on the token holds the inner text.
    ReprBlob,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source lexeme, kept for verbatim printing.
    pub lexeme: String,
    /// The decoded semantic value, when the kind calls for one (strings,
    /// repr-blobs). `None` for numbers, punctuation, and plain identifiers.
    pub decoded: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn eof(span: Span) -> Self {
        Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            decoded: None,
            span,
        }
    }
}
