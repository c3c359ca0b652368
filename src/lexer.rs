//! The streaming lexer (spec.md §4.1).
//!
//! Tokens are produced one at a time from a char cursor kept over a `Vec<char>`
//! rather than a `Peekable<Chars>`: a handful of constructs (string-prefix
//! detection, the `new X` compound identifier) need to look ahead past more
//! than the single character `Peekable` gives us, decide there's no match,
//! and carry on as if nothing had been consumed. A cursor makes that a plain
//! save/restore of three integers instead of a lookahead buffer.

use crate::error::{CanifError, LexErrorKind, Span};
use crate::token::{apply_prefix, is_prefix_letter, StringPrefix, Token, TokenKind};

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    col: usize,
    offset: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    offset: usize,
    lookahead: Option<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            offset: 0,
            lookahead: None,
        }
    }

    pub fn peek(&mut self) -> Result<&Token, CanifError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lex_one()?);
        }
        Ok(self.lookahead.as_ref().unwrap())
    }

    pub fn consume(&mut self) -> Result<Token, CanifError> {
        if let Some(tok) = self.lookahead.take() {
            return Ok(tok);
        }
        self.lex_one()
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
            offset: self.offset,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.col = mark.col;
        self.offset = mark.offset;
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
            offset: self.offset,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += 1;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char_at(1) == Some('/') => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_one(&mut self) -> Result<Token, CanifError> {
        self.skip_trivia();
        let start = self.span();
        let Some(c) = self.peek_char() else {
            return Ok(Token::eof(start));
        };

        match c {
            '{' | '}' | '[' | ']' | '(' | ')' | ',' | ':' => {
                self.advance();
                Ok(Token {
                    kind: TokenKind::Punct(c),
                    lexeme: c.to_string(),
                    decoded: None,
                    span: start,
                })
            }
            '<' => self.lex_repr_blob(start),
            '-' => self.lex_minus(start),
            '0'..='9' => self.lex_number(start),
            c if is_prefix_letter(c) || c == '\'' || c == '"' => {
                self.lex_string_or_ident(start)
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.lex_ident(start),
            _ => Err(CanifError::lex(
                LexErrorKind::UnrecognisedChar,
                start,
                format!("unrecognised character '{c}'"),
            )),
        }
    }

    fn lex_minus(&mut self, start: Span) -> Result<Token, CanifError> {
        match self.peek_char_at(1) {
            Some(c) if c.is_ascii_digit() => self.lex_number(start),
            Some('I') if self.matches_ahead(1, "Infinity") => {
                self.advance(); // '-'
                for _ in "Infinity".chars() {
                    self.advance();
                }
                Ok(Token {
                    kind: TokenKind::Ident,
                    lexeme: "-Infinity".to_string(),
                    decoded: None,
                    span: start,
                })
            }
            _ => {
                self.advance();
                Err(CanifError::lex(
                    LexErrorKind::UnrecognisedChar,
                    start,
                    "unrecognised character '-'",
                ))
            }
        }
    }

    fn matches_ahead(&self, offset: usize, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(i, c)| self.peek_char_at(offset + i) == Some(c))
    }

    fn lex_number(&mut self, start: Span) -> Result<Token, CanifError> {
        let mut lexeme = String::new();
        if self.peek_char() == Some('-') {
            lexeme.push(self.advance().unwrap());
        }

        if self.peek_char() == Some('0') && matches!(self.peek_char_at(1), Some('x')) {
            lexeme.push(self.advance().unwrap()); // '0'
            lexeme.push(self.advance().unwrap()); // 'x'
            while let Some(c) = self.peek_char() {
                if c.is_ascii_hexdigit() {
                    lexeme.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
            return Ok(Token {
                kind: TokenKind::Number,
                lexeme,
                decoded: None,
                span: start,
            });
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                lexeme.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        if self.peek_char() == Some('.') && matches!(self.peek_char_at(1), Some(c) if c.is_ascii_digit())
        {
            lexeme.push(self.advance().unwrap()); // '.'
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    lexeme.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let mark = self.mark();
            let mut exp = String::new();
            exp.push(self.advance().unwrap());
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                exp.push(self.advance().unwrap());
            }
            let mut digits = String::new();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    digits.push(self.advance().unwrap());
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                self.reset(mark);
            } else {
                lexeme.push_str(&exp);
                lexeme.push_str(&digits);
            }
        }

        Ok(Token {
            kind: TokenKind::Number,
            lexeme,
            decoded: None,
            span: start,
        })
    }

    fn lex_repr_blob(&mut self, start: Span) -> Result<Token, CanifError> {
        self.advance(); // '<'
        let mut inner = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(CanifError::lex(
                        LexErrorKind::UnterminatedReprBlob,
                        start,
                        "unterminated repr-blob",
                    ))
                }
                Some('>') => {
                    self.advance();
                    break;
                }
                Some('<') => {
                    return Err(CanifError::lex(
                        LexErrorKind::UnterminatedReprBlob,
                        start,
                        "nested '<' inside repr-blob",
                    ))
                }
                Some(c) => {
                    inner.push(c);
                    self.advance();
                }
            }
        }
        let lexeme = format!("<{inner}>");
        Ok(Token {
            kind: TokenKind::ReprBlob,
            lexeme,
            decoded: Some(inner),
            span: start,
        })
    }

    fn lex_string_or_ident(&mut self, start: Span) -> Result<Token, CanifError> {
        let start_idx = self.pos;
        let mark = self.mark();
        let mut prefix = StringPrefix::default();
        let mut seen = 0;
        while seen < 2 {
            match self.peek_char() {
                Some(c) if is_prefix_letter(c) => {
                    apply_prefix(&mut prefix, c);
                    self.advance();
                    seen += 1;
                }
                _ => break,
            }
        }

        if matches!(self.peek_char(), Some('\'') | Some('"')) {
            return self.lex_string_body(start, start_idx, prefix);
        }

        // Not a string after all (e.g. a bare identifier starting with `r`,
        // `b`, `u` or `f`); rewind and lex it as a plain identifier.
        self.reset(mark);
        self.lex_ident(start)
    }

    fn lex_string_body(
        &mut self,
        start: Span,
        start_idx: usize,
        prefix: StringPrefix,
    ) -> Result<Token, CanifError> {
        let quote = self.advance().unwrap(); // '\'' or '"'
        let mut body = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(CanifError::lex(
                        LexErrorKind::UnterminatedString,
                        start,
                        "unterminated string literal",
                    ))
                }
                Some('\n') => {
                    return Err(CanifError::lex(
                        LexErrorKind::UnterminatedString,
                        start,
                        "newline in string literal",
                    ))
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') if !prefix.raw => {
                    body.push(self.advance().unwrap());
                    match self.peek_char() {
                        None => {
                            return Err(CanifError::lex(
                                LexErrorKind::UnterminatedString,
                                start,
                                "unterminated string literal",
                            ))
                        }
                        Some(escaped) => {
                            body.push(escaped);
                            self.advance();
                        }
                    }
                }
                Some(c) => {
                    body.push(c);
                    self.advance();
                }
            }
        }

        let lexeme: String = self.chars[start_idx..self.pos].iter().collect();

        let decoded = if prefix.is_literal() {
            body
        } else {
            crate::escape::decode_escapes(&body, quote, start)?
        };

        Ok(Token {
            kind: TokenKind::String(prefix),
            lexeme,
            decoded: Some(decoded),
            span: start,
        })
    }

    fn lex_ident(&mut self, start: Span) -> Result<Token, CanifError> {
        let mut lexeme = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                lexeme.push(self.advance().unwrap());
            } else {
                break;
            }
        }

        if lexeme == "new" {
            let mark = self.mark();
            self.skip_trivia();
            if matches!(self.peek_char(), Some(c) if c.is_alphabetic() || c == '_' || c == '$') {
                let mut rest = String::new();
                while let Some(c) = self.peek_char() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        rest.push(self.advance().unwrap());
                    } else {
                        break;
                    }
                }
                if !rest.is_empty() {
                    return Ok(Token {
                        kind: TokenKind::Ident,
                        lexeme: format!("new {rest}"),
                        decoded: None,
                        span: start,
                    });
                }
            }
            self.reset(mark);
        }

        Ok(Token {
            kind: TokenKind::Ident,
            lexeme,
            decoded: None,
            span: start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = vec![];
        loop {
            let tok = lexer.consume().unwrap();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn lexes_punctuation() {
        assert_eq!(
            kinds("{}[](),:"),
            vec![
                TokenKind::Punct('{'),
                TokenKind::Punct('}'),
                TokenKind::Punct('['),
                TokenKind::Punct(']'),
                TokenKind::Punct('('),
                TokenKind::Punct(')'),
                TokenKind::Punct(','),
                TokenKind::Punct(':'),
            ]
        );
    }

    #[test]
    fn lexes_plain_string() {
        let mut lexer = Lexer::new(r#""hello""#);
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.lexeme, r#""hello""#);
        assert_eq!(tok.decoded.as_deref(), Some("hello"));
    }

    #[test]
    fn lexes_single_quoted_string() {
        let mut lexer = Lexer::new("'hi there'");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.decoded.as_deref(), Some("hi there"));
    }

    #[test]
    fn lexes_raw_string_keeps_backslashes() {
        let mut lexer = Lexer::new(r"r'Hell\w'");
        let tok = lexer.consume().unwrap();
        match tok.kind {
            TokenKind::String(prefix) => assert!(prefix.raw),
            _ => panic!("expected string token"),
        }
        assert_eq!(tok.decoded.as_deref(), Some(r"Hell\w"));
    }

    #[test]
    fn lexes_binary_prefixed_escape() {
        let mut lexer = Lexer::new(r#"b"Hell\x6F""#);
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.decoded.as_deref(), Some("Hello"));
    }

    #[test]
    fn distinguishes_prefix_letter_from_bare_ident() {
        let mut lexer = Lexer::new("raw_value");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.lexeme, "raw_value");
    }

    #[test]
    fn lexes_hex_number() {
        let mut lexer = Lexer::new("0x1F");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.kind, TokenKind::Number);
        assert_eq!(tok.lexeme, "0x1F");
    }

    #[test]
    fn lexes_negative_float_with_exponent() {
        let mut lexer = Lexer::new("-3.25e-10");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.lexeme, "-3.25e-10");
    }

    #[test]
    fn lexes_neg_infinity_as_single_ident() {
        let mut lexer = Lexer::new("-Infinity");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.lexeme, "-Infinity");
    }

    #[test]
    fn combines_new_and_identifier() {
        let mut lexer = Lexer::new("new Date");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.lexeme, "new Date");
    }

    #[test]
    fn lexes_repr_blob() {
        let mut lexer = Lexer::new("<object at 0x1f>");
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.kind, TokenKind::ReprBlob);
        assert_eq!(tok.decoded.as_deref(), Some("object at 0x1f"));
    }

    #[test]
    fn rejects_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        assert!(lexer.consume().is_err());
    }

    #[test]
    fn rejects_unrecognised_character() {
        let mut lexer = Lexer::new("@");
        assert!(lexer.consume().is_err());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("42");
        let peeked = lexer.peek().unwrap().clone();
        let consumed = lexer.consume().unwrap();
        assert_eq!(peeked, consumed);
    }

    #[test]
    fn skips_line_comments() {
        let mut lexer = Lexer::new("1 // trailing comment\n,2");
        let first = lexer.consume().unwrap();
        assert_eq!(first.lexeme, "1");
        let comma = lexer.consume().unwrap();
        assert_eq!(comma.kind, TokenKind::Punct(','));
    }
}
