//! The recursive-descent event parser (spec.md §4.2).
//!
//! Rather than recursing through native call frames — which would hold the
//! whole nesting path on the machine stack and makes "pull one event, do no
//! more work than required" an awkward fit for an `Iterator` — parsing is
//! expressed as an explicit pushdown automaton. `containers` tracks the
//! currently-open containers (depth-bounded, one entry per nesting level);
//! `instr` is the continuation stack: each entry says what to do next, and
//! pushing `[continue-this-container, parse-a-value]` in that order (so the
//! value runs first, LIFO) is the direct translation of a recursive call
//! followed by "then resume the caller". `pending` briefly holds events a
//! single step produced before they are handed back one at a time.

use std::collections::VecDeque;

use crate::error::{CanifError, ParseErrorKind};
use crate::event::{Atom, AtomKind, MapKey, MapKeyKind, ParseEvent};
use crate::lexer::Lexer;
use crate::reserved::Reserved;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    /// A `{` whose map-vs-set identity hasn't been decided yet.
    Undetermined,
    Map,
    Set,
    Array,
    Tuple,
}

struct Frame {
    kind: ContainerKind,
    count: usize,
}

#[derive(Debug, Clone, Copy)]
enum Instr {
    ParseValue,
    ExpectEof,
    BraceDecide,
    ContainerBeforeItem,
    ContainerAfterItem,
    MapBeforeKey,
    MapAfterValue,
}

pub struct Parser {
    lexer: Lexer,
    containers: Vec<Frame>,
    instr: Vec<Instr>,
    pending: VecDeque<ParseEvent>,
    done: bool,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            containers: Vec::new(),
            instr: vec![Instr::ExpectEof, Instr::ParseValue],
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn step(&mut self, instr: Instr) -> Result<(), CanifError> {
        match instr {
            Instr::ParseValue => self.do_parse_value(),
            Instr::ExpectEof => self.do_expect_eof(),
            Instr::BraceDecide => self.do_brace_decide(),
            Instr::ContainerBeforeItem => self.do_container_before_item(),
            Instr::ContainerAfterItem => self.do_container_after_item(),
            Instr::MapBeforeKey => self.do_map_before_key(),
            Instr::MapAfterValue => self.do_map_after_value(),
        }
    }

    fn do_parse_value(&mut self) -> Result<(), CanifError> {
        let tok = self.lexer.peek()?.clone();
        match &tok.kind {
            TokenKind::Punct('{') => self.begin_brace(),
            TokenKind::Punct('[') => self.begin_array(),
            TokenKind::Punct('(') => self.begin_tuple(),
            TokenKind::Number | TokenKind::String(_) | TokenKind::ReprBlob => {
                self.lexer.consume()?;
                self.pending.push_back(ParseEvent::Atom(token_to_atom(tok)));
                Ok(())
            }
            TokenKind::Ident => {
                self.lexer.consume()?;
                if matches!(self.lexer.peek()?.kind, TokenKind::Punct('(')) {
                    self.pending.push_back(ParseEvent::FunctionCall {
                        head: tok.lexeme.clone(),
                        span: tok.span,
                    });
                    self.begin_tuple()
                } else {
                    self.pending.push_back(ParseEvent::Atom(token_to_atom(tok)));
                    Ok(())
                }
            }
            TokenKind::Eof => Err(CanifError::parse(
                ParseErrorKind::ValueExpected,
                tok.span,
                "expected a value, found end of input",
            )),
            TokenKind::Punct(c) => Err(CanifError::parse(
                ParseErrorKind::UnexpectedToken,
                tok.span,
                format!("unexpected '{c}' where a value was expected"),
            )),
        }
    }

    fn do_expect_eof(&mut self) -> Result<(), CanifError> {
        let tok = self.lexer.peek()?.clone();
        if matches!(tok.kind, TokenKind::Eof) {
            self.done = true;
            Ok(())
        } else {
            Err(CanifError::parse(
                ParseErrorKind::TrailingData,
                tok.span,
                format!("trailing data after top-level value: '{}'", tok.lexeme),
            ))
        }
    }

    fn begin_brace(&mut self) -> Result<(), CanifError> {
        self.lexer.consume()?; // '{'
        self.containers.push(Frame {
            kind: ContainerKind::Undetermined,
            count: 0,
        });
        self.instr.push(Instr::BraceDecide);
        Ok(())
    }

    fn begin_array(&mut self) -> Result<(), CanifError> {
        self.lexer.consume()?; // '['
        self.containers.push(Frame {
            kind: ContainerKind::Array,
            count: 0,
        });
        self.pending.push_back(ParseEvent::ArrayOpen);
        self.instr.push(Instr::ContainerBeforeItem);
        Ok(())
    }

    fn begin_tuple(&mut self) -> Result<(), CanifError> {
        self.lexer.consume()?; // '('
        self.containers.push(Frame {
            kind: ContainerKind::Tuple,
            count: 0,
        });
        self.pending.push_back(ParseEvent::TupleOpen);
        self.instr.push(Instr::ContainerBeforeItem);
        Ok(())
    }

    /// Decide whether a just-opened `{` is a map or a set. Per spec.md §4.2,
    /// this only needs to look at the token right after the first key
    /// candidate, so it buffers at most that one token.
    fn do_brace_decide(&mut self) -> Result<(), CanifError> {
        let tok = self.lexer.peek()?.clone();

        if matches!(tok.kind, TokenKind::Punct('}')) {
            self.lexer.consume()?;
            self.containers.last_mut().unwrap().kind = ContainerKind::Map;
            self.pending.push_back(ParseEvent::MapOpen);
            self.pending.push_back(ParseEvent::MapClose { count: 0 });
            self.containers.pop();
            return Ok(());
        }

        if is_key_candidate(&tok.kind) {
            let key_tok = self.lexer.consume()?;
            let after = self.lexer.peek()?.clone();
            if matches!(after.kind, TokenKind::Punct(':')) {
                self.lexer.consume()?;
                self.containers.last_mut().unwrap().kind = ContainerKind::Map;
                self.pending.push_back(ParseEvent::MapOpen);
                self.pending.push_back(ParseEvent::MapKey(make_map_key(key_tok)));
                self.instr.push(Instr::MapAfterValue);
                self.instr.push(Instr::ParseValue);
            } else if matches!(key_tok.kind, TokenKind::Ident) && matches!(after.kind, TokenKind::Punct('(')) {
                // The key candidate is actually the head of a function-call
                // value (`{ObjectId("x"), 2}`), not a finished atom: emit it
                // the same way `do_parse_value` would and parse its argument
                // tuple before returning to the set's after-item bookkeeping.
                self.containers.last_mut().unwrap().kind = ContainerKind::Set;
                self.pending.push_back(ParseEvent::SetOpen);
                self.pending.push_back(ParseEvent::FunctionCall {
                    head: key_tok.lexeme.clone(),
                    span: key_tok.span,
                });
                self.instr.push(Instr::ContainerAfterItem);
                self.begin_tuple()?;
            } else {
                self.containers.last_mut().unwrap().kind = ContainerKind::Set;
                self.pending.push_back(ParseEvent::SetOpen);
                self.pending.push_back(ParseEvent::Atom(token_to_atom(key_tok)));
                self.instr.push(Instr::ContainerAfterItem);
            }
            return Ok(());
        }

        // Anything else can't be a map key, so this is a set whose first
        // member is itself a full (possibly nested) value.
        self.containers.last_mut().unwrap().kind = ContainerKind::Set;
        self.pending.push_back(ParseEvent::SetOpen);
        self.instr.push(Instr::ContainerAfterItem);
        self.instr.push(Instr::ParseValue);
        Ok(())
    }

    /// Entered before each array/tuple/set item, including the first. Only
    /// arrays permit a bare comma here (an empty slot).
    fn do_container_before_item(&mut self) -> Result<(), CanifError> {
        let kind = self.containers.last().unwrap().kind;
        let close = closing_char(kind);
        let tok = self.lexer.peek()?.clone();

        match &tok.kind {
            TokenKind::Punct(c) if *c == close => {
                self.lexer.consume()?;
                let frame = self.containers.pop().unwrap();
                self.pending.push_back(close_event(kind, frame.count));
                Ok(())
            }
            TokenKind::Punct(',') if kind == ContainerKind::Array => {
                self.lexer.consume()?;
                let frame = self.containers.last_mut().unwrap();
                frame.count += 1;
                self.pending.push_back(ParseEvent::Atom(Atom {
                    kind: AtomKind::EmptySlot,
                    lexeme: String::new(),
                    decoded: None,
                    span: tok.span,
                }));
                self.instr.push(Instr::ContainerBeforeItem);
                Ok(())
            }
            TokenKind::Punct(',') => Err(CanifError::parse(
                ParseErrorKind::UnexpectedToken,
                tok.span,
                "empty items are not allowed here",
            )),
            TokenKind::Eof => Err(CanifError::parse(
                ParseErrorKind::UnterminatedContainer,
                tok.span,
                "unterminated container",
            )),
            _ => {
                self.instr.push(Instr::ContainerAfterItem);
                self.instr.push(Instr::ParseValue);
                Ok(())
            }
        }
    }

    /// Entered once the value for the current item has been fully parsed.
    fn do_container_after_item(&mut self) -> Result<(), CanifError> {
        let kind = {
            let frame = self.containers.last_mut().unwrap();
            frame.count += 1;
            frame.kind
        };
        let close = closing_char(kind);
        let tok = self.lexer.peek()?.clone();

        match &tok.kind {
            TokenKind::Punct(c) if *c == close => {
                self.lexer.consume()?;
                let frame = self.containers.pop().unwrap();
                self.pending.push_back(close_event(kind, frame.count));
                Ok(())
            }
            TokenKind::Punct(',') => {
                self.lexer.consume()?;
                self.instr.push(Instr::ContainerBeforeItem);
                Ok(())
            }
            TokenKind::Eof => Err(CanifError::parse(
                ParseErrorKind::UnterminatedContainer,
                tok.span,
                "unterminated container",
            )),
            _ => Err(CanifError::parse(
                ParseErrorKind::UnexpectedToken,
                tok.span,
                format!("expected ',' or '{close}', found '{}'", tok.lexeme),
            )),
        }
    }

    fn do_map_before_key(&mut self) -> Result<(), CanifError> {
        let tok = self.lexer.peek()?.clone();

        if matches!(tok.kind, TokenKind::Punct('}')) {
            self.lexer.consume()?;
            let frame = self.containers.pop().unwrap();
            self.pending.push_back(ParseEvent::MapClose { count: frame.count });
            return Ok(());
        }

        if !is_key_candidate(&tok.kind) {
            return Err(CanifError::parse(
                ParseErrorKind::UnexpectedToken,
                tok.span,
                "expected a map key",
            ));
        }

        let key_tok = self.lexer.consume()?;
        let colon = self.lexer.peek()?.clone();
        if !matches!(colon.kind, TokenKind::Punct(':')) {
            return Err(CanifError::parse(
                ParseErrorKind::MissingColon,
                colon.span,
                "expected ':' after map key",
            ));
        }
        self.lexer.consume()?;
        self.pending.push_back(ParseEvent::MapKey(make_map_key(key_tok)));
        self.instr.push(Instr::MapAfterValue);
        self.instr.push(Instr::ParseValue);
        Ok(())
    }

    fn do_map_after_value(&mut self) -> Result<(), CanifError> {
        self.containers.last_mut().unwrap().count += 1;
        let tok = self.lexer.peek()?.clone();

        match &tok.kind {
            TokenKind::Punct('}') => {
                self.lexer.consume()?;
                let frame = self.containers.pop().unwrap();
                self.pending.push_back(ParseEvent::MapClose { count: frame.count });
                Ok(())
            }
            TokenKind::Punct(',') => {
                self.lexer.consume()?;
                self.instr.push(Instr::MapBeforeKey);
                Ok(())
            }
            TokenKind::Eof => Err(CanifError::parse(
                ParseErrorKind::UnterminatedContainer,
                tok.span,
                "unterminated map",
            )),
            _ => Err(CanifError::parse(
                ParseErrorKind::UnexpectedToken,
                tok.span,
                format!("expected ',' or '}}', found '{}'", tok.lexeme),
            )),
        }
    }
}

impl Iterator for Parser {
    type Item = Result<ParseEvent, CanifError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ev) = self.pending.pop_front() {
                return Some(Ok(ev));
            }
            if self.done {
                return None;
            }
            let Some(instr) = self.instr.pop() else {
                self.done = true;
                return None;
            };
            if let Err(e) = self.step(instr) {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

fn is_key_candidate(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Ident | TokenKind::String(_) | TokenKind::Number)
}

fn closing_char(kind: ContainerKind) -> char {
    match kind {
        ContainerKind::Array => ']',
        ContainerKind::Tuple => ')',
        ContainerKind::Set => '}',
        ContainerKind::Map | ContainerKind::Undetermined => '}',
    }
}

fn close_event(kind: ContainerKind, count: usize) -> ParseEvent {
    match kind {
        ContainerKind::Array => ParseEvent::ArrayClose { count },
        ContainerKind::Tuple => ParseEvent::TupleClose { count },
        ContainerKind::Set => ParseEvent::SetClose { count },
        ContainerKind::Map | ContainerKind::Undetermined => ParseEvent::MapClose { count },
    }
}

fn token_to_atom(tok: Token) -> Atom {
    let kind = match &tok.kind {
        TokenKind::Number => AtomKind::Number,
        TokenKind::String(prefix) => AtomKind::String(*prefix),
        TokenKind::ReprBlob => AtomKind::ReprBlob,
        TokenKind::Ident => match Reserved::lookup(&tok.lexeme) {
            Some(r) => AtomKind::Reserved(r),
            None => AtomKind::Ident,
        },
        TokenKind::Punct(_) | TokenKind::Eof => unreachable!("not an atom token"),
    };
    Atom {
        kind,
        lexeme: tok.lexeme,
        decoded: tok.decoded,
        span: tok.span,
    }
}

fn make_map_key(tok: Token) -> MapKey {
    match &tok.kind {
        TokenKind::Ident => MapKey {
            kind: MapKeyKind::Bare,
            lexeme: tok.lexeme.clone(),
            decoded: tok.lexeme,
            span: tok.span,
        },
        TokenKind::String(_) => MapKey {
            kind: MapKeyKind::QuotedString,
            lexeme: tok.lexeme,
            decoded: tok.decoded.unwrap_or_default(),
            span: tok.span,
        },
        TokenKind::Number => MapKey {
            kind: MapKeyKind::QuotedNumber,
            lexeme: tok.lexeme.clone(),
            decoded: tok.lexeme,
            span: tok.span,
        },
        _ => unreachable!("not a key candidate token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<ParseEvent> {
        Parser::new(input).map(|r| r.unwrap()).collect()
    }

    fn try_events(input: &str) -> Result<Vec<ParseEvent>, CanifError> {
        Parser::new(input).collect()
    }

    #[test]
    fn parses_plain_object() {
        let evs = events(r#"{"a": 1}"#);
        assert_eq!(evs.len(), 4);
        assert!(matches!(evs[0], ParseEvent::MapOpen));
        assert!(matches!(&evs[1], ParseEvent::MapKey(k) if k.decoded == "a"));
        assert!(matches!(&evs[2], ParseEvent::Atom(a) if a.lexeme == "1"));
        assert!(matches!(evs[3], ParseEvent::MapClose { count: 1 }));
    }

    #[test]
    fn parses_empty_map() {
        let evs = events("{}");
        assert_eq!(evs, vec![ParseEvent::MapOpen, ParseEvent::MapClose { count: 0 }]);
    }

    #[test]
    fn parses_empty_array_and_tuple() {
        assert_eq!(events("[]"), vec![ParseEvent::ArrayOpen, ParseEvent::ArrayClose { count: 0 }]);
        assert_eq!(events("()"), vec![ParseEvent::TupleOpen, ParseEvent::TupleClose { count: 0 }]);
    }

    #[test]
    fn parses_set_from_braces_without_colon() {
        let evs = events("{1, 2}");
        assert!(matches!(evs[0], ParseEvent::SetOpen));
        assert!(matches!(evs.last().unwrap(), ParseEvent::SetClose { count: 2 }));
    }

    #[test]
    fn rejects_empty_set_braces_with_bare_comma() {
        // `{,}` is not accepted: a lone comma can't start either a map key
        // or a set value.
        assert!(try_events("{,}").is_err());
    }

    #[test]
    fn parses_function_call_as_tuple_events() {
        let evs = events(r#"myfunc("a1", null, "a2")"#);
        assert!(matches!(&evs[0], ParseEvent::FunctionCall { head, .. } if head == "myfunc"));
        assert!(matches!(evs[1], ParseEvent::TupleOpen));
        assert!(matches!(evs.last().unwrap(), ParseEvent::TupleClose { count: 3 }));
    }

    #[test]
    fn parses_new_expression_head() {
        let evs = events("new Date(2020)");
        assert!(matches!(&evs[0], ParseEvent::FunctionCall { head, .. } if head == "new Date"));
    }

    #[test]
    fn array_with_adjacent_commas_has_two_empty_slots() {
        let evs = events("[1,,,4]");
        assert_eq!(evs.len(), 6); // open, 1, empty, empty, 4, close
        assert!(matches!(evs[2], ParseEvent::Atom(Atom { kind: AtomKind::EmptySlot, .. })));
        assert!(matches!(evs[3], ParseEvent::Atom(Atom { kind: AtomKind::EmptySlot, .. })));
        assert!(matches!(evs.last().unwrap(), ParseEvent::ArrayClose { count: 4 }));
    }

    #[test]
    fn rejects_consecutive_commas_in_tuple() {
        assert!(try_events("(1,,2)").is_err());
    }

    #[test]
    fn accepts_trailing_comma_everywhere() {
        assert!(try_events("[1,]").is_ok());
        assert!(try_events("(1,)").is_ok());
        assert!(try_events("{1,}").is_ok());
        assert!(try_events(r#"{"a": 1,}"#).is_ok());
    }

    #[test]
    fn rejects_trailing_data() {
        assert!(try_events("1 2").is_err());
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(try_events(r#"{"a" 1}"#).is_err());
    }

    #[test]
    fn deeply_nested_arrays_parse() {
        let depth = 64;
        let input = format!("{}{}{}", "[".repeat(depth), "1", "]".repeat(depth));
        let evs = events(&input);
        assert_eq!(evs.len(), depth * 2 + 1);
    }

    #[test]
    fn set_with_nested_value_as_first_member() {
        let evs = events("{[1, 2], 3}");
        assert!(matches!(evs[0], ParseEvent::SetOpen));
        assert!(matches!(evs[1], ParseEvent::ArrayOpen));
    }

    #[test]
    fn set_with_function_call_as_first_member() {
        // An ident-headed call as the first brace item must not be mistaken
        // for a finished bare-identifier atom: the `(` that follows still
        // needs to open its argument tuple.
        let evs = events(r#"{ObjectId("x"), 2}"#);
        assert!(matches!(evs[0], ParseEvent::SetOpen));
        assert!(matches!(&evs[1], ParseEvent::FunctionCall { head, .. } if head == "ObjectId"));
        assert!(matches!(evs[2], ParseEvent::TupleOpen));
        assert!(matches!(evs.last().unwrap(), ParseEvent::SetClose { count: 2 }));
    }

    #[test]
    fn set_with_function_call_as_sole_member() {
        let evs = events(r#"{f(a)}"#);
        assert!(matches!(evs[0], ParseEvent::SetOpen));
        assert!(matches!(&evs[1], ParseEvent::FunctionCall { head, .. } if head == "f"));
        assert!(matches!(evs.last().unwrap(), ParseEvent::SetClose { count: 1 }));
    }
}
