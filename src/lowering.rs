//! JSON lowering (spec.md §4.3): a streaming event transformer that rewrites
//! every non-JSON construct into an equivalent built from `MapOpen`/`MapKey`/
//! `ArrayOpen` events only. Active whenever `-j/--json-output` is selected.
//!
//! Like the parser, this is written as an explicit adapter rather than a
//! generator: `pending` holds the handful of synthetic events a single input
//! event sometimes expands into (e.g. `SetOpen` becomes three events), and
//! `wrap_stack` remembers, per open container, whether its matching close
//! needs an extra synthetic `MapClose` emitted alongside it.

use std::collections::VecDeque;

use crate::error::{CanifError, Span};
use crate::event::{Atom, AtomKind, MapKey, MapKeyKind, ParseEvent};
use crate::reserved::Reserved;
use crate::token::StringPrefix;

pub struct JsonLowerer<I> {
    inner: I,
    pending: VecDeque<ParseEvent>,
    wrap_stack: Vec<bool>,
    pending_call: Option<(String, Span)>,
}

impl<I> JsonLowerer<I> {
    pub fn new(inner: I) -> Self {
        JsonLowerer {
            inner,
            pending: VecDeque::new(),
            wrap_stack: Vec::new(),
            pending_call: None,
        }
    }
}

impl<I: Iterator<Item = Result<ParseEvent, CanifError>>> Iterator for JsonLowerer<I> {
    type Item = Result<ParseEvent, CanifError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(Ok(ev));
        }

        loop {
            let ev = match self.inner.next()? {
                Ok(ev) => ev,
                Err(e) => return Some(Err(e)),
            };

            match ev {
                ParseEvent::FunctionCall { head, span } => {
                    // Per the parser's invariant, a TupleOpen always follows
                    // immediately; fold the tag into that event instead of
                    // emitting anything here.
                    self.pending_call = Some((head, span));
                    continue;
                }
                ParseEvent::TupleOpen => {
                    if let Some((head, span)) = self.pending_call.take() {
                        self.wrap_stack.push(true);
                        self.pending.push_back(ParseEvent::MapKey(tag_key(call_tag(&head), span)));
                        self.pending.push_back(ParseEvent::ArrayOpen);
                        return Some(Ok(ParseEvent::MapOpen));
                    }
                    self.wrap_stack.push(false);
                    return Some(Ok(ParseEvent::ArrayOpen));
                }
                ParseEvent::TupleClose { count } => {
                    let wrapped = self.wrap_stack.pop().unwrap_or(false);
                    if wrapped {
                        self.pending.push_back(ParseEvent::MapClose { count: 1 });
                    }
                    return Some(Ok(ParseEvent::ArrayClose { count }));
                }
                ParseEvent::SetOpen => {
                    self.wrap_stack.push(true);
                    self.pending
                        .push_back(ParseEvent::MapKey(tag_key("$set".to_string(), Span::default())));
                    self.pending.push_back(ParseEvent::ArrayOpen);
                    return Some(Ok(ParseEvent::MapOpen));
                }
                ParseEvent::SetClose { count } => {
                    self.wrap_stack.pop();
                    self.pending.push_back(ParseEvent::MapClose { count: 1 });
                    return Some(Ok(ParseEvent::ArrayClose { count }));
                }
                ParseEvent::MapKey(key) => return Some(Ok(ParseEvent::MapKey(lower_map_key(key)))),
                ParseEvent::Atom(atom) => return Some(Ok(ParseEvent::Atom(lower_atom(atom)))),
                other @ (ParseEvent::MapOpen | ParseEvent::MapClose { .. } | ParseEvent::ArrayOpen
                | ParseEvent::ArrayClose { .. }) => return Some(Ok(other)),
            }
        }
    }
}

/// `oid(...)` gets the literal `$oid` tag; every other head, including the
/// other BSON constructors, falls through to the generic `$$`+head rule.
/// This precheck must run before the generic rule, never after, or a
/// generic pass would have already claimed `oid` under `$$oid`.
fn call_tag(head: &str) -> String {
    if head == "oid" {
        "$oid".to_string()
    } else {
        format!("$${head}")
    }
}

fn tag_key(tag: String, span: Span) -> MapKey {
    MapKey {
        kind: MapKeyKind::QuotedString,
        lexeme: format!("\"{tag}\""),
        decoded: tag,
        span,
    }
}

fn lower_map_key(key: MapKey) -> MapKey {
    match key.kind {
        MapKeyKind::Bare => MapKey {
            kind: MapKeyKind::QuotedString,
            ..key
        },
        MapKeyKind::QuotedString | MapKeyKind::QuotedNumber => key,
    }
}

fn lower_atom(atom: Atom) -> Atom {
    match atom.kind {
        AtomKind::Number => {
            let lexeme = lower_number_lexeme(&atom.lexeme);
            Atom {
                kind: AtomKind::Number,
                lexeme,
                decoded: None,
                span: atom.span,
            }
        }
        AtomKind::String(_) => {
            let decoded = atom.decoded.unwrap_or_default();
            Atom {
                kind: AtomKind::String(StringPrefix::default()),
                lexeme: decoded.clone(),
                decoded: Some(decoded),
                span: atom.span,
            }
        }
        AtomKind::Reserved(r) => {
            let canon = lower_reserved(r);
            Atom {
                kind: AtomKind::Reserved(canon),
                lexeme: reserved_lexeme(canon).to_string(),
                decoded: None,
                span: atom.span,
            }
        }
        AtomKind::Ident => {
            let tagged = format!("$${}", atom.lexeme);
            Atom {
                kind: AtomKind::String(StringPrefix::default()),
                lexeme: tagged.clone(),
                decoded: Some(tagged),
                span: atom.span,
            }
        }
        AtomKind::ReprBlob => {
            let inner = atom.decoded.unwrap_or_default();
            let tagged = format!("$repr<{inner}>");
            Atom {
                kind: AtomKind::String(StringPrefix::default()),
                lexeme: tagged.clone(),
                decoded: Some(tagged),
                span: atom.span,
            }
        }
        AtomKind::EmptySlot => Atom {
            kind: AtomKind::Reserved(Reserved::Null),
            lexeme: "null".to_string(),
            decoded: None,
            span: atom.span,
        },
    }
}

fn lower_reserved(r: Reserved) -> Reserved {
    match r {
        Reserved::True | Reserved::PyTrue => Reserved::True,
        Reserved::False | Reserved::PyFalse => Reserved::False,
        Reserved::Null
        | Reserved::PyNone
        | Reserved::NaN
        | Reserved::Infinity
        | Reserved::NegInfinity
        | Reserved::Undefined => Reserved::Null,
    }
}

pub(crate) fn reserved_lexeme(r: Reserved) -> &'static str {
    match r {
        Reserved::True => "true",
        Reserved::False => "false",
        Reserved::Null => "null",
        // lower_reserved never produces these, but the mapping is total.
        Reserved::PyNone
        | Reserved::PyTrue
        | Reserved::PyFalse
        | Reserved::NaN
        | Reserved::Infinity
        | Reserved::NegInfinity
        | Reserved::Undefined => "null",
    }
}

/// Hex integer literals have no JSON equivalent syntax; JSON-mode output
/// must carry them as ordinary decimal numbers. Everything else (decimal
/// integers, fractions, exponents) is already valid JSON number syntax and
/// passes through untouched, preserving numeric-lexeme fidelity.
fn lower_number_lexeme(lexeme: &str) -> String {
    let (negative, rest) = match lexeme.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, lexeme),
    };
    let hex_digits = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"));
    match hex_digits.and_then(|digits| u128::from_str_radix(digits, 16).ok()) {
        Some(value) if negative => format!("-{value}"),
        Some(value) => value.to_string(),
        None => lexeme.to_string(),
    }
}
