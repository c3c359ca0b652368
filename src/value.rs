//! `load()`: an in-memory convenience wrapper over the event stream
//! (spec.md §6). This is explicitly a "trivial re-consumer" sitting outside
//! the streaming core — it builds a full tree and so trades the bounded
//! per-depth memory the rest of the pipeline guarantees for ordinary
//! in-memory ergonomics. Useful for callers who want a value rather than an
//! event stream and don't care about arbitrarily large input.

use std::io::Read;

use crate::error::CanifError;
use crate::event::{Atom, AtomKind, MapKeyKind, ParseEvent};
use crate::parser::Parser;
use crate::reserved::Reserved;

/// A mapping key: `spec.md` §6 allows both string/identifier and numeric
/// keys, which plain JSON (and so `serde_json::Value`) cannot represent —
/// hence this crate's own tree type rather than reusing `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Str(String),
    Number(String),
}

impl Key {
    fn as_str(&self) -> &str {
        match self {
            Key::Str(s) => s,
            Key::Number(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Kept as the original textual lexeme: spec.md §9 requires no
    /// conversion through a floating-point representation.
    Number(String),
    Str(String),
    Array(Vec<Value>),
    Map(Vec<(Key, Value)>),
}

/// Hand-written rather than derived: `Value::Map` is a `Vec<(Key, Value)>`
/// (ordered, and keyed by a type `serde`'s map derive doesn't know how to
/// flatten into `{..}`), so the shape needs an explicit `serialize_map` call
/// the way `serde_json::Value`'s own `Serialize` impl does it by hand.
impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number_lexeme(n, serializer),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}

/// Numbers are carried as source lexemes throughout the pipeline (spec.md
/// §9); serializing tries the narrowest numeric type the lexeme fits before
/// falling back to a string, the same ladder `to_serde_json` below uses.
fn serialize_number_lexeme<S>(lexeme: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if let Ok(v) = lexeme.parse::<i64>() {
        serializer.serialize_i64(v)
    } else if let Ok(v) = lexeme.parse::<u64>() {
        serializer.serialize_u64(v)
    } else if let Ok(v) = lexeme.parse::<f64>() {
        serializer.serialize_f64(v)
    } else {
        serializer.serialize_str(lexeme)
    }
}

impl Value {
    /// Bridges into `serde_json::Value` for callers who want to serialize.
    /// Numbers that don't parse as a JSON number (e.g. lexemes too large for
    /// `f64`/`i64`, or leftover hex text if a caller loads without going
    /// through the JSON lowerer first) fall back to a JSON string so no
    /// precision is silently discarded.
    pub fn to_serde_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::from_str::<serde_json::Number>(n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|_| serde_json::Value::String(n.clone())),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_serde_json).collect())
            }
            Value::Map(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    map.insert(key.as_str().to_string(), value.to_serde_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Reads all of `reader` and parses it into a [`Value`] via the same
/// parser the streaming pipeline uses.
pub fn load(mut reader: impl Read) -> Result<Value, CanifError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    load_str(&input)
}

pub fn load_str(input: &str) -> Result<Value, CanifError> {
    load_events(Parser::new(input))
}

pub fn load_events<I>(events: I) -> Result<Value, CanifError>
where
    I: Iterator<Item = Result<ParseEvent, CanifError>>,
{
    let mut iter = events;
    let first = next_event(&mut iter)?;
    value_from_event(first, &mut iter)
}

fn next_event<I>(iter: &mut I) -> Result<ParseEvent, CanifError>
where
    I: Iterator<Item = Result<ParseEvent, CanifError>>,
{
    match iter.next() {
        Some(result) => result,
        None => Err(CanifError::io("unexpected end of event stream")),
    }
}

fn value_from_event<I>(event: ParseEvent, iter: &mut I) -> Result<Value, CanifError>
where
    I: Iterator<Item = Result<ParseEvent, CanifError>>,
{
    match event {
        ParseEvent::Atom(atom) => Ok(atom_to_value(atom)),
        ParseEvent::MapOpen => load_map(iter),
        ParseEvent::ArrayOpen | ParseEvent::TupleOpen => Ok(Value::Array(load_items(iter)?)),
        ParseEvent::SetOpen => {
            let items = load_items(iter)?;
            Ok(Value::Map(vec![(Key::Str("$set".to_string()), Value::Array(items))]))
        }
        ParseEvent::FunctionCall { head, .. } => {
            let open = next_event(iter)?;
            debug_assert!(matches!(open, ParseEvent::TupleOpen));
            let items = load_items(iter)?;
            Ok(Value::Map(vec![(
                Key::Str(format!("$${head}")),
                Value::Array(items),
            )]))
        }
        other => unreachable!("{other:?} is not a value-start event"),
    }
}

fn load_items<I>(iter: &mut I) -> Result<Vec<Value>, CanifError>
where
    I: Iterator<Item = Result<ParseEvent, CanifError>>,
{
    let mut items = Vec::new();
    loop {
        match next_event(iter)? {
            ParseEvent::ArrayClose { .. }
            | ParseEvent::TupleClose { .. }
            | ParseEvent::SetClose { .. } => break,
            other => items.push(value_from_event(other, iter)?),
        }
    }
    Ok(items)
}

fn load_map<I>(iter: &mut I) -> Result<Value, CanifError>
where
    I: Iterator<Item = Result<ParseEvent, CanifError>>,
{
    let mut entries = Vec::new();
    loop {
        match next_event(iter)? {
            ParseEvent::MapClose { .. } => break,
            ParseEvent::MapKey(key) => {
                let value_event = next_event(iter)?;
                let value = value_from_event(value_event, iter)?;
                let key = match key.kind {
                    MapKeyKind::QuotedNumber => Key::Number(key.decoded),
                    MapKeyKind::Bare | MapKeyKind::QuotedString => Key::Str(key.decoded),
                };
                entries.push((key, value));
            }
            other => unreachable!("{other:?} cannot appear directly inside a map"),
        }
    }
    Ok(Value::Map(entries))
}

fn atom_to_value(atom: Atom) -> Value {
    match atom.kind {
        AtomKind::Number => Value::Number(atom.lexeme),
        AtomKind::String(_) => Value::Str(atom.decoded.unwrap_or_default()),
        AtomKind::Reserved(r) => match r {
            Reserved::True | Reserved::PyTrue => Value::Bool(true),
            Reserved::False | Reserved::PyFalse => Value::Bool(false),
            Reserved::Null
            | Reserved::PyNone
            | Reserved::NaN
            | Reserved::Infinity
            | Reserved::NegInfinity
            | Reserved::Undefined => Value::Null,
        },
        AtomKind::Ident => Value::Str(format!("$${}", atom.lexeme)),
        AtomKind::ReprBlob => Value::Str(format!("$repr<{}>", atom.decoded.unwrap_or_default())),
        AtomKind::EmptySlot => Value::Null,
    }
}
