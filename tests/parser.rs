//! Integration coverage for the event parser against the scenarios spec.md
//! §8 calls out explicitly, using the public `canif::parse` entry point
//! rather than reaching into `parser::Parser` directly.

use canif::error::CanifError;
use canif::event::{AtomKind, ParseEvent};

fn events(input: &str) -> Vec<ParseEvent> {
    canif::parse(input).collect::<Result<Vec<_>, _>>().expect("parse error")
}

fn try_events(input: &str) -> Result<Vec<ParseEvent>, CanifError> {
    canif::parse(input).collect()
}

#[test]
fn balances_open_and_close_events_for_a_mixed_document() {
    let evs = events(r#"{"a": (1, {2, 3}), "b": [4,,6]}"#);
    let mut depth = 0i32;
    for ev in &evs {
        match ev {
            ParseEvent::MapOpen
            | ParseEvent::ArrayOpen
            | ParseEvent::TupleOpen
            | ParseEvent::SetOpen => depth += 1,
            ParseEvent::MapClose { .. }
            | ParseEvent::ArrayClose { .. }
            | ParseEvent::TupleClose { .. }
            | ParseEvent::SetClose { .. } => depth -= 1,
            _ => {}
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn empty_set_braces_with_bare_comma_is_rejected() {
    assert!(try_events("{,}").is_err());
}

#[test]
fn empty_containers_parse_to_open_close_pairs() {
    assert_eq!(events("{}").len(), 2);
    assert_eq!(events("[]").len(), 2);
    assert_eq!(events("()").len(), 2);
}

#[test]
fn new_expression_becomes_a_function_call_with_compound_head() {
    let evs = events("new Date(2020, 1, 1)");
    assert!(matches!(&evs[0], ParseEvent::FunctionCall { head, .. } if head == "new Date"));
    assert!(matches!(evs.last().unwrap(), ParseEvent::TupleClose { count: 3 }));
}

#[test]
fn deeply_nested_containers_parse_at_depth_64() {
    let depth = 64;
    let input = format!("{}{}{}", "[".repeat(depth), "\"leaf\"", "]".repeat(depth));
    let evs = events(&input);
    let opens = evs.iter().filter(|e| matches!(e, ParseEvent::ArrayOpen)).count();
    assert_eq!(opens, depth);
}

#[test]
fn single_element_containers_with_and_without_trailing_comma() {
    assert!(try_events("[1]").is_ok());
    assert!(try_events("[1,]").is_ok());
    assert!(try_events("(1,)").is_ok());
    assert!(try_events("{1,}").is_ok());
}

#[test]
fn adjacent_commas_in_array_produce_two_empty_slots() {
    let evs = events("[1,,,4]");
    let empties = evs
        .iter()
        .filter(|e| matches!(e, ParseEvent::Atom(a) if a.kind == AtomKind::EmptySlot))
        .count();
    assert_eq!(empties, 2);
}

#[test]
fn trailing_data_after_top_level_value_is_an_error() {
    let err = try_events("[1] [2]").unwrap_err();
    assert_eq!(err.kind, canif::error::ErrorKind::Parse(canif::error::ParseErrorKind::TrailingData));
}

#[test]
fn map_key_without_colon_is_a_missing_colon_error() {
    // The first entry's colon establishes this `{` as a map; the second
    // entry then omits its colon.
    let err = try_events(r#"{"a": 1, "b" 2}"#).unwrap_err();
    assert_eq!(err.kind, canif::error::ErrorKind::Parse(canif::error::ParseErrorKind::MissingColon));
}
