//! The round-trip laws from spec.md §8: verbatim printing is idempotent
//! under reparse, and JSON-mode output always parses as strict JSON.

use canif::config::{PipelineConfig, PrinterConfig};

fn run(input: &str, printer: PrinterConfig) -> String {
    let mut buf = Vec::new();
    canif::run(input, &mut buf, &PipelineConfig::default(), printer).unwrap();
    String::from_utf8(buf).unwrap()
}

fn verbatim_default() -> PrinterConfig {
    PrinterConfig {
        indent: 4,
        trailing_commas: false,
        ensure_ascii: false,
        json_mode: false,
    }
}

fn assert_idempotent(input: &str) {
    let first = run(input, verbatim_default());
    let second = run(&first, verbatim_default());
    assert_eq!(first, second, "print(parse(print(parse(x)))) != print(parse(x)) for {input:?}");
}

#[test]
fn idempotent_on_plain_json_documents() {
    assert_idempotent(r#"{"a": 1, "b": [1, 2, 3], "c": {"nested": true}}"#);
}

#[test]
fn idempotent_on_tuples_sets_and_function_calls() {
    assert_idempotent(r#"{"t": (1, 2), "s": {1, 2}, "f": myfunc("x", 1), "n": new Date(2020)}"#);
}

#[test]
fn idempotent_with_empty_array_slots() {
    assert_idempotent("[1,,,4]");
}

#[test]
fn idempotent_with_string_prefixes() {
    assert_idempotent(r#"[r'Hell\w', b"Hell\x6F", f'plain']"#);
}

#[test]
fn idempotent_on_deeply_nested_input() {
    let depth = 40;
    let input = format!("{}{}{}", "[".repeat(depth), "1", "]".repeat(depth));
    assert_idempotent(&input);
}

#[test]
fn json_output_mode_round_trips_through_serde_json() {
    let out = run(
        r#"{a: (1, 2), s: {1,2}, f: ObjectId("x")}"#,
        PrinterConfig {
            indent: 2,
            trailing_commas: false,
            ensure_ascii: false,
            json_mode: true,
        },
    );
    let value: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
    assert_eq!(value["a"], serde_json::json!([1, 2]));
    assert_eq!(value["s"], serde_json::json!({"$set": [1, 2]}));
    assert_eq!(value["f"], serde_json::json!({"$$ObjectId": ["x"]}));
}

#[test]
fn reparsed_string_atom_decodes_to_the_same_value() {
    // "Every atom's decoded semantic value equals its re-decoded value after
    // verbatim print + reparse."
    let input = r#"["Hello, world\n"]"#;
    let first_pass = canif::value::load_str(input).unwrap();
    let printed = run(input, verbatim_default());
    let second_pass = canif::value::load_str(&printed).unwrap();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn flat_mode_has_a_single_trailing_newline_and_nothing_else() {
    let out = run(
        r#"{"a": [1, 2, {"b": (3, 4)}]}"#,
        PrinterConfig { indent: 0, trailing_commas: false, ensure_ascii: false, json_mode: false },
    );
    assert_eq!(out.matches('\n').count(), 1);
    assert!(out.ends_with('\n'));
}
