//! End-to-end lexer coverage: tokenising whole snippets rather than the
//! single-token cases the unit tests in `src/lexer.rs` exercise.

use canif::lexer::Lexer;
use canif::token::TokenKind;

fn kinds(input: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(input);
    let mut out = vec![];
    loop {
        let tok = lexer.consume().expect("lex error");
        if tok.kind == TokenKind::Eof {
            break;
        }
        out.push(tok.kind);
    }
    out
}

#[test]
fn tokenises_a_mongo_shell_document() {
    let input = r#"{_id: ObjectId("507f191e810c19729de860ea"), tags: {"a", "b"}}"#;
    let toks = kinds(input);
    assert_eq!(toks.first(), Some(&TokenKind::Punct('{')));
    assert!(toks.contains(&TokenKind::Ident));
}

#[test]
fn comments_and_whitespace_are_fully_silent() {
    let with_comments = kinds("[\n  1, // first\n  2 // second\n]");
    let without_comments = kinds("[1,2]");
    assert_eq!(with_comments, without_comments);
}

#[test]
fn string_prefix_combinations_are_recognised() {
    let mut lexer = Lexer::new(r#"rb"Hell\w""#);
    let tok = lexer.consume().unwrap();
    match tok.kind {
        TokenKind::String(prefix) => {
            assert!(prefix.raw);
            assert!(prefix.binary);
        }
        other => panic!("expected a string token, got {other:?}"),
    }
    // raw wins over binary's escape decoding
    assert_eq!(tok.decoded.as_deref(), Some(r"Hell\w"));
}

#[test]
fn unterminated_container_reports_a_span() {
    let mut lexer = Lexer::new(r#""unterminated"#);
    let err = lexer.consume().unwrap_err();
    assert_eq!(err.span.line, 1);
    assert_eq!(err.span.column, 1);
}

#[test]
fn number_lexemes_survive_unmodified() {
    for src in ["0", "-0", "3.14159", "-3.25e-10", "0x1F", "1e10"] {
        let mut lexer = Lexer::new(src);
        let tok = lexer.consume().unwrap();
        assert_eq!(tok.lexeme, src);
    }
}
