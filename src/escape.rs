//! Escape-sequence decoding for non-raw string bodies.
//!
//! Raw-prefixed strings never call into this module: their body is carried
//! through unchanged, backslash and all, as required by the spec ("raw
//! strings treat `\` literally").

use crate::error::{CanifError, LexErrorKind, Span};

/// Decode the body of a non-raw string literal (the text between the quotes,
/// quotes already stripped) into its semantic code-point sequence.
pub fn decode_escapes(body: &str, quote: char, span: Span) -> Result<String, CanifError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            return Err(invalid_escape(span, "dangling '\\' at end of string"));
        };

        match escape {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '/' => out.push('/'),
            'x' => out.push(decode_hex_escape(&mut chars, 2, span)?),
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut digits = String::new();
                    for d in chars.by_ref() {
                        if d == '}' {
                            break;
                        }
                        digits.push(d);
                    }
                    out.push(code_point_to_char(&digits, span)?);
                } else {
                    out.push(decode_hex_escape(&mut chars, 4, span)?);
                }
            }
            'U' => out.push(decode_hex_escape(&mut chars, 8, span)?),
            other if other == quote => out.push(other),
            other => {
                return Err(invalid_escape(
                    span,
                    format!("unknown escape sequence '\\{other}'"),
                ));
            }
        }
    }

    Ok(out)
}

fn decode_hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digit_count: usize,
    span: Span,
) -> Result<char, CanifError> {
    let mut digits = String::with_capacity(digit_count);
    for _ in 0..digit_count {
        match chars.next() {
            Some(d) if d.is_ascii_hexdigit() => digits.push(d),
            _ => return Err(invalid_escape(span, "truncated hex escape")),
        }
    }
    code_point_to_char(&digits, span)
}

fn code_point_to_char(digits: &str, span: Span) -> Result<char, CanifError> {
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| invalid_escape(span, format!("invalid hex digits '{digits}'")))?;
    char::from_u32(value).ok_or_else(|| {
        invalid_escape(span, format!("code point U+{value:04X} is not a scalar value"))
    })
}

fn invalid_escape(span: Span, message: impl Into<String>) -> CanifError {
    CanifError::lex(LexErrorKind::InvalidEscape, span, message)
}

/// Escape `text` as a JSON string body (no surrounding quotes). Used by the
/// printer for both JSON-mode output and ensure-ascii verbatim re-rendering.
pub fn json_escape(text: &str, ensure_ascii: bool) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c if ensure_ascii && (c as u32) > 0x7f => push_ascii_escape(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

/// Escape only the non-ASCII code points of `text`, leaving every ASCII
/// character (quotes, backslashes, prefix letters) untouched. Used for
/// `ensure_ascii` in verbatim mode, where the source lexeme is reproduced
/// as-is and only needs its non-ASCII content folded down to `\uXXXX`.
pub fn ensure_ascii_lexeme(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) > 0x7f {
            push_ascii_escape(&mut out, c);
        } else {
            out.push(c);
        }
    }
    out
}

fn push_ascii_escape(out: &mut String, c: char) {
    let code = c as u32;
    if code <= 0xFFFF {
        out.push_str(&format!("\\u{code:04x}"));
    } else {
        let adjusted = code - 0x10000;
        let high = 0xD800 + (adjusted >> 10);
        let low = 0xDC00 + (adjusted & 0x3FF);
        out.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Span {
        Span::start()
    }

    #[test]
    fn decodes_common_escapes() {
        assert_eq!(decode_escapes(r"Hell\x6F", '"', here()).unwrap(), "Hello");
        assert_eq!(
            decode_escapes(r"Hellо", '"', here()).unwrap(),
            "Hell\u{43e}"
        );
        assert_eq!(decode_escapes(r"a\nb", '"', here()).unwrap(), "a\nb");
    }

    #[test]
    fn decodes_braced_unicode_escape() {
        assert_eq!(
            decode_escapes(r"\u{1F600}", '"', here()).unwrap(),
            "\u{1F600}"
        );
    }

    #[test]
    fn rejects_dangling_backslash() {
        assert!(decode_escapes("a\\", '"', here()).is_err());
    }

    #[test]
    fn ensure_ascii_escapes_supplementary_plane() {
        let escaped = json_escape("\u{1F600}", true);
        assert_eq!(escaped, "\\ud83d\\ude00");
    }

    #[test]
    fn json_escape_passes_ascii_through_when_disabled() {
        assert_eq!(json_escape("héllo", false), "héllo");
    }

    #[test]
    fn ensure_ascii_lexeme_escapes_non_ascii_only() {
        assert_eq!(
            ensure_ascii_lexeme("r'Hell\\wé'"),
            "r'Hell\\w\\u00e9'"
        );
    }
}
