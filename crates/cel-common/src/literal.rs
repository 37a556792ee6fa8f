//! Literal formatting shared by the debug-string renderers

use std::fmt::Write;

fn push_escaped_ascii(out: &mut String, byte: u8, quote: char) -> bool {
    let escaped = match byte {
        b'\\' => "\\\\",
        b'\n' => "\\n",
        b'\r' => "\\r",
        b'\t' => "\\t",
        0x07 => "\\a",
        0x08 => "\\b",
        0x0c => "\\f",
        0x0b => "\\v",
        _ if char::from(byte) == quote => {
            out.push('\\');
            out.push(quote);
            return true;
        }
        _ => return false,
    };
    out.push_str(escaped);
    true
}

/// Render `value` as a double-quoted CEL string literal
pub(crate) fn format_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c.is_ascii() && push_escaped_ascii(&mut out, c as u8, '"') {
            continue;
        }
        if c.is_control() {
            let _ = write!(out, "\\u{:04x}", u32::from(c));
        } else {
            out.push(c);
        }
    }
    out.push('"');
    out
}

/// Render `value` as a CEL bytes literal, `b"..."`
pub(crate) fn format_bytes_literal(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("b\"");
    for &byte in value {
        if push_escaped_ascii(&mut out, byte, '"') {
            continue;
        }
        if (0x20..0x7f).contains(&byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }
    out.push('"');
    out
}

/// Render a double so that it always reads back as a double
pub(crate) fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+infinity" } else { "-infinity" }.to_string();
    }
    let mut out = format!("{value}");
    if !out.contains(['.', 'e', 'E']) {
        out.push_str(".0");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_string_literal() {
        assert_eq!(format_string_literal("foo"), "\"foo\"");
        assert_eq!(format_string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(format_string_literal("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(format_string_literal("\u{1}"), "\"\\u0001\"");
        assert_eq!(format_string_literal("héllo"), "\"héllo\"");
    }

    #[test]
    fn test_format_bytes_literal() {
        assert_eq!(format_bytes_literal(b"foo"), "b\"foo\"");
        assert_eq!(format_bytes_literal(&[0xff, b'a']), "b\"\\xffa\"");
        assert_eq!(format_bytes_literal(b"\\"), "b\"\\\\\"");
    }

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(0.0), "0.0");
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(1.1), "1.1");
        assert_eq!(format_double(-2.5), "-2.5");
        assert_eq!(format_double(f64::NAN), "nan");
        assert_eq!(format_double(f64::INFINITY), "+infinity");
        assert_eq!(format_double(f64::NEG_INFINITY), "-infinity");
    }
}
