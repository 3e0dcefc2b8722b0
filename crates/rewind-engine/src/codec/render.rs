//! Literal rendering for rollback SQL.

use std::fmt::Write as _;

use rewind_core::types::{SqlText, Value};

/// Render a value as a literal for SET and VALUES lists.
pub fn render(value: &Value) -> SqlText {
    match value {
        Value::Bytes(b) => quote_bytes(b),
        other => SqlText::from(render_text(other)),
    }
}

/// Render a value for an equality predicate against its column.
///
/// JSON is compared as JSON, and FLOAT values are widened so the comparison
/// happens at the precision the server uses for the column.
pub fn render_comparison(value: &Value) -> SqlText {
    match value {
        Value::Bytes(b) => quote_bytes(b),
        other => SqlText::from(query_comparison(other)),
    }
}

/// Comparison literal for queries sent to the audited server as text.
/// Binary values become hexadecimal literals.
pub fn query_comparison(value: &Value) -> String {
    match value {
        Value::Json(v) => format!("CAST({} AS JSON)", quote_string(&canonical_json(v))),
        Value::Float(f) => format_float(FloatRepr::Double(f64::from(*f))),
        other => render_text(other),
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) | Value::Bit(n) | Value::Set(n) => n.to_string(),
        Value::Decimal(s) => s.clone(),
        Value::Float(f) => format_float(FloatRepr::Single(*f)),
        Value::Double(f) => format_float(FloatRepr::Double(*f)),
        Value::Text(s) => quote_string(s),
        Value::Bytes(b) => format!("X'{}'", hex::encode_upper(b)),
        Value::Enum(n) => n.to_string(),
        Value::Json(v) => quote_string(&canonical_json(v)),
        Value::Date(s) | Value::Time(s) | Value::DateTime(s) | Value::Timestamp(s) => {
            quote_string(s)
        }
        Value::Year(y) => y.to_string(),
    }
}

/// Escape sequence the server expects for `b` inside a quoted literal.
fn escape(b: u8) -> Option<&'static str> {
    Some(match b {
        0 => "\\0",
        b'\n' => "\\n",
        b'\r' => "\\r",
        b'\\' => "\\\\",
        b'\'' => "\\'",
        b'"' => "\\\"",
        0x1a => "\\Z",
        _ => return None,
    })
}

/// Single-quoted string with the server's escape set.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match u8::try_from(c).ok().and_then(escape) {
            Some(seq) => out.push_str(seq),
            None => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Binary data as a quoted literal: the escape set applied per byte, every
/// other byte kept raw.
pub fn quote_bytes(bytes: &[u8]) -> SqlText {
    let mut out = SqlText::new();
    out.push_str("'");
    for &b in bytes {
        match escape(b) {
            Some(seq) => out.push_str(seq),
            None => out.push_raw(&[b]),
        }
    }
    out.push_str("'");
    out
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_json(value, &mut out);
    out
}

fn write_json(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String(k.clone()).to_string());
                out.push(':');
                write_json(v, out);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

enum FloatRepr {
    Single(f32),
    Double(f64),
}

/// Shortest round-trip digits. Decimal notation for exponents in `[-4, 21)`,
/// otherwise `d.ddde±XX`.
fn format_float(f: FloatRepr) -> String {
    let (sci, plain) = match f {
        FloatRepr::Single(v) => (format!("{v:e}"), format!("{v}")),
        FloatRepr::Double(v) => (format!("{v:e}"), format!("{v}")),
    };
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return plain;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return plain;
    };
    if (-4..21).contains(&exp) {
        return plain;
    }
    let mut out = String::from(mantissa);
    let sign = if exp < 0 { '-' } else { '+' };
    let _ = write!(out, "e{sign}{:02}", exp.unsigned_abs());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_use_shortest_digits() {
        assert_eq!(render(&Value::Double(1.11)), "1.11");
        assert_eq!(render(&Value::Double(1.11e100)), "1.11e+100");
        assert_eq!(render(&Value::Double(1e-5)), "1e-05");
        assert_eq!(render(&Value::Double(0.0001)), "0.0001");
        assert_eq!(render(&Value::Double(-2.5e21)), "-2.5e+21");
        assert_eq!(render(&Value::Double(100.0)), "100");
        assert_eq!(render(&Value::Float(1.11)), "1.11");
    }

    #[test]
    fn float_comparison_is_widened() {
        assert_eq!(render_comparison(&Value::Float(0.5)), "0.5");
        assert_eq!(
            render_comparison(&Value::Float(1.11)),
            format!("{}", f64::from(1.11f32))
        );
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quote_string("it's"), "'it\\'s'");
        assert_eq!(quote_string("a\nb\\c\0"), "'a\\nb\\\\c\\0'");
        assert_eq!(quote_string("😀中文"), "'😀中文'");
        assert_eq!(quote_string("say \"hi\""), "'say \\\"hi\\\"'");
    }

    #[test]
    fn bytes_render_escaped_not_hex() {
        assert_eq!(render(&Value::Bytes(vec![1, 2, 3])), "'\x01\x02\x03'");
        assert_eq!(
            render(&Value::Bytes(vec![0xff, 0x00, b'\'', 0x1a])).as_bytes(),
            b"'\xff\\0\\'\\Z'"
        );
        assert_eq!(
            render_comparison(&Value::Bytes(vec![0xfe])).as_bytes(),
            b"'\xfe'"
        );
        assert_eq!(query_comparison(&Value::Bytes(vec![0xff, 0x00])), "X'FF00'");
    }

    #[test]
    fn json_is_canonical() {
        let v: serde_json::Value =
            serde_json::from_str(r#"{"time":"2015-01-01 13:00:00","result":"fail"}"#).unwrap();
        assert_eq!(
            render(&Value::Json(v.clone())),
            r#"'{\"result\":\"fail\",\"time\":\"2015-01-01 13:00:00\"}'"#
        );
        assert!(render_comparison(&Value::Json(v))
            .as_bytes()
            .starts_with(b"CAST('{"));
    }

    #[test]
    fn enums_and_sets_render_numbers() {
        assert_eq!(render(&Value::Enum(2)), "2");
        assert_eq!(render(&Value::Set(5)), "5");
        assert_eq!(render(&Value::Bit(1)), "1");
        assert_eq!(render(&Value::Year(2019)), "2019");
    }
}
