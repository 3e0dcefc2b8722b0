//! Property tests for literal escaping and JSON canonicalization.

use proptest::prelude::*;
use rewind_core::types::{ColumnDef, Value};
use rewind_engine::codec::{canonical_json, decode, quote_string, render};

/// Reverse of the server's string-literal escaping.
fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(match chars.next()? {
                '0' => '\0',
                'n' => '\n',
                'r' => '\r',
                'Z' => '\x1a',
                other => other,
            }),
            '\'' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

/// Byte-level counterpart of [`unquote`].
fn unquote_bytes(literal: &[u8]) -> Option<Vec<u8>> {
    let inner = literal.strip_prefix(b"'")?.strip_suffix(b"'")?;
    let mut out = Vec::new();
    let mut bytes = inner.iter();
    while let Some(&b) = bytes.next() {
        match b {
            b'\\' => out.push(match *bytes.next()? {
                b'0' => 0,
                b'n' => b'\n',
                b'r' => b'\r',
                b'Z' => 0x1a,
                other => other,
            }),
            b'\'' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(|n| serde_json::Value::from(n)),
        "\\PC{0,12}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(|m| {
                serde_json::Value::Object(m.into_iter().collect())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn quoted_strings_unescape_to_input(s in "\\PC{0,64}|[\\x00\\n\\r\\\\'\"\\x1a]{0,16}") {
        prop_assert_eq!(unquote(&quote_string(&s)), Some(s));
    }

    #[test]
    fn text_cells_render_back_to_their_bytes(s in "\\PC{0,48}") {
        let column = ColumnDef::new("c1", "varchar(255)");
        let value = decode(&column, &Some(s.as_bytes().to_vec())).unwrap();
        prop_assert_eq!(render(&value).as_str().and_then(unquote), Some(s));
    }

    #[test]
    fn canonical_json_is_stable(v in arb_json()) {
        let once = canonical_json(&v);
        let reparsed: serde_json::Value = serde_json::from_str(&once).unwrap();
        prop_assert_eq!(&reparsed, &v);
        prop_assert_eq!(canonical_json(&reparsed), once);
    }

    #[test]
    fn json_cells_render_canonically(v in arb_json()) {
        let column = ColumnDef::new("doc", "json");
        let raw = serde_json::to_string(&v).unwrap();
        let value = decode(&column, &Some(raw.into_bytes())).unwrap();
        prop_assert!(matches!(value, Value::Json(_)));
        prop_assert_eq!(render(&value).as_str().and_then(unquote), Some(canonical_json(&v)));
    }

    #[test]
    fn binary_cells_render_as_escaped_raw_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let column = ColumnDef::new("payload", "varbinary(64)");
        let value = decode(&column, &Some(bytes.clone())).unwrap();
        let literal = render(&value);
        prop_assert!(!literal.as_bytes().starts_with(b"X'"));
        prop_assert_eq!(unquote_bytes(literal.as_bytes()), Some(bytes));
    }

    #[test]
    fn decimals_pad_to_scale(n in -1_000_000i64..1_000_000) {
        let column = ColumnDef::new("amount", "decimal(10,2)");
        let value = decode(&column, &Some(n.to_string().into_bytes())).unwrap();
        prop_assert_eq!(render(&value), format!("{n}.00"));
    }
}
