//! Raw cell decoding into typed values.

use chrono::{NaiveDate, NaiveDateTime};
use rewind_core::errors::CodecError;
use rewind_core::types::{ColumnDef, RawCell, Value};

use super::kind::ColumnKind;

/// Where a raw cell came from. BIT columns differ: the server sends the raw
/// bit bytes, a statement literal spells the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOrigin {
    Server,
    Literal,
}

/// Decode one cell returned by the server for `column`.
pub fn decode(column: &ColumnDef, raw: &RawCell) -> Result<Value, CodecError> {
    decode_as(column, raw, CellOrigin::Server)
}

/// Decode one cell with an explicit origin.
pub fn decode_as(column: &ColumnDef, raw: &RawCell, origin: CellOrigin) -> Result<Value, CodecError> {
    let kind = ColumnKind::parse(&column.column_type);
    let Some(bytes) = raw else {
        return Ok(Value::Null);
    };

    if let ColumnKind::Unsupported(_) = kind {
        return Err(CodecError::UnsupportedType {
            column: column.name.clone(),
            column_type: column.column_type.clone(),
        });
    }

    match kind {
        ColumnKind::Binary => return Ok(Value::Bytes(bytes.clone())),
        ColumnKind::Bit if origin == CellOrigin::Server => {
            return decode_bit_bytes(bytes).ok_or_else(|| invalid(column, "bit value wider than 64 bits"));
        }
        ColumnKind::Text => {
            return Ok(match String::from_utf8(bytes.clone()) {
                Ok(s) => Value::Text(s),
                Err(_) => Value::Bytes(bytes.clone()),
            });
        }
        _ => {}
    }

    let text = std::str::from_utf8(bytes).map_err(|_| invalid(column, "not valid UTF-8"))?;
    decode_text(column, &kind, text)
}

fn decode_text(column: &ColumnDef, kind: &ColumnKind, text: &str) -> Result<Value, CodecError> {
    let t = text.trim();
    match kind {
        ColumnKind::Integer { unsigned: false } => t
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| invalid(column, &e.to_string())),
        ColumnKind::Integer { unsigned: true } => t
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|e| invalid(column, &e.to_string())),
        ColumnKind::Decimal { scale } => {
            normalize_decimal(t, *scale).ok_or_else(|| invalid(column, "malformed decimal"))
        }
        ColumnKind::Float => match t.parse::<f32>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(invalid(column, "malformed float")),
        },
        ColumnKind::Double => match t.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Double(f)),
            _ => Err(invalid(column, "malformed double")),
        },
        ColumnKind::Bit => parse_bit_literal(t).ok_or_else(|| invalid(column, "malformed bit literal")),
        ColumnKind::Enum(members) => decode_enum(members, text).ok_or_else(|| invalid(column, "not an enum member")),
        ColumnKind::Set(members) => decode_set(members, text).ok_or_else(|| invalid(column, "not a set member")),
        ColumnKind::Json => serde_json::from_str(text)
            .map(Value::Json)
            .map_err(|e| invalid(column, &e.to_string())),
        ColumnKind::Date => canonical_date(t)
            .map(Value::Date)
            .ok_or_else(|| invalid(column, "malformed date")),
        ColumnKind::Time => {
            if is_time(t) {
                Ok(Value::Time(t.to_string()))
            } else {
                Err(invalid(column, "malformed time"))
            }
        }
        ColumnKind::DateTime => canonical_datetime(t)
            .map(Value::DateTime)
            .ok_or_else(|| invalid(column, "malformed datetime")),
        ColumnKind::Timestamp => canonical_datetime(t)
            .map(Value::Timestamp)
            .ok_or_else(|| invalid(column, "malformed timestamp")),
        ColumnKind::Year => t
            .parse::<u16>()
            .ok()
            .filter(|y| *y == 0 || (1901..=2155).contains(y))
            .map(Value::Year)
            .ok_or_else(|| invalid(column, "malformed year")),
        ColumnKind::Text => Ok(Value::Text(text.to_string())),
        ColumnKind::Binary => Ok(Value::Bytes(text.as_bytes().to_vec())),
        ColumnKind::Unsupported(_) => Err(CodecError::UnsupportedType {
            column: column.name.clone(),
            column_type: column.column_type.clone(),
        }),
    }
}

fn invalid(column: &ColumnDef, detail: &str) -> CodecError {
    CodecError::InvalidValue {
        column: column.name.clone(),
        column_type: column.column_type.clone(),
        detail: detail.to_string(),
    }
}

fn decode_bit_bytes(bytes: &[u8]) -> Option<Value> {
    if bytes.len() > 8 {
        return None;
    }
    Some(Value::Bit(
        bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
    ))
}

/// `5`, `b'101'`, `0b101` or `0x05`.
fn parse_bit_literal(t: &str) -> Option<Value> {
    let lower = t.to_ascii_lowercase();
    let n = if let Some(bits) = lower.strip_prefix("b'").and_then(|s| s.strip_suffix('\'')) {
        u64::from_str_radix(bits, 2).ok()?
    } else if let Some(bits) = lower.strip_prefix("0b") {
        u64::from_str_radix(bits, 2).ok()?
    } else if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        lower.parse().ok()?
    };
    Some(Value::Bit(n))
}

fn decode_enum(members: &[String], text: &str) -> Option<Value> {
    if let Some(pos) = members.iter().position(|m| m.eq_ignore_ascii_case(text)) {
        return Some(Value::Enum(pos as u16 + 1));
    }
    if text.is_empty() {
        return Some(Value::Enum(0));
    }
    let n: u16 = text.trim().parse().ok()?;
    (usize::from(n) <= members.len()).then_some(Value::Enum(n))
}

fn decode_set(members: &[String], text: &str) -> Option<Value> {
    if text.is_empty() {
        return Some(Value::Set(0));
    }
    let by_name: Option<u64> = text.split(',').try_fold(0u64, |mask, part| {
        let pos = members.iter().position(|m| m.eq_ignore_ascii_case(part))?;
        Some(mask | (1u64 << pos))
    });
    if by_name.is_some() {
        return by_name.map(Value::Set);
    }
    let n: u64 = text.trim().parse().ok()?;
    let limit = if members.len() >= 64 {
        u64::MAX
    } else {
        (1u64 << members.len()) - 1
    };
    (n <= limit).then_some(Value::Set(n))
}

/// Decimal text scaled to `scale` fractional digits.
fn normalize_decimal(t: &str, scale: u32) -> Option<Value> {
    let (sign, digits) = match t.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", t.strip_prefix('+').unwrap_or(t)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let int_ok = !int_part.is_empty() || !frac_part.is_empty();
    if !int_ok
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let scale = scale as usize;
    let text = if scale == 0 && frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else if frac_part.len() >= scale {
        format!("{sign}{int_part}.{frac_part}")
    } else {
        format!("{sign}{int_part}.{frac_part:0<scale$}")
    };
    Some(Value::Decimal(text))
}

fn is_zero_temporal(t: &str) -> bool {
    t.bytes().all(|b| b == b'0' || b == b'-' || b == b':' || b == b' ' || b == b'.')
}

/// `YYYY-MM-DD`, accepting unpadded months/days and `YYYYMMDD`.
pub(crate) fn canonical_date(t: &str) -> Option<String> {
    if is_zero_temporal(t) && t.len() >= 8 {
        return Some(t.to_string());
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(t, "%Y%m%d"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// `YYYY-MM-DD HH:MM:SS[.frac]`, keeping the fractional digits as given.
pub(crate) fn canonical_datetime(t: &str) -> Option<String> {
    if is_zero_temporal(t) && t.len() >= 10 {
        return Some(t.to_string());
    }
    let (main, frac) = match t.rsplit_once('.') {
        Some((main, frac)) if !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()) => {
            (main, Some(frac))
        }
        _ => (t, None),
    };
    let parsed = NaiveDateTime::parse_from_str(main, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(main, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(main, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    let base = parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    Some(match frac {
        Some(f) => format!("{base}.{f}"),
        None => base,
    })
}

/// `[-]H+:MM:SS[.frac]`, the server's TIME range allows hours above 24.
fn is_time(t: &str) -> bool {
    let t = t.strip_prefix('-').unwrap_or(t);
    let (main, frac) = t.split_once('.').unwrap_or((t, ""));
    let parts: Vec<&str> = main.split(':').collect();
    parts.len() == 3
        && !parts[0].is_empty()
        && parts[0].bytes().all(|b| b.is_ascii_digit())
        && parts[1..]
            .iter()
            .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()))
        && parts[1] < "60"
        && parts[2] < "60"
        && frac.bytes().all(|b| b.is_ascii_digit())
}
