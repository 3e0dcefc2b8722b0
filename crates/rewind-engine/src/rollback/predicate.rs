//! WHERE clause construction from row images.

use rewind_core::types::{quote_ident, RowImage, SqlText, TableSchema, Value};

use crate::codec::{query_comparison, render_comparison};

/// Known `(column, value)` pairs at `positions`.
fn known_terms<'a>(
    schema: &'a TableSchema,
    row: &'a RowImage,
    positions: &'a [usize],
) -> impl Iterator<Item = (String, &'a Value)> + 'a {
    positions.iter().filter_map(move |&pos| {
        let column = schema.columns.get(pos)?;
        Some((quote_ident(&column.name), row.get(pos)?))
    })
}

/// `` `a`=1 AND `b` IS NULL `` over `positions`. Unknown values are left out;
/// returns `None` when no column remains.
pub fn equality_predicate(schema: &TableSchema, row: &RowImage, positions: &[usize]) -> Option<SqlText> {
    let terms: Vec<SqlText> = known_terms(schema, row, positions)
        .map(|(name, value)| match value {
            Value::Null => SqlText::from(format!("{name} IS NULL")),
            v => {
                let mut term = SqlText::from(format!("{name}="));
                term.push_sql(&render_comparison(v));
                term
            }
        })
        .collect();
    (!terms.is_empty()).then(|| SqlText::join(&terms, " AND "))
}

/// Predicate over every column of the row.
pub fn full_row_predicate(schema: &TableSchema, row: &RowImage) -> Option<SqlText> {
    let all: Vec<usize> = (0..schema.columns.len()).collect();
    equality_predicate(schema, row, &all)
}

/// Predicate over the key columns, provided every key value is known.
pub fn key_predicate(schema: &TableSchema, row: &RowImage, key: &[usize]) -> Option<SqlText> {
    if key.iter().any(|&pos| !row.is_known(pos)) {
        return None;
    }
    equality_predicate(schema, row, key)
}

/// Key predicate for a read-back query, with binary values as hexadecimal
/// literals.
pub fn key_query_predicate(schema: &TableSchema, row: &RowImage, key: &[usize]) -> Option<String> {
    if key.is_empty() || key.iter().any(|&pos| !row.is_known(pos)) {
        return None;
    }
    let terms: Vec<String> = known_terms(schema, row, key)
        .map(|(name, value)| match value {
            Value::Null => format!("{name} IS NULL"),
            v => format!("{name}={}", query_comparison(v)),
        })
        .collect();
    Some(terms.join(" AND "))
}
