//! Value codec: raw cells to typed values to rollback literals.
//!
//! Decoding is exact per declared type; rendering produces literals that
//! restore the identical stored value when replayed.

pub mod decode;
pub mod kind;
pub mod render;

pub use decode::{decode, decode_as, CellOrigin};
pub use kind::ColumnKind;
pub use render::{
    canonical_json, query_comparison, quote_bytes, quote_string, render, render_comparison,
};

use rewind_core::errors::CodecError;
use rewind_core::types::{ColumnDef, RawCell, SqlText};

/// Decode a server cell and render it as a literal.
pub fn encode_literal(column: &ColumnDef, raw: &RawCell) -> Result<SqlText, CodecError> {
    decode(column, raw).map(|v| render(&v))
}
