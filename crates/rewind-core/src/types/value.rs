//! Decoded column values and row images.

use serde::{Deserialize, Serialize};

/// One cell as returned by the server's text protocol. `None` is SQL NULL.
pub type RawCell = Option<Vec<u8>>;

/// A typed column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    /// Exact decimal text, already scaled to the declared precision.
    Decimal(String),
    Float(f32),
    Double(f64),
    Bit(u64),
    Text(String),
    Bytes(Vec<u8>),
    /// 1-based member ordinal; 0 is the empty error member.
    Enum(u16),
    /// Member bitmask.
    Set(u64),
    Json(serde_json::Value),
    Date(String),
    Time(String),
    DateTime(String),
    Timestamp(String),
    Year(u16),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Column values of one row in declared column order.
///
/// `None` marks a column whose value is computed by the server and is not
/// known to the engine (auto-increment without a literal, CURRENT_TIMESTAMP
/// defaults). Unknown columns are left out of rollback predicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowImage {
    values: Vec<Option<Value>>,
}

impl RowImage {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    pub fn with_unknowns(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Known value at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx).and_then(|v| v.as_ref())
    }

    pub fn set(&mut self, idx: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = Some(value);
        }
    }

    /// Mark the value at `idx` as computed by the server.
    pub fn forget(&mut self, idx: usize) {
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = None;
        }
    }

    pub fn is_known(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    pub fn is_null(&self, idx: usize) -> bool {
        matches!(self.get(idx), Some(Value::Null))
    }

    pub fn null_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| matches!(v, Some(Value::Null)))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(|v| v.as_ref())
    }
}
