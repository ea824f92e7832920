//! FILENAME: src/value.rs
//! PURPOSE: Defines the fundamental data structures for a single grid cell.
//! CONTEXT: This file contains the `CellValue` enum, the `ValueType` a column
//! declares, and the `CellSlot` a row owns per column. A slot couples the
//! value with its UI validation state so that a renderer can read both in one
//! lookup. Slots are designed to be lightweight as large datasets hold one
//! per (row, column) pair.

use serde::{Deserialize, Serialize};

/// The declared type of a column's values.
/// Writes are not coerced against this; the `TypeMatches` cell rule enforces
/// it when configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Text,
    Integer,
    Number,
    Boolean,
}

/// The raw data within a cell slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

impl CellValue {
    /// A value is blank iff it is `Empty` or an empty string. `Boolean(false)`
    /// and numeric zeros are data.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns true if this value conforms to the given declared type.
    /// Blank values conform to every type (presence is the `Required`
    /// rule's concern, not the type check's).
    pub fn matches_type(&self, value_type: ValueType) -> bool {
        if self.is_blank() {
            return true;
        }
        matches!(
            (self, value_type),
            (CellValue::Text(_), ValueType::Text)
                | (CellValue::Integer(_), ValueType::Integer)
                | (CellValue::Integer(_), ValueType::Number)
                | (CellValue::Number(_), ValueType::Number)
                | (CellValue::Boolean(_), ValueType::Boolean)
        )
    }

    /// Numeric view of the value, used by range rules. Integers widen to f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the display text of the value as a String.
    /// This is what exports, alerts, and uniqueness comparisons see.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Boolean(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Per-cell validation state surfaced to the renderer.
/// Mutated only through the validation entry points so the flags cannot
/// drift from the rules that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUiState {
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl CellUiState {
    pub fn valid() -> Self {
        CellUiState {
            is_valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CellUiState {
            is_valid: false,
            error_message: Some(message.into()),
        }
    }

    /// Back to the pristine valid state. Batch validation calls this on
    /// every slot before re-evaluating.
    pub fn reset(&mut self) {
        self.is_valid = true;
        self.error_message = None;
    }
}

impl Default for CellUiState {
    fn default() -> Self {
        Self::valid()
    }
}

/// The atomic unit of the grid: one value plus its validation state.
/// Slots are not standalone entities; they exist only inside a `Row`,
/// addressed by the table's column arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CellSlot {
    pub value: CellValue,
    pub ui_state: CellUiState,
}

impl CellSlot {
    pub fn new(value: CellValue) -> Self {
        CellSlot {
            value,
            ui_state: CellUiState::valid(),
        }
    }
}
