//! FILENAME: src/error.rs
//! PURPOSE: Error taxonomy for the grid engine.
//! CONTEXT: Three failure classes cross the engine boundary: bad
//! configuration (column setup, viewport sizing), out-of-range indices
//! (reported, never clamped), and cooperative deadlines expiring during
//! import/export. Invalid *data* is not an error: validation outcomes are
//! returned as values (`BatchReport`, bool), since invalid data is an
//! expected steady state, not an engine fault.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Invalid setup detected at initialization or reconfiguration.
    /// `context` names the offending column or component.
    #[error("configuration error in '{context}': {reason}")]
    Configuration { context: String, reason: String },

    /// Row index outside [0, row_count).
    #[error("row index {index} out of range (row count {row_count})")]
    RowIndex { index: usize, row_count: usize },

    /// Column index outside [0, column_count).
    #[error("column index {index} out of range (column count {column_count})")]
    ColumnIndex { index: usize, column_count: usize },

    /// A column name that resolves to no slot in this table.
    #[error("unknown column: '{0}'")]
    UnknownColumn(String),

    /// A cooperative deadline expired between row-level units of work.
    /// `completed_rows` counts the rows already applied; partial effects
    /// are left in place (no rollback).
    #[error("operation timed out after {elapsed:?} ({completed_rows} rows completed)")]
    Timeout {
        elapsed: Duration,
        completed_rows: usize,
    },
}

impl GridError {
    /// Shorthand used throughout column and viewport validation.
    pub(crate) fn config(context: impl Into<String>, reason: impl Into<String>) -> Self {
        GridError::Configuration {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
