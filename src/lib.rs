//! FILENAME: src/lib.rs
//! PURPOSE: Main library entry point for the headless data grid engine.
//! CONTEXT: Re-exports public types and modules for use by embedding
//! applications. The engine is UI-agnostic: it manages tabular data, row
//! lifecycle, validation, and viewport windowing, and leaves rendering and
//! input to the caller.

pub mod column;
pub mod error;
pub mod row;
pub mod table;
pub mod transfer;
pub mod validation;
pub mod value;
pub mod viewport;

// Re-export commonly used types at the crate root
pub use column::{ColumnSpec, SpecialKind};
pub use error::GridError;
pub use row::{Row, RowStore};
pub use table::{GridTable, TableOptions};
pub use transfer::{export_rows, import_rows, ExportOptions, DEFAULT_ALERTS_KEY};
pub use validation::{
    dataset_is_valid, validate_batch, validate_cell, BatchReport, CancelToken, CellRule,
    CellRuleKind, CrossRowRule, ValidationConfig,
};
pub use value::{CellSlot, CellUiState, CellValue, ValueType};
pub use viewport::{Viewport, MAX_VIEWPORT_ROWS};
