//! FILENAME: src/column.rs
//! PURPOSE: Column definitions and the fixed special-column arrangement.
//! CONTEXT: A `ColumnSpec` is the immutable description of one column
//! (name, declared type, flags, width bounds, special role). The table
//! validates the caller's list once at initialization and then arranges it:
//! Checkbox first, user columns in their original relative order, then
//! ValidationAlerts, then DeleteRow. The arrangement is fixed for the life
//! of the table; callers never reorder columns post-init.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::value::ValueType;

// ============================================================================
// SPECIAL KINDS
// ============================================================================

/// Reserved structural roles a column can play. At most one column per kind
/// may exist in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKind {
    /// An ordinary data column.
    None,
    /// Row-selection checkbox, pinned to the far left.
    Checkbox,
    /// Per-row validation message display, pinned after the user columns.
    ValidationAlerts,
    /// Row-delete trigger, pinned to the far right.
    DeleteRow,
}

impl Default for SpecialKind {
    fn default() -> Self {
        SpecialKind::None
    }
}

impl SpecialKind {
    /// Ordinary data columns are the only ones validation evaluates and
    /// export emits.
    pub fn is_special(&self) -> bool {
        !matches!(self, SpecialKind::None)
    }
}

// ============================================================================
// COLUMN SPEC
// ============================================================================

/// The immutable definition of one column.
///
/// `is_read_only`, `is_sortable`, `is_filterable` and the width bounds are
/// carried for the presentation layer; the engine validates the bounds but
/// does not police them at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Unique key, case-sensitive within a table.
    pub name: String,
    /// Header text shown by the renderer.
    pub display_name: String,
    pub value_type: ValueType,
    pub is_read_only: bool,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub is_sortable: bool,
    pub is_filterable: bool,
    pub special_kind: SpecialKind,
}

impl ColumnSpec {
    /// An ordinary editable column; `display_name` defaults to `name`.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        ColumnSpec {
            display_name: name.clone(),
            name,
            value_type,
            is_read_only: false,
            min_width: None,
            max_width: None,
            is_sortable: true,
            is_filterable: true,
            special_kind: SpecialKind::None,
        }
    }

    /// The row-selection checkbox column.
    pub fn checkbox(name: impl Into<String>) -> Self {
        let mut spec = ColumnSpec::new(name, ValueType::Boolean);
        spec.special_kind = SpecialKind::Checkbox;
        spec.is_sortable = false;
        spec.is_filterable = false;
        spec
    }

    /// The per-row validation message column. Read-only: its content is a
    /// projection of validation state, not caller data.
    pub fn validation_alerts(name: impl Into<String>) -> Self {
        let mut spec = ColumnSpec::new(name, ValueType::Text);
        spec.special_kind = SpecialKind::ValidationAlerts;
        spec.is_read_only = true;
        spec.is_sortable = false;
        spec.is_filterable = false;
        spec
    }

    /// The row-delete trigger column.
    pub fn delete_row(name: impl Into<String>) -> Self {
        let mut spec = ColumnSpec::new(name, ValueType::Text);
        spec.special_kind = SpecialKind::DeleteRow;
        spec.is_read_only = true;
        spec.is_sortable = false;
        spec.is_filterable = false;
        spec
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub fn with_width_bounds(mut self, min_width: Option<f64>, max_width: Option<f64>) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }
}

// ============================================================================
// VALIDATION & ARRANGEMENT
// ============================================================================

/// Validates a caller-supplied column list: non-empty unique names,
/// consistent width bounds, at most one column per special kind.
/// The returned error names the offending column and reason.
pub fn validate_columns(columns: &[ColumnSpec]) -> Result<(), GridError> {
    if columns.is_empty() {
        return Err(GridError::config("columns", "at least one column is required"));
    }

    let mut seen_names: Vec<&str> = Vec::with_capacity(columns.len());
    let mut seen_specials: Vec<SpecialKind> = Vec::new();

    for column in columns {
        if column.name.is_empty() {
            return Err(GridError::config(
                &column.display_name,
                "column name must not be empty",
            ));
        }
        if seen_names.contains(&column.name.as_str()) {
            return Err(GridError::config(&column.name, "duplicate column name"));
        }
        seen_names.push(&column.name);

        if let (Some(min), Some(max)) = (column.min_width, column.max_width) {
            if min > max {
                return Err(GridError::config(
                    &column.name,
                    format!("min_width {} exceeds max_width {}", min, max),
                ));
            }
        }
        for bound in [column.min_width, column.max_width].into_iter().flatten() {
            if bound < 0.0 || !bound.is_finite() {
                return Err(GridError::config(
                    &column.name,
                    format!("width bound {} is not a non-negative finite number", bound),
                ));
            }
        }

        if column.special_kind.is_special() {
            if seen_specials.contains(&column.special_kind) {
                return Err(GridError::config(
                    &column.name,
                    format!("more than one {:?} column", column.special_kind),
                ));
            }
            seen_specials.push(column.special_kind);
        }
    }

    Ok(())
}

/// Reorders a validated column list into the fixed arrangement:
/// [Checkbox?] + user columns (original relative order) + [ValidationAlerts?]
/// + [DeleteRow?].
pub fn arrange_columns(columns: Vec<ColumnSpec>) -> Vec<ColumnSpec> {
    let mut checkbox = None;
    let mut alerts = None;
    let mut delete = None;
    let mut user_columns = Vec::with_capacity(columns.len());

    for column in columns {
        match column.special_kind {
            SpecialKind::Checkbox => checkbox = Some(column),
            SpecialKind::ValidationAlerts => alerts = Some(column),
            SpecialKind::DeleteRow => delete = Some(column),
            SpecialKind::None => user_columns.push(column),
        }
    }

    let mut arranged = Vec::with_capacity(user_columns.len() + 3);
    arranged.extend(checkbox);
    arranged.extend(user_columns);
    arranged.extend(alerts);
    arranged.extend(delete);
    arranged
}
