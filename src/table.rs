//! FILENAME: src/table.rs
//! PURPOSE: The grid table engine: construction, cell and row access, row
//! lifecycle (delete, insert, clear, compact), block paste, checkbox helpers.
//! CONTEXT: `GridTable` is the single-writer heart of the crate. It owns the
//! arranged columns, the name lookup map, the row store, and the validation
//! configuration. Height invariants after every completed mutation: at least
//! `minimum_row_count + 1` rows exist, and the final row is empty. Index
//! errors are reported, never clamped.

use std::collections::HashMap;

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column::{arrange_columns, validate_columns, ColumnSpec, SpecialKind};
use crate::error::GridError;
use crate::row::RowStore;
use crate::validation::ValidationConfig;
use crate::value::{CellUiState, CellValue};

// ============================================================================
// OPTIONS
// ============================================================================

/// Construction-time settings. The minimum row count and the validation
/// rule set are fixed at init; only the validation `enabled` flag can be
/// toggled afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {
    /// The table never shrinks below this many rows plus one trailing
    /// empty row.
    pub minimum_row_count: usize,
    pub validation: ValidationConfig,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            minimum_row_count: 1,
            validation: ValidationConfig::default(),
        }
    }
}

// ============================================================================
// GRID TABLE
// ============================================================================

/// The headless data grid. All mutation goes through `&mut self`; one
/// logical writer at a time is enforced by the borrow checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridTable {
    pub(crate) columns: Vec<ColumnSpec>,
    pub(crate) column_lookup: FxHashMap<String, usize>,
    pub(crate) store: RowStore,
    pub(crate) minimum_row_count: usize,
    pub(crate) validation: ValidationConfig,
}

impl GridTable {
    /// Validates and arranges the column list, checks the validation rule
    /// set against it, then seeds the store with `minimum_row_count + 1`
    /// empty rows. A configuration error aborts construction; no table
    /// exists afterwards.
    pub fn new(columns: Vec<ColumnSpec>, options: TableOptions) -> Result<Self, GridError> {
        validate_columns(&columns)?;
        let columns = arrange_columns(columns);
        crate::validation::validate_config(&options.validation, &columns)?;

        let mut column_lookup = FxHashMap::default();
        for (index, column) in columns.iter().enumerate() {
            column_lookup.insert(column.name.clone(), index);
        }

        let mut store = RowStore::new(columns.len());
        store.ensure_len(options.minimum_row_count + 1);

        debug!(
            "table created: {} columns, {} rows seeded",
            columns.len(),
            store.len()
        );

        Ok(GridTable {
            columns,
            column_lookup,
            store,
            minimum_row_count: options.minimum_row_count,
            validation: options.validation,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The arranged column list: [Checkbox?] + user columns +
    /// [ValidationAlerts?] + [DeleteRow?].
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Arranged index of the named column, if it exists.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_lookup.get(name).copied()
    }

    pub fn minimum_row_count(&self) -> usize {
        self.minimum_row_count
    }

    pub fn validation_config(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Runtime toggle for the validation layer. Rules themselves are fixed
    /// at construction.
    pub fn set_validation_enabled(&mut self, enabled: bool) {
        self.validation.enabled = enabled;
    }

    pub fn ui_state(&self, row: usize, col: usize) -> Result<&CellUiState, GridError> {
        self.check_col(col)?;
        let record = self.store.row(row).ok_or(GridError::RowIndex {
            index: row,
            row_count: self.store.len(),
        })?;
        Ok(&record.slots[col].ui_state)
    }

    // ------------------------------------------------------------------
    // Cell access
    // ------------------------------------------------------------------

    pub fn get_cell(&self, row: usize, col: usize) -> Result<&CellValue, GridError> {
        self.check_col(col)?;
        let record = self.store.row(row).ok_or(GridError::RowIndex {
            index: row,
            row_count: self.store.len(),
        })?;
        Ok(&record.slots[col].value)
    }

    /// Writes one cell. The slot's validation state resets (the old verdict
    /// described the old value); callers running continuous validation
    /// re-check via `validate_cell`. Auto-expands when the write leaves the
    /// final row non-empty.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), GridError> {
        self.check_row(row)?;
        self.check_col(col)?;
        if let Some(slot) = self.store.row_mut(row).and_then(|r| r.slot_mut(col)) {
            slot.value = value;
            slot.ui_state.reset();
        }
        self.maybe_auto_expand();
        Ok(())
    }

    pub fn get_cell_by_name(&self, row: usize, name: &str) -> Result<&CellValue, GridError> {
        let col = self.require_column(name)?;
        self.get_cell(row, col)
    }

    pub fn set_cell_by_name(
        &mut self,
        row: usize,
        name: &str,
        value: CellValue,
    ) -> Result<(), GridError> {
        let col = self.require_column(name)?;
        self.set_cell(row, col, value)
    }

    // ------------------------------------------------------------------
    // Row access
    // ------------------------------------------------------------------

    /// The whole row as a name→value map, special columns included.
    pub fn get_row(&self, row: usize) -> Result<HashMap<String, CellValue>, GridError> {
        let record = self.store.row(row).ok_or(GridError::RowIndex {
            index: row,
            row_count: self.store.len(),
        })?;
        Ok(self
            .columns
            .iter()
            .enumerate()
            .map(|(col, spec)| (spec.name.clone(), record.slots[col].value.clone()))
            .collect())
    }

    /// Bulk row write. Keys naming no column are skipped, so records from
    /// external sources with extra fields import cleanly. Columns absent
    /// from the map keep their current value.
    pub fn set_row(
        &mut self,
        row: usize,
        values: &HashMap<String, CellValue>,
    ) -> Result<(), GridError> {
        self.check_row(row)?;
        for (name, value) in values {
            let Some(col) = self.column_index(name) else {
                continue;
            };
            if let Some(slot) = self.store.row_mut(row).and_then(|r| r.slot_mut(col)) {
                slot.value = value.clone();
                slot.ui_state.reset();
            }
        }
        self.maybe_auto_expand();
        Ok(())
    }

    pub fn is_row_empty(&self, row: usize) -> Result<bool, GridError> {
        self.check_row(row)?;
        Ok(self.store.row(row).map(|r| r.is_empty()).unwrap_or(true))
    }

    /// Highest-index row holding data, or `None` for an all-empty table.
    pub fn last_data_row_index(&self) -> Option<usize> {
        self.store.last_non_empty()
    }

    // ------------------------------------------------------------------
    // Row lifecycle
    // ------------------------------------------------------------------

    /// True iff `row` is in range and the table sits above its floor, i.e.
    /// a structural removal would not shrink it below
    /// `minimum_row_count + 1` rows.
    pub fn can_delete_row(&self, row: usize) -> bool {
        row < self.store.len() && self.store.len() > self.minimum_row_count + 1
    }

    /// Floor-aware delete. Above the floor the row is structurally removed
    /// and every subsequent row shifts up one index; at the floor the row's
    /// values are cleared in place and the row survives. Never fails for an
    /// in-range row.
    pub fn smart_delete_row(&mut self, row: usize) -> Result<(), GridError> {
        self.check_row(row)?;
        if self.can_delete_row(row) {
            self.store.remove(row);
            debug!("smart delete removed row {}", row);
        } else {
            if let Some(target) = self.store.row_mut(row) {
                target.clear();
            }
            debug!("smart delete cleared row {} in place (at floor)", row);
        }
        self.maybe_auto_expand();
        Ok(())
    }

    /// Unconditional structural removal. When this drops the table below
    /// its floor, empty rows are appended until the floor holds again.
    pub fn force_delete_row(&mut self, row: usize) -> Result<(), GridError> {
        self.check_row(row)?;
        self.store.remove(row);
        let floor = self.minimum_row_count + 1;
        if self.store.len() < floor {
            warn!(
                "force delete dropped the table below its floor; appending {} empty row(s)",
                floor - self.store.len()
            );
            self.store.ensure_len(floor);
        }
        self.maybe_auto_expand();
        Ok(())
    }

    /// Inserts one empty row at `at` (0..=row_count), shifting subsequent
    /// rows down.
    pub fn insert_row(&mut self, at: usize) -> Result<(), GridError> {
        if at > self.store.len() {
            return Err(GridError::RowIndex {
                index: at,
                row_count: self.store.len(),
            });
        }
        self.store.insert_empty(at);
        self.maybe_auto_expand();
        Ok(())
    }

    /// Blanks every cell of the row; the row itself survives.
    pub fn clear_row(&mut self, row: usize) -> Result<(), GridError> {
        self.check_row(row)?;
        if let Some(target) = self.store.row_mut(row) {
            target.clear();
        }
        Ok(())
    }

    /// Drops every empty row, re-indexes the survivors from zero, then tops
    /// the table back up to `max(minimum_row_count + 1, survivors + 1)` so
    /// the floor and the trailing empty row both hold. Idempotent.
    pub fn compact(&mut self) {
        let survivors = self.store.retain_non_empty();
        let target = (self.minimum_row_count + 1).max(survivors + 1);
        self.store.ensure_len(target);
        debug!(
            "compacted: {} data rows, {} rows total",
            survivors,
            self.store.len()
        );
    }

    // ------------------------------------------------------------------
    // Paste
    // ------------------------------------------------------------------

    /// Positional block write anchored at `(start_row, start_col)`. The
    /// store grows until `start_row + rows.len() + 1` rows exist before any
    /// value lands, so the block never collides with the reserved trailing
    /// row. Values extending past the last column are discarded. The anchor
    /// must be in range.
    pub fn paste(
        &mut self,
        rows: &[Vec<CellValue>],
        start_row: usize,
        start_col: usize,
    ) -> Result<(), GridError> {
        self.check_row(start_row)?;
        self.check_col(start_col)?;
        if rows.is_empty() {
            return Ok(());
        }

        self.store.ensure_len(start_row + rows.len() + 1);

        let column_count = self.columns.len();
        for (row_offset, values) in rows.iter().enumerate() {
            let row = start_row + row_offset;
            let Some(target) = self.store.row_mut(row) else {
                continue;
            };
            for (col_offset, value) in values.iter().enumerate() {
                let col = start_col + col_offset;
                if col >= column_count {
                    break;
                }
                if let Some(slot) = target.slot_mut(col) {
                    slot.value = value.clone();
                    slot.ui_state.reset();
                }
            }
        }

        self.maybe_auto_expand();
        debug!(
            "pasted {} row(s) at ({}, {}); table now {} rows",
            rows.len(),
            start_row,
            start_col,
            self.store.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Checkbox helpers
    // ------------------------------------------------------------------

    /// True iff the row's checkbox cell holds `Boolean(true)`.
    pub fn is_row_checked(&self, row: usize) -> Result<bool, GridError> {
        let col = self.require_checkbox_column()?;
        let value = self.get_cell(row, col)?;
        Ok(matches!(value, CellValue::Boolean(true)))
    }

    /// Checks or unchecks a row. Unchecking writes `Empty` rather than
    /// `Boolean(false)` so an untouched-then-unchecked row stays blank.
    pub fn set_row_checked(&mut self, row: usize, checked: bool) -> Result<(), GridError> {
        let col = self.require_checkbox_column()?;
        let value = if checked {
            CellValue::Boolean(true)
        } else {
            CellValue::Empty
        };
        self.set_cell(row, col, value)
    }

    /// Indices of every checked row, ascending.
    pub fn checked_row_indices(&self) -> Result<Vec<usize>, GridError> {
        let col = self.require_checkbox_column()?;
        let checked = self
            .store
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| matches!(row.slots[col].value, CellValue::Boolean(true)))
            .map(|(index, _)| index)
            .collect();
        Ok(checked)
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    pub(crate) fn check_row(&self, index: usize) -> Result<(), GridError> {
        if index >= self.store.len() {
            return Err(GridError::RowIndex {
                index,
                row_count: self.store.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_col(&self, index: usize) -> Result<(), GridError> {
        if index >= self.columns.len() {
            return Err(GridError::ColumnIndex {
                index,
                column_count: self.columns.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<usize, GridError> {
        self.column_index(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))
    }

    fn require_checkbox_column(&self) -> Result<usize, GridError> {
        self.columns
            .iter()
            .position(|c| c.special_kind == SpecialKind::Checkbox)
            .ok_or_else(|| GridError::config("checkbox", "table has no checkbox column"))
    }

    /// Keeps one empty row at the bottom: whenever the final row holds
    /// data, exactly one empty row is appended.
    fn maybe_auto_expand(&mut self) {
        if !self.store.last_row_is_empty() {
            let index = self.store.push_empty();
            debug!("auto-expanded: appended empty row {}", index);
        }
    }
}
