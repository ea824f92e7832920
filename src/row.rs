//! FILENAME: src/row.rs
//! PURPOSE: Row records and the dense row store backing a table.
//! CONTEXT: A `Row` is a fixed-width record: one `CellSlot` per arranged
//! column, plus its own position. The `RowStore` owns the `Vec<Row>` and the
//! structural mechanics (growth, insert, remove, re-indexing, emptiness
//! scans). Policy (minimum row floor, auto-expand, compaction targets) lives
//! in `table.rs`; the store only guarantees `row.index == position` after
//! every structural call.

use serde::{Deserialize, Serialize};

use crate::value::{CellSlot, CellValue};

// ============================================================================
// ROW
// ============================================================================

/// One record in the table. Width is fixed at creation and always equals the
/// table's arranged column count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Position in the store. Maintained by `RowStore` on every structural
    /// change; stale only inside a single in-progress insert/remove step.
    pub index: usize,
    pub slots: Vec<CellSlot>,
}

impl Row {
    /// A row of the given width with every slot blank and valid.
    pub fn empty(index: usize, width: usize) -> Self {
        Row {
            index,
            slots: vec![CellSlot::default(); width],
        }
    }

    /// True iff every slot value is blank. Blankness is literal:
    /// `Boolean(false)` and `Integer(0)` are data, not blanks.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.value.is_blank())
    }

    pub fn slot(&self, col: usize) -> Option<&CellSlot> {
        self.slots.get(col)
    }

    pub fn slot_mut(&mut self, col: usize) -> Option<&mut CellSlot> {
        self.slots.get_mut(col)
    }

    /// Blanks every slot value and resets its validation state. The row
    /// itself survives; this is the structure-preserving clear.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.value = CellValue::Empty;
            slot.ui_state.reset();
        }
    }
}

// ============================================================================
// ROW STORE
// ============================================================================

/// Dense, contiguous row storage. Rows are addressed by position only; there
/// are no stable row ids and no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowStore {
    rows: Vec<Row>,
    width: usize,
}

impl RowStore {
    pub fn new(width: usize) -> Self {
        RowStore {
            rows: Vec::new(),
            width,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// Appends one empty row and returns its index.
    pub fn push_empty(&mut self) -> usize {
        let index = self.rows.len();
        self.rows.push(Row::empty(index, self.width));
        index
    }

    /// Grows the store with empty rows until it holds at least `target_len`
    /// rows. Never shrinks.
    pub fn ensure_len(&mut self, target_len: usize) {
        while self.rows.len() < target_len {
            self.push_empty();
        }
    }

    /// Inserts one empty row at `index` (0..=len) and shifts everything
    /// after it down by one.
    pub fn insert_empty(&mut self, index: usize) {
        debug_assert!(index <= self.rows.len());
        self.rows.insert(index, Row::empty(index, self.width));
        self.reindex_from(index + 1);
    }

    /// Removes and returns the row at `index`, shifting everything after it
    /// up by one.
    pub fn remove(&mut self, index: usize) -> Row {
        let row = self.rows.remove(index);
        self.reindex_from(index);
        row
    }

    /// Drops every empty row, keeping non-empty rows in relative order, and
    /// re-indexes from zero. Returns the number of surviving rows.
    pub fn retain_non_empty(&mut self) -> usize {
        self.rows.retain(|row| !row.is_empty());
        self.reindex_from(0);
        self.rows.len()
    }

    /// Highest index holding a non-empty row, scanning from the bottom.
    pub fn last_non_empty(&self) -> Option<usize> {
        self.rows.iter().rposition(|row| !row.is_empty())
    }

    /// True iff the final row exists and is empty.
    pub fn last_row_is_empty(&self) -> bool {
        self.rows.last().map(Row::is_empty).unwrap_or(false)
    }

    fn reindex_from(&mut self, start: usize) {
        for (position, row) in self.rows.iter_mut().enumerate().skip(start) {
            row.index = position;
        }
    }
}
