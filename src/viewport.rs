//! FILENAME: src/viewport.rs
//! PURPOSE: Virtual windowing over a dataset: which index range is visible.
//! CONTEXT: The viewport is pure index arithmetic. It holds no row data,
//! only a start index, a window size, and the cached dataset height the
//! caller refreshes via `set_total_rows`. Every movement clamps, so the
//! window never runs past either end of the dataset; target rows are
//! centered where possible. `MAX_VIEWPORT_ROWS` caps the window size.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Upper bound on the window size. No interactive surface renders more
/// rows at once; a request past this is a configuration mistake.
pub const MAX_VIEWPORT_ROWS: usize = 1_000;

// ============================================================================
// VIEWPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    start_index: usize,
    size: usize,
    total_rows: usize,
}

impl Viewport {
    /// A window of `size` rows positioned at the top of an empty dataset.
    /// Sizes of zero or above `MAX_VIEWPORT_ROWS` are rejected.
    pub fn new(size: usize) -> Result<Self, GridError> {
        check_size(size)?;
        Ok(Viewport {
            start_index: 0,
            size,
            total_rows: 0,
        })
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Refreshes the cached dataset height and pulls the window back into
    /// range if the dataset shrank out from under it.
    pub fn set_total_rows(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
        self.start_index = self.start_index.min(self.max_start());
    }

    /// Scrolls so `row` sits at the window's center, clamped to the
    /// dataset's ends. Rows near an edge land as close to center as the
    /// clamp allows.
    pub fn scroll_to_row(&mut self, row: usize) {
        let centered = row.saturating_sub(self.size / 2);
        self.start_index = centered.min(self.max_start());
    }

    /// Moves the window by a signed number of rows, clamped at both ends.
    pub fn scroll_by(&mut self, delta: isize) {
        self.start_index = if delta >= 0 {
            self.start_index
                .saturating_add(delta as usize)
                .min(self.max_start())
        } else {
            self.start_index.saturating_sub(delta.unsigned_abs())
        };
    }

    /// Advances one whole window.
    pub fn page_forward(&mut self) {
        self.scroll_by(self.size as isize);
    }

    /// Retreats one whole window.
    pub fn page_back(&mut self) {
        self.scroll_by(-(self.size as isize));
    }

    /// Changes the window size within the same bounds as `new`, then
    /// re-clamps the start index.
    pub fn resize(&mut self, size: usize) -> Result<(), GridError> {
        check_size(size)?;
        self.size = size;
        self.start_index = self.start_index.min(self.max_start());
        Ok(())
    }

    /// The visible inclusive index range `(first, last)`, `None` for an
    /// empty dataset. The range is shorter than `size` when the dataset is.
    pub fn window(&self) -> Option<(usize, usize)> {
        if self.total_rows == 0 {
            return None;
        }
        let last = (self.start_index + self.size - 1).min(self.total_rows - 1);
        Some((self.start_index, last))
    }

    /// Highest legal start index for the current size and dataset height.
    fn max_start(&self) -> usize {
        self.total_rows.saturating_sub(self.size)
    }
}

fn check_size(size: usize) -> Result<(), GridError> {
    if size == 0 {
        return Err(GridError::config("viewport", "size must be at least 1"));
    }
    if size > MAX_VIEWPORT_ROWS {
        return Err(GridError::config(
            "viewport",
            format!("size {} exceeds the {} row ceiling", size, MAX_VIEWPORT_ROWS),
        ));
    }
    Ok(())
}
