//! FILENAME: src/transfer.rs
//! PURPOSE: Bulk record import and export with a cooperative deadline.
//! CONTEXT: Records cross this boundary as name→value maps, the shape an
//! API layer or file loader naturally produces. Both directions check their
//! optional deadline between rows, never mid-row; on expiry they return
//! `GridError::Timeout` carrying how many rows completed, and everything
//! already written (or already deleted) stays in place. Neither direction
//! is transactional.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::column::SpecialKind;
use crate::error::GridError;
use crate::table::GridTable;
use crate::value::CellValue;

/// Key carrying the per-row alert summary in exported records when the
/// table has no ValidationAlerts column of its own.
pub const DEFAULT_ALERTS_KEY: &str = "validation_alerts";

// ============================================================================
// DEADLINE
// ============================================================================

/// Wall-clock limit for one transfer call, measured from construction.
struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn new(limit: Option<Duration>) -> Self {
        Deadline {
            started: Instant::now(),
            limit,
        }
    }

    /// Errors once the limit has passed. `completed_rows` is whatever the
    /// caller finished before this check; it travels inside the error so
    /// the partial effect is countable.
    fn check(&self, completed_rows: usize) -> Result<(), GridError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > limit {
            return Err(GridError::Timeout {
                elapsed,
                completed_rows,
            });
        }
        Ok(())
    }
}

// ============================================================================
// IMPORT
// ============================================================================

/// Writes one record per row starting at `start_row` (default: the first
/// row after the last data row), growing the store as needed. Records go
/// through the same path as `set_row`: unknown keys are skipped, written
/// slots reset their validation state, and the trailing empty row is kept.
/// Returns the number of records written.
pub fn import_rows(
    table: &mut GridTable,
    records: &[HashMap<String, CellValue>],
    start_row: Option<usize>,
    timeout: Option<Duration>,
) -> Result<usize, GridError> {
    let deadline = Deadline::new(timeout);
    let start = start_row.unwrap_or_else(|| {
        table.last_data_row_index().map_or(0, |last| last + 1)
    });

    for (offset, record) in records.iter().enumerate() {
        deadline.check(offset)?;
        let row = start + offset;
        table.store.ensure_len(row + 1);
        table.set_row(row, record)?;
    }

    debug!(
        "imported {} record(s) starting at row {}",
        records.len(),
        start
    );
    Ok(records.len())
}

// ============================================================================
// EXPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Adds a joined summary of each row's current validation messages
    /// under the ValidationAlerts column's name (or `DEFAULT_ALERTS_KEY`).
    /// Rows without messages get no summary entry.
    pub include_validation_alerts: bool,
    /// Smart-deletes every exported row, descending, once the export data
    /// is built. Not transactional: a deadline hit mid-sweep leaves the
    /// completed deletes in place.
    pub remove_after: bool,
    pub timeout: Option<Duration>,
}

/// Exports every non-empty row as a name→value map over the user columns
/// (blank cells included, special columns never). Row order is preserved.
pub fn export_rows(
    table: &mut GridTable,
    options: &ExportOptions,
) -> Result<Vec<HashMap<String, CellValue>>, GridError> {
    let deadline = Deadline::new(options.timeout);

    let alerts_key = table
        .columns
        .iter()
        .find(|c| c.special_kind == SpecialKind::ValidationAlerts)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| DEFAULT_ALERTS_KEY.to_string());
    let user_columns: Vec<(usize, String)> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.special_kind == SpecialKind::None)
        .map(|(col, c)| (col, c.name.clone()))
        .collect();

    let mut records = Vec::new();
    let mut exported_indices = Vec::new();
    for row in table.store.rows() {
        if row.is_empty() {
            continue;
        }
        deadline.check(records.len())?;

        let mut record: HashMap<String, CellValue> = user_columns
            .iter()
            .map(|(col, name)| (name.clone(), row.slots[*col].value.clone()))
            .collect();
        if options.include_validation_alerts {
            let messages: Vec<&str> = row
                .slots
                .iter()
                .filter_map(|slot| slot.ui_state.error_message.as_deref())
                .collect();
            if !messages.is_empty() {
                record.insert(alerts_key.clone(), CellValue::Text(messages.join("; ")));
            }
        }
        exported_indices.push(row.index);
        records.push(record);
    }

    if options.remove_after {
        let mut removed = 0usize;
        for &row in exported_indices.iter().rev() {
            deadline.check(removed)?;
            table.smart_delete_row(row)?;
            removed += 1;
        }
        debug!("removed {} exported row(s)", removed);
    }

    debug!("exported {} record(s)", records.len());
    Ok(records)
}
