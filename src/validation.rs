//! FILENAME: src/validation.rs
//! PURPOSE: Validation rules, configuration, and the three evaluation entry
//! points: whole-dataset boolean check, exhaustive batch validation, and the
//! single-cell hook for continuous mode.
//! CONTEXT: Rules are plain data, not closures, so a rule set can be built
//! from config files or sent across an API boundary. Cell rules run in
//! declared order and the first failing rule wins for that cell. Cross-row
//! rules are the opposite: all of them always run and their findings
//! accumulate per row. Validation failures are results, never `Err`;
//! `GridError` appears only for malformed configuration and bad indices.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnSpec, SpecialKind};
use crate::error::GridError;
use crate::table::GridTable;
use crate::value::{CellUiState, CellValue, ValueType};

// ============================================================================
// CANCELLATION
// ============================================================================

/// Shared cancellation flag for batch validation. Clone it, hand one copy to
/// the batch call and keep the other to trip from wherever progress is
/// supervised. Checked between rows; the row in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CELL RULES
// ============================================================================

/// One per-cell constraint. Every kind except `Required` passes blank
/// values, so optional columns validate cleanly; pair with `Required` to
/// make a column mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellRuleKind {
    /// Fails on blank values.
    Required,
    /// Value must conform to the column's declared type.
    TypeMatches,
    /// Numeric value within the inclusive bounds. Non-numeric values fail.
    NumberRange { min: Option<f64>, max: Option<f64> },
    /// Display-text length (in chars) within the inclusive bounds.
    TextLength { min: Option<usize>, max: Option<usize> },
    /// Display text must equal one of the listed values (case-sensitive).
    OneOf { values: Vec<String> },
    /// Display text must match the regex.
    Pattern { regex: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRule {
    pub kind: CellRuleKind,
    /// Shown to the user when the rule fails.
    pub message: String,
}

impl CellRule {
    pub fn new(kind: CellRuleKind, message: impl Into<String>) -> Self {
        CellRule {
            kind,
            message: message.into(),
        }
    }
}

// ============================================================================
// CROSS-ROW RULES
// ============================================================================

/// A constraint over the whole dataset rather than one cell. Evaluated
/// against the snapshot of non-empty rows; all cross-row rules always run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrossRowRule {
    /// Every row in a group sharing a non-blank value in `column` is
    /// flagged, the first occurrence included.
    UniqueValues { column: String, message: String },
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// The rule set attached to a table at construction. Rules are fixed for
/// the table's lifetime; only `enabled` can be toggled afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub enabled: bool,
    /// Ordered rule lists keyed by column name.
    pub cell_rules: HashMap<String, Vec<CellRule>>,
    pub cross_row_rules: Vec<CrossRowRule>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            enabled: true,
            cell_rules: HashMap::new(),
            cross_row_rules: Vec::new(),
        }
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        ValidationConfig::default()
    }

    /// Appends a rule to the named column's ordered list.
    pub fn with_cell_rule(mut self, column: impl Into<String>, rule: CellRule) -> Self {
        self.cell_rules.entry(column.into()).or_default().push(rule);
        self
    }

    pub fn with_cross_row_rule(mut self, rule: CrossRowRule) -> Self {
        self.cross_row_rules.push(rule);
        self
    }
}

/// Rejects configurations a table must not be constructed with: rules
/// targeting unknown or special columns, uncompilable patterns, inverted
/// bounds. Called once from `GridTable::new`.
pub(crate) fn validate_config(
    config: &ValidationConfig,
    columns: &[ColumnSpec],
) -> Result<(), GridError> {
    let find = |name: &str| columns.iter().find(|c| c.name == name);

    for (name, rules) in &config.cell_rules {
        let Some(column) = find(name) else {
            return Err(GridError::config(
                name,
                "validation rules target an unknown column",
            ));
        };
        if column.special_kind.is_special() {
            return Err(GridError::config(
                name,
                "validation rules cannot target a special column",
            ));
        }
        for rule in rules {
            match &rule.kind {
                CellRuleKind::NumberRange {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return Err(GridError::config(
                        name,
                        format!("number range min {} exceeds max {}", min, max),
                    ));
                }
                CellRuleKind::TextLength {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return Err(GridError::config(
                        name,
                        format!("text length min {} exceeds max {}", min, max),
                    ));
                }
                CellRuleKind::Pattern { regex } => {
                    if let Err(err) = Regex::new(regex) {
                        return Err(GridError::config(
                            name,
                            format!("invalid pattern '{}': {}", regex, err),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    for rule in &config.cross_row_rules {
        let CrossRowRule::UniqueValues { column, .. } = rule;
        match find(column) {
            None => {
                return Err(GridError::config(
                    column,
                    "cross-row rule targets an unknown column",
                ));
            }
            Some(spec) if spec.special_kind.is_special() => {
                return Err(GridError::config(
                    column,
                    "cross-row rule cannot target a special column",
                ));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

// ============================================================================
// BATCH REPORT
// ============================================================================

/// Aggregate outcome of one batch validation run. Built fresh per call and
/// returned to the caller; the table itself keeps only per-slot `ui_state`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Evaluated cells whose rules all passed (rule-less cells included).
    pub valid_cells: usize,
    /// Evaluated cells whose first applicable rule failed.
    pub invalid_cells: usize,
    /// Failure messages per offending cell, keyed by
    /// (row, arranged column index).
    pub cell_errors: HashMap<(usize, usize), Vec<String>>,
    /// First cross-row message per offending row.
    pub row_errors: BTreeMap<usize, String>,
    /// True when a `CancelToken` tripped mid-run; the report is partial and
    /// already-processed rows keep their new state.
    pub cancelled: bool,
    /// Non-empty rows fully evaluated before completion or cancellation.
    pub rows_processed: usize,
}

impl BatchReport {
    pub fn is_all_valid(&self) -> bool {
        !self.cancelled && self.invalid_cells == 0 && self.row_errors.is_empty()
    }
}

// ============================================================================
// RULE EVALUATION
// ============================================================================

static REGEX_CACHE: Lazy<Mutex<FxHashMap<String, Option<Regex>>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Compiles through a process-wide cache. Patterns reaching this point were
/// compile-checked at table construction; an uncached invalid pattern just
/// never matches.
fn pattern_matches(pattern: &str, text: &str) -> bool {
    let mut cache = REGEX_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    let compiled = cache
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok());
    compiled.as_ref().map(|re| re.is_match(text)).unwrap_or(false)
}

/// True when the value satisfies the rule.
fn rule_passes(kind: &CellRuleKind, value: &CellValue, declared: ValueType) -> bool {
    if value.is_blank() {
        return !matches!(kind, CellRuleKind::Required);
    }
    match kind {
        CellRuleKind::Required => true,
        CellRuleKind::TypeMatches => value.matches_type(declared),
        CellRuleKind::NumberRange { min, max } => match value.as_number() {
            Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
            None => false,
        },
        CellRuleKind::TextLength { min, max } => {
            let length = value.display_value().chars().count();
            min.map_or(true, |lo| length >= lo) && max.map_or(true, |hi| length <= hi)
        }
        CellRuleKind::OneOf { values } => {
            let text = value.display_value();
            values.iter().any(|candidate| candidate == &text)
        }
        CellRuleKind::Pattern { regex } => pattern_matches(regex, &value.display_value()),
    }
}

/// Runs the ordered rule list against one value; returns the first failing
/// rule's message, `None` when everything passes.
fn first_failure<'a>(
    rules: &'a [CellRule],
    value: &CellValue,
    declared: ValueType,
) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| !rule_passes(&rule.kind, value, declared))
        .map(|rule| rule.message.as_str())
}

/// Arranged indices, declared types, and rule lists for every user column,
/// resolved once per run.
fn user_columns<'a>(
    table: &'a GridTable,
    config: &'a ValidationConfig,
) -> Vec<(usize, ValueType, &'a [CellRule])> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.special_kind == SpecialKind::None)
        .map(|(col, spec)| {
            let rules = config
                .cell_rules
                .get(&spec.name)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (col, spec.value_type, rules)
        })
        .collect()
}

/// Rows sharing a duplicated non-blank value in `col`, ascending, first
/// occurrences included. Only non-empty rows participate.
fn duplicate_rows(table: &GridTable, col: usize) -> Vec<usize> {
    let mut groups: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for row in table.store.rows() {
        if row.is_empty() {
            continue;
        }
        let value = &row.slots[col].value;
        if value.is_blank() {
            continue;
        }
        groups.entry(value.display_value()).or_default().push(row.index);
    }

    let mut flagged: Vec<usize> = groups
        .into_values()
        .filter(|members| members.len() > 1)
        .flatten()
        .collect();
    flagged.sort_unstable();
    flagged
}

// ============================================================================
// DATASET CHECK
// ============================================================================

/// Boolean short-circuit over the whole dataset: every non-empty row's user
/// columns, then every cross-row rule. Mutates nothing, writes no
/// `ui_state`. Immediately `true` when validation is disabled.
pub fn dataset_is_valid(table: &GridTable) -> bool {
    let config = &table.validation;
    if !config.enabled {
        return true;
    }

    let columns = user_columns(table, config);
    for row in table.store.rows() {
        if row.is_empty() {
            continue;
        }
        for (col, declared, rules) in &columns {
            if first_failure(rules, &row.slots[*col].value, *declared).is_some() {
                return false;
            }
        }
    }

    for rule in &config.cross_row_rules {
        let CrossRowRule::UniqueValues { column, .. } = rule;
        if let Some(col) = table.column_index(column) {
            if !duplicate_rows(table, col).is_empty() {
                return false;
            }
        }
    }

    true
}

// ============================================================================
// BATCH VALIDATION
// ============================================================================

/// Exhaustive validation pass. Every slot's `ui_state` resets first, then
/// each non-empty row's user columns are evaluated in order and failures
/// land both in the report and in the offending slot's `ui_state`. Cross-row
/// rules run after the cell pass. The token is checked between rows; when it
/// trips, the partial report comes back with `cancelled = true` and
/// processed rows keep their fresh state.
pub fn validate_batch(table: &mut GridTable, cancel: Option<&CancelToken>) -> BatchReport {
    for row in table.store.rows_mut() {
        for slot in &mut row.slots {
            slot.ui_state.reset();
        }
    }

    let mut report = BatchReport::default();
    let config = table.validation.clone();
    if !config.enabled {
        return report;
    }

    let columns = user_columns(table, &config);
    let mut failures: Vec<(usize, usize, String)> = Vec::new();

    for row in table.store.rows() {
        if cancel.map_or(false, CancelToken::is_cancelled) {
            report.cancelled = true;
            debug!(
                "batch validation cancelled after {} row(s)",
                report.rows_processed
            );
            break;
        }
        if row.is_empty() {
            continue;
        }
        for (col, declared, rules) in &columns {
            match first_failure(rules, &row.slots[*col].value, *declared) {
                Some(message) => {
                    report.invalid_cells += 1;
                    report
                        .cell_errors
                        .entry((row.index, *col))
                        .or_default()
                        .push(message.to_string());
                    failures.push((row.index, *col, message.to_string()));
                }
                None => report.valid_cells += 1,
            }
        }
        report.rows_processed += 1;
    }

    for (row, col, message) in failures {
        if let Some(slot) = table.store.row_mut(row).and_then(|r| r.slot_mut(col)) {
            slot.ui_state = CellUiState::invalid(message);
        }
    }

    if !report.cancelled {
        run_cross_row_rules(table, &config, &mut report);
    }

    debug!(
        "batch validation: {} row(s) processed, {} invalid cell(s), {} flagged row(s)",
        report.rows_processed,
        report.invalid_cells,
        report.row_errors.len()
    );
    report
}

/// All cross-row rules run and their findings accumulate; each offending row
/// keeps the first message that flagged it. The offending cell's `ui_state`
/// is marked only when the cell pass left it valid, so per-cell messages are
/// not clobbered.
fn run_cross_row_rules(table: &mut GridTable, config: &ValidationConfig, report: &mut BatchReport) {
    for rule in &config.cross_row_rules {
        let CrossRowRule::UniqueValues { column, message } = rule;
        let Some(col) = table.column_index(column) else {
            continue;
        };
        for row in duplicate_rows(table, col) {
            report.row_errors.entry(row).or_insert_with(|| message.clone());
            if let Some(slot) = table.store.row_mut(row).and_then(|r| r.slot_mut(col)) {
                if slot.ui_state.is_valid {
                    slot.ui_state = CellUiState::invalid(message.clone());
                }
            }
        }
    }
}

// ============================================================================
// CONTINUOUS VALIDATION
// ============================================================================

/// Single-cell re-check for continuous mode; call after an edit. Updates the
/// slot's `ui_state` in place and returns whether the cell passed. Cells in
/// empty rows and special columns always pass (their state resets). Cross-row
/// rules are batch-only.
pub fn validate_cell(table: &mut GridTable, row: usize, col: usize) -> Result<bool, GridError> {
    table.check_row(row)?;
    table.check_col(col)?;

    if !table.validation.enabled {
        return Ok(true);
    }

    let spec = &table.columns[col];
    let is_user_column = spec.special_kind == SpecialKind::None;
    let declared = spec.value_type;
    let rules: Vec<CellRule> = table
        .validation
        .cell_rules
        .get(&spec.name)
        .cloned()
        .unwrap_or_default();

    let row_is_empty = table.store.row(row).map_or(true, |r| r.is_empty());
    let Some(slot) = table.store.row_mut(row).and_then(|r| r.slot_mut(col)) else {
        return Ok(true);
    };

    if row_is_empty || !is_user_column {
        slot.ui_state.reset();
        return Ok(true);
    }

    match first_failure(&rules, &slot.value, declared) {
        Some(message) => {
            let message = message.to_string();
            slot.ui_state = CellUiState::invalid(message);
            Ok(false)
        }
        None => {
            slot.ui_state.reset();
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableOptions;
    use crate::value::ValueType;

    fn rule(kind: CellRuleKind) -> CellRule {
        CellRule::new(kind, "failed")
    }

    fn people_table(config: ValidationConfig) -> GridTable {
        let columns = vec![
            ColumnSpec::new("Name", ValueType::Text),
            ColumnSpec::new("Age", ValueType::Integer),
        ];
        GridTable::new(
            columns,
            TableOptions {
                minimum_row_count: 1,
                validation: config,
            },
        )
        .unwrap()
    }

    fn strict_config() -> ValidationConfig {
        ValidationConfig::new()
            .with_cell_rule("Name", CellRule::new(CellRuleKind::Required, "name required"))
            .with_cell_rule(
                "Age",
                CellRule::new(
                    CellRuleKind::NumberRange {
                        min: Some(0.0),
                        max: Some(120.0),
                    },
                    "age out of range",
                ),
            )
    }

    // ------------------------------------------------------------------
    // Rule evaluation
    // ------------------------------------------------------------------

    #[test]
    fn test_required_fails_blank_only() {
        let kind = CellRuleKind::Required;
        assert!(!rule_passes(&kind, &CellValue::Empty, ValueType::Text));
        assert!(!rule_passes(&kind, &CellValue::from(""), ValueType::Text));
        assert!(rule_passes(&kind, &CellValue::from("x"), ValueType::Text));
        assert!(rule_passes(&kind, &CellValue::Boolean(false), ValueType::Text));
    }

    #[test]
    fn test_blank_passes_every_other_rule() {
        let kinds = [
            CellRuleKind::TypeMatches,
            CellRuleKind::NumberRange {
                min: Some(10.0),
                max: None,
            },
            CellRuleKind::TextLength {
                min: Some(3),
                max: None,
            },
            CellRuleKind::OneOf { values: vec!["a".to_string()] },
            CellRuleKind::Pattern {
                regex: "^x$".to_string(),
            },
        ];
        for kind in &kinds {
            assert!(
                rule_passes(kind, &CellValue::Empty, ValueType::Text),
                "{:?} rejected a blank",
                kind
            );
        }
    }

    #[test]
    fn test_number_range_bounds_inclusive() {
        let kind = CellRuleKind::NumberRange {
            min: Some(0.0),
            max: Some(10.0),
        };
        assert!(rule_passes(&kind, &CellValue::from(0i64), ValueType::Integer));
        assert!(rule_passes(&kind, &CellValue::from(10.0), ValueType::Number));
        assert!(!rule_passes(&kind, &CellValue::from(-1i64), ValueType::Integer));
        assert!(!rule_passes(&kind, &CellValue::from(10.5), ValueType::Number));
        // Non-numeric content fails a numeric rule.
        assert!(!rule_passes(&kind, &CellValue::from("abc"), ValueType::Integer));
    }

    #[test]
    fn test_text_length_counts_chars() {
        let kind = CellRuleKind::TextLength {
            min: Some(2),
            max: Some(4),
        };
        assert!(rule_passes(&kind, &CellValue::from("ab"), ValueType::Text));
        assert!(rule_passes(&kind, &CellValue::from("åäöü"), ValueType::Text));
        assert!(!rule_passes(&kind, &CellValue::from("a"), ValueType::Text));
        assert!(!rule_passes(&kind, &CellValue::from("abcde"), ValueType::Text));
    }

    #[test]
    fn test_one_of_is_case_sensitive() {
        let kind = CellRuleKind::OneOf {
            values: vec!["Red".to_string(), "Blue".to_string()],
        };
        assert!(rule_passes(&kind, &CellValue::from("Red"), ValueType::Text));
        assert!(!rule_passes(&kind, &CellValue::from("red"), ValueType::Text));
    }

    #[test]
    fn test_pattern_rule_matches_display_text() {
        let kind = CellRuleKind::Pattern {
            regex: "^[A-Z]{3}$".to_string(),
        };
        assert!(rule_passes(&kind, &CellValue::from("ABC"), ValueType::Text));
        assert!(!rule_passes(&kind, &CellValue::from("ABCD"), ValueType::Text));
    }

    #[test]
    fn test_type_matches_follows_declared_type() {
        let kind = CellRuleKind::TypeMatches;
        assert!(rule_passes(&kind, &CellValue::from(3i64), ValueType::Integer));
        assert!(!rule_passes(&kind, &CellValue::from("three"), ValueType::Integer));
        // Integers are acceptable wherever numbers are declared.
        assert!(rule_passes(&kind, &CellValue::from(3i64), ValueType::Number));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let rules = vec![
            CellRule::new(
                CellRuleKind::TextLength {
                    min: Some(10),
                    max: None,
                },
                "too short",
            ),
            CellRule::new(
                CellRuleKind::OneOf {
                    values: vec!["other".to_string()],
                },
                "not in list",
            ),
        ];
        let message = first_failure(&rules, &CellValue::from("x"), ValueType::Text);
        assert_eq!(message, Some("too short"));
    }

    // ------------------------------------------------------------------
    // Configuration validation
    // ------------------------------------------------------------------

    #[test]
    fn test_config_rejects_unknown_column() {
        let config = ValidationConfig::new()
            .with_cell_rule("Ghost", rule(CellRuleKind::Required));
        let columns = vec![ColumnSpec::new("Name", ValueType::Text)];
        assert!(validate_config(&config, &columns).is_err());
    }

    #[test]
    fn test_config_rejects_rules_on_special_columns() {
        let config = ValidationConfig::new()
            .with_cell_rule("select", rule(CellRuleKind::Required));
        let columns = vec![
            ColumnSpec::checkbox("select"),
            ColumnSpec::new("Name", ValueType::Text),
        ];
        assert!(validate_config(&config, &columns).is_err());
    }

    #[test]
    fn test_config_rejects_bad_pattern() {
        let config = ValidationConfig::new().with_cell_rule(
            "Name",
            rule(CellRuleKind::Pattern {
                regex: "([unclosed".to_string(),
            }),
        );
        let columns = vec![ColumnSpec::new("Name", ValueType::Text)];
        let err = validate_config(&config, &columns).unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_config_rejects_inverted_bounds() {
        let config = ValidationConfig::new().with_cell_rule(
            "Age",
            rule(CellRuleKind::NumberRange {
                min: Some(10.0),
                max: Some(1.0),
            }),
        );
        let columns = vec![ColumnSpec::new("Age", ValueType::Integer)];
        assert!(validate_config(&config, &columns).is_err());
    }

    #[test]
    fn test_config_rejects_cross_row_rule_on_unknown_column() {
        let config = ValidationConfig::new().with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Ghost".to_string(),
            message: "dup".to_string(),
        });
        let columns = vec![ColumnSpec::new("Name", ValueType::Text)];
        assert!(validate_config(&config, &columns).is_err());
    }

    // ------------------------------------------------------------------
    // Dataset check
    // ------------------------------------------------------------------

    #[test]
    fn test_dataset_valid_when_disabled() {
        let mut config = strict_config();
        config.enabled = false;
        let mut table = people_table(config);
        table.set_cell_by_name(0, "Age", CellValue::from(999i64)).unwrap();
        assert!(dataset_is_valid(&table));
    }

    #[test]
    fn test_dataset_check_finds_cell_failure() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        table.set_cell_by_name(0, "Age", CellValue::from(30i64)).unwrap();
        assert!(dataset_is_valid(&table));

        table.set_cell_by_name(1, "Age", CellValue::from(999i64)).unwrap();
        assert!(!dataset_is_valid(&table));
    }

    #[test]
    fn test_dataset_check_finds_duplicates() {
        let config = ValidationConfig::new().with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Name".to_string(),
            message: "duplicate name".to_string(),
        });
        let mut table = people_table(config);
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        table.set_cell_by_name(1, "Name", CellValue::from("Ann")).unwrap();
        assert!(!dataset_is_valid(&table));
    }

    #[test]
    fn test_dataset_check_mutates_nothing() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Age", CellValue::from(999i64)).unwrap();
        assert!(!dataset_is_valid(&table));
        // The short-circuit check writes no ui_state.
        let col = table.column_index("Age").unwrap();
        assert!(table.ui_state(0, col).unwrap().is_valid);
    }

    // ------------------------------------------------------------------
    // Batch validation
    // ------------------------------------------------------------------

    #[test]
    fn test_batch_counts_every_user_cell_of_data_rows() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        table.set_cell_by_name(0, "Age", CellValue::from(30i64)).unwrap();
        table.set_cell_by_name(1, "Age", CellValue::from(999i64)).unwrap();

        let report = validate_batch(&mut table, None);
        // Two data rows, two user columns each.
        assert_eq!(report.valid_cells + report.invalid_cells, 4);
        assert_eq!(report.invalid_cells, 2); // missing name + out-of-range age
        assert_eq!(report.rows_processed, 2);
        assert!(!report.cancelled);
        assert!(!report.is_all_valid());
    }

    #[test]
    fn test_batch_writes_ui_state_and_report() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Age", CellValue::from(999i64)).unwrap();

        let report = validate_batch(&mut table, None);
        let age = table.column_index("Age").unwrap();
        let name = table.column_index("Name").unwrap();

        let state = table.ui_state(0, age).unwrap();
        assert!(!state.is_valid);
        assert_eq!(state.error_message.as_deref(), Some("age out of range"));
        assert_eq!(
            report.cell_errors.get(&(0, age)),
            Some(&vec!["age out of range".to_string()])
        );
        assert_eq!(
            report.cell_errors.get(&(0, name)),
            Some(&vec!["name required".to_string()])
        );
    }

    #[test]
    fn test_batch_resets_stale_state() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Age", CellValue::from(999i64)).unwrap();
        validate_batch(&mut table, None);

        table.set_cell_by_name(0, "Age", CellValue::from(30i64)).unwrap();
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        let report = validate_batch(&mut table, None);
        assert!(report.is_all_valid());
        let age = table.column_index("Age").unwrap();
        assert!(table.ui_state(0, age).unwrap().is_valid);
    }

    #[test]
    fn test_batch_cancellation_returns_partial_report() {
        let mut table = people_table(strict_config());
        table.set_cell_by_name(0, "Age", CellValue::from(999i64)).unwrap();

        let token = CancelToken::new();
        token.cancel();
        let report = validate_batch(&mut table, Some(&token));
        assert!(report.cancelled);
        assert_eq!(report.rows_processed, 0);
        assert_eq!(report.invalid_cells, 0);
        // The reset still happened before cancellation hit.
        let age = table.column_index("Age").unwrap();
        assert!(table.ui_state(0, age).unwrap().is_valid);
    }

    #[test]
    fn test_cross_row_flags_every_duplicate() {
        let config = ValidationConfig::new().with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Name".to_string(),
            message: "duplicate name".to_string(),
        });
        let mut table = people_table(config);
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        table.set_cell_by_name(1, "Name", CellValue::from("Bea")).unwrap();
        table.set_cell_by_name(2, "Name", CellValue::from("Ann")).unwrap();

        let report = validate_batch(&mut table, None);
        let flagged: Vec<usize> = report.row_errors.keys().copied().collect();
        assert_eq!(flagged, vec![0, 2]);
        assert_eq!(report.row_errors[&0], "duplicate name");

        let name = table.column_index("Name").unwrap();
        assert!(!table.ui_state(0, name).unwrap().is_valid);
        assert!(table.ui_state(1, name).unwrap().is_valid);
    }

    #[test]
    fn test_cell_message_survives_cross_row_overlap() {
        // The same cell fails a cell rule and participates in a duplicate
        // group; the cell rule's message stays on the slot.
        let config = ValidationConfig::new()
            .with_cell_rule(
                "Name",
                CellRule::new(
                    CellRuleKind::TextLength {
                        min: Some(10),
                        max: None,
                    },
                    "too short",
                ),
            )
            .with_cross_row_rule(CrossRowRule::UniqueValues {
                column: "Name".to_string(),
                message: "duplicate name".to_string(),
            });
        let mut table = people_table(config);
        table.set_cell_by_name(0, "Name", CellValue::from("Ann")).unwrap();
        table.set_cell_by_name(1, "Name", CellValue::from("Ann")).unwrap();

        let report = validate_batch(&mut table, None);
        let name = table.column_index("Name").unwrap();
        let state = table.ui_state(0, name).unwrap();
        assert_eq!(state.error_message.as_deref(), Some("too short"));
        assert_eq!(report.row_errors[&0], "duplicate name");
    }

    #[test]
    fn test_blank_values_exempt_from_uniqueness() {
        let config = ValidationConfig::new().with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Name".to_string(),
            message: "duplicate name".to_string(),
        });
        let mut table = people_table(config);
        // Two rows with data in Age only; their blank Names are not duplicates.
        table.set_cell_by_name(0, "Age", CellValue::from(1i64)).unwrap();
        table.set_cell_by_name(1, "Age", CellValue::from(2i64)).unwrap();

        let report = validate_batch(&mut table, None);
        assert!(report.row_errors.is_empty());
    }

    // ------------------------------------------------------------------
    // Continuous validation
    // ------------------------------------------------------------------

    #[test]
    fn test_validate_cell_updates_state_in_place() {
        let mut table = people_table(strict_config());
        let age = table.column_index("Age").unwrap();
        table.set_cell(0, age, CellValue::from(999i64)).unwrap();

        assert!(!validate_cell(&mut table, 0, age).unwrap());
        assert!(!table.ui_state(0, age).unwrap().is_valid);

        table.set_cell(0, age, CellValue::from(30i64)).unwrap();
        assert!(validate_cell(&mut table, 0, age).unwrap());
        assert!(table.ui_state(0, age).unwrap().is_valid);
    }

    #[test]
    fn test_validate_cell_passes_empty_rows() {
        // Required rule on Name, but the row is entirely blank; the trailing
        // entry row must not light up.
        let mut table = people_table(strict_config());
        let name = table.column_index("Name").unwrap();
        assert!(validate_cell(&mut table, 1, name).unwrap());
        assert!(table.ui_state(1, name).unwrap().is_valid);
    }

    #[test]
    fn test_validate_cell_bounds() {
        let mut table = people_table(strict_config());
        assert!(validate_cell(&mut table, 99, 0).is_err());
        assert!(validate_cell(&mut table, 0, 99).is_err());
    }

    #[test]
    fn test_rule_serde_roundtrip() {
        let config = strict_config().with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Name".to_string(),
            message: "duplicate".to_string(),
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: ValidationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
