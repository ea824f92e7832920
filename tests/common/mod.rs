//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for grid engine integration tests.

use std::collections::HashMap;

use grid_engine::{
    CellRule, CellRuleKind, CellValue, ColumnSpec, CrossRowRule, GridTable, TableOptions,
    ValidationConfig, ValueType,
};

/// Test harness owning one table under test.
pub struct TestHarness {
    pub table: GridTable,
}

impl TestHarness {
    /// A Name/Age table with the given minimum row count and no rules.
    pub fn new(minimum_row_count: usize) -> Self {
        TestHarness {
            table: GridTable::new(
                people_columns(),
                TableOptions {
                    minimum_row_count,
                    ..TableOptions::default()
                },
            )
            .unwrap(),
        }
    }

    /// A Name/Age table preloaded with `count` generated people.
    pub fn with_people(count: usize) -> Self {
        let mut harness = Self::new(1);
        for i in 0..count {
            harness.set_person(i, &format!("Person {}", i), 20 + (i as i64 % 50));
        }
        harness
    }

    /// A Name/Age table carrying the standard rule set: Name required,
    /// Age in 0..=120, names unique across rows.
    pub fn with_validation() -> Self {
        TestHarness {
            table: GridTable::new(
                people_columns(),
                TableOptions {
                    minimum_row_count: 1,
                    validation: people_rules(),
                },
            )
            .unwrap(),
        }
    }

    /// A table with every special column: checkbox, user columns, alerts,
    /// delete trigger.
    pub fn with_special_columns() -> Self {
        let columns = vec![
            ColumnSpec::checkbox("select"),
            ColumnSpec::new("Name", ValueType::Text),
            ColumnSpec::new("Age", ValueType::Integer),
            ColumnSpec::validation_alerts("Alerts"),
            ColumnSpec::delete_row("remove"),
        ];
        TestHarness {
            table: GridTable::new(
                columns,
                TableOptions {
                    minimum_row_count: 1,
                    validation: people_rules(),
                },
            )
            .unwrap(),
        }
    }

    /// Write one person into a row through the by-name path.
    pub fn set_person(&mut self, row: usize, name: &str, age: i64) {
        self.table
            .set_cell_by_name(row, "Name", text(name))
            .unwrap();
        self.table
            .set_cell_by_name(row, "Age", int(age))
            .unwrap();
    }

    /// The Name cell of a row as a display string.
    pub fn name_at(&self, row: usize) -> String {
        self.table
            .get_cell_by_name(row, "Name")
            .unwrap()
            .display_value()
    }

    /// Indices of all non-empty rows, ascending.
    pub fn data_row_indices(&self) -> Vec<usize> {
        (0..self.table.row_count())
            .filter(|&row| !self.table.is_row_empty(row).unwrap())
            .collect()
    }
}

/// The standard two user columns used across the suite.
pub fn people_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Name", ValueType::Text),
        ColumnSpec::new("Age", ValueType::Integer),
    ]
}

/// Name required, Age in 0..=120, Name unique across rows.
pub fn people_rules() -> ValidationConfig {
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
        .with_cross_row_rule(CrossRowRule::UniqueValues {
            column: "Name".to_string(),
            message: "duplicate name".to_string(),
        })
}

pub fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

pub fn int(value: i64) -> CellValue {
    CellValue::Integer(value)
}

/// A name→value record in the shape `import_rows` consumes.
pub fn person_record(name: &str, age: i64) -> HashMap<String, CellValue> {
    let mut record = HashMap::new();
    record.insert("Name".to_string(), text(name));
    record.insert("Age".to_string(), int(age));
    record
}
