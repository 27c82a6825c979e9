//! Table-level structural checks.
//!
//! Everything here is advisory except `no_duplicates`, which removes exact
//! duplicate rows immediately.

use cleanframe_core::{Report, Table, TableRule};
use std::collections::HashSet;

/// Runs row-count bounds, duplicate-row removal, unique-key detection and the
/// expected-column diff, in that order.
///
/// Returns the number of duplicate rows removed.
pub fn run_structural_checks(table: &mut Table, rule: &TableRule, report: &mut Report) -> usize {
    check_row_count(table, rule, report);

    let removed = if rule.no_duplicates {
        remove_duplicate_rows(table, report)
    } else {
        0
    };

    if let Some(keys) = &rule.unique_keys {
        check_unique_keys(table, keys, report);
    }

    if let Some(expected) = &rule.expected_columns {
        check_expected_columns(table, expected, report);
    }

    removed
}

fn check_row_count(table: &Table, rule: &TableRule, report: &mut Report) {
    let rows = table.len();
    if let Some(min) = rule.min_rows {
        if rows < min {
            report.warn(format!(
                "Table has {} row(s), fewer than min_rows={}.",
                rows, min
            ));
        }
    }
    if let Some(max) = rule.max_rows {
        if rows > max {
            report.warn(format!(
                "Table has {} row(s), more than max_rows={}.",
                rows, max
            ));
        }
    }
}

fn remove_duplicate_rows(table: &mut Table, report: &mut Report) -> usize {
    let mut seen = HashSet::new();
    let flags: Vec<bool> = table.rows().map(|row| !seen.insert(row.key(None))).collect();

    let removed = table.drop_rows(&flags);
    if removed > 0 {
        report.info(format!("Removed {} duplicate row(s).", removed));
    }
    removed
}

fn check_unique_keys(table: &Table, keys: &[String], report: &mut Report) {
    let missing: Vec<&str> = keys
        .iter()
        .filter(|key| !table.has_column(key))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        report.warn(format!(
            "Cannot check unique key ({}): missing column(s) {}.",
            keys.join(", "),
            missing.join(", ")
        ));
        return;
    }

    let mut seen = HashSet::new();
    let violations = table
        .rows()
        .filter(|row| !seen.insert(row.key(Some(keys))))
        .count();
    if violations > 0 {
        report.warn(format!(
            "Found {} row(s) violating unique key ({}).",
            violations,
            keys.join(", ")
        ));
    }
}

fn check_expected_columns(table: &Table, expected: &[String], report: &mut Report) {
    let missing: Vec<&str> = expected
        .iter()
        .filter(|name| !table.has_column(name))
        .map(String::as_str)
        .collect();
    let unexpected: Vec<&str> = table
        .column_names()
        .filter(|name| !expected.iter().any(|e| e == name))
        .collect();

    if !missing.is_empty() {
        report.warn(format!(
            "Missing expected column(s): {}.",
            missing.join(", ")
        ));
    }
    if !unexpected.is_empty() {
        report.warn(format!("Unexpected column(s): {}.", unexpected.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanframe_core::{TableRuleBuilder, Value};
    use pretty_assertions::assert_eq;

    fn orders() -> Table {
        Table::from_columns(vec![
            ("order_id", vec![Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(1)]),
            ("line", vec![Value::Int(1), Value::Int(1), Value::Int(1), Value::Int(2)]),
            ("qty", vec![Value::Int(3), Value::Int(3), Value::Int(1), Value::Int(3)]),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_min_rows_only_warns() {
        let mut table = orders();
        let rule = TableRuleBuilder::new().min_rows(10).build();
        let mut report = Report::new();
        let removed = run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(removed, 0);
        assert_eq!(table.len(), 4);
        assert_eq!(
            report.messages(),
            vec!["Table has 4 row(s), fewer than min_rows=10."]
        );
    }

    #[test]
    fn test_max_rows_warns() {
        let mut table = orders();
        let rule = TableRuleBuilder::new().max_rows(2).build();
        let mut report = Report::new();
        run_structural_checks(&mut table, &rule, &mut report);
        assert!(report.contains("more than max_rows=2"));
    }

    #[test]
    fn test_duplicate_rows_removed_keeping_first() {
        let mut table = orders();
        let rule = TableRuleBuilder::new().no_duplicates(true).build();
        let mut report = Report::new();
        let removed = run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(removed, 1);
        assert_eq!(table.index(), &[0, 2, 3]);
        assert_eq!(report.messages(), vec!["Removed 1 duplicate row(s)."]);
    }

    #[test]
    fn test_rows_with_separator_text_are_not_duplicates() {
        let mut table = Table::from_columns(vec![
            ("a", vec!["x|str:y".into(), "x".into()]),
            ("b", vec!["z".into(), "y|str:z".into()]),
        ])
        .expect("valid table");
        let rule = TableRuleBuilder::new()
            .no_duplicates(true)
            .unique_keys(["a", "b"])
            .build();
        let mut report = Report::new();
        let removed = run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(removed, 0);
        assert_eq!(table.len(), 2);
        assert!(report.is_empty());
    }

    #[test]
    fn test_unique_key_violations_reported_only() {
        let mut table = orders();
        let rule = TableRuleBuilder::new()
            .unique_keys(["order_id", "line"])
            .build();
        let mut report = Report::new();
        run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(table.len(), 4);
        assert_eq!(
            report.messages(),
            vec!["Found 1 row(s) violating unique key (order_id, line)."]
        );
    }

    #[test]
    fn test_unique_key_with_missing_column() {
        let mut table = orders();
        let rule = TableRuleBuilder::new().unique_keys(["order_id", "sku"]).build();
        let mut report = Report::new();
        run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(
            report.messages(),
            vec!["Cannot check unique key (order_id, sku): missing column(s) sku."]
        );
    }

    #[test]
    fn test_expected_columns_diff() {
        let mut table = orders();
        let rule = TableRuleBuilder::new()
            .expected_columns(["order_id", "line", "price"])
            .build();
        let mut report = Report::new();
        run_structural_checks(&mut table, &rule, &mut report);
        assert_eq!(
            report.messages(),
            vec![
                "Missing expected column(s): price.",
                "Unexpected column(s): qty.",
            ]
        );
    }
}
