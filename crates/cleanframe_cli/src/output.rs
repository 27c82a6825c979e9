use anyhow::Result;
use cleanframe_core::{ColumnRule, Level, Report, Schema};
use cleanframe_engine::CleanOutcome;
use colored::*;
use serde_json::json;

pub fn render_clean_report(outcome: &CleanOutcome, format: &str) -> Result<String> {
    match format {
        "json" => render_json_report(outcome),
        _ => Ok(render_text_report(outcome)),
    }
}

fn render_text_report(outcome: &CleanOutcome) -> String {
    let report = &outcome.report;
    let stats = &outcome.stats;
    let mut lines = Vec::new();

    lines.push(format!("\n{}", "═".repeat(60)));
    lines.push(format!("{}", "  CLEANING REPORT".bold()));
    lines.push("═".repeat(60));

    if report.has_errors() {
        lines.push(format!(
            "\n{} {}",
            "✗".red().bold(),
            "Completed with errors".red().bold()
        ));
    } else {
        lines.push(format!("\n{} {}", "✓".green().bold(), "Completed".green().bold()));
    }

    if !report.is_empty() {
        lines.push(format!("\n{}", "Messages:".bold()));
        for (i, entry) in report.entries().iter().enumerate() {
            let message = match entry.level {
                Level::Info => entry.message.normal(),
                Level::Warning => entry.message.yellow(),
                Level::Error => entry.message.red(),
            };
            lines.push(format!("  {:>3}. [{}] {}", i + 1, entry.level, message));
        }
    }

    lines.push(format!("\n{}", "Summary:".bold()));
    lines.push(format!("  Rows in:                  {}", stats.rows_in));
    lines.push(format!("  Rows out:                 {}", stats.rows_out));
    lines.push(format!("  Duplicate rows removed:   {}", stats.duplicates_removed));
    lines.push(format!(
        "  Cross-validation removed: {}",
        stats.cross_validation_removed
    ));
    lines.push(format!("  Validation removed:       {}", stats.validation_removed));
    lines.push(format!("  Warnings:                 {}", report.warnings().count()));
    lines.push(format!("  Errors:                   {}", report.errors().count()));
    lines.push("═".repeat(60));

    lines.join("\n")
}

fn render_json_report(outcome: &CleanOutcome) -> Result<String> {
    let output = json!({
        "passed": !outcome.report.has_errors(),
        "messages": outcome.report.entries(),
        "stats": outcome.stats,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn render_schema_summary(schema: &Schema, format: &str) -> Result<String> {
    if format == "json" {
        let output = json!({ "valid": true, "schema": schema });
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let mut lines = vec![format!("\nSchema Summary:"), format!("  Columns: {}", schema.columns.len())];
    for (name, rule) in &schema.columns {
        lines.push(format!("    - {}: {}", name, describe_column(rule)));
    }

    if let Some(table) = &schema.table {
        lines.push("\nTable Rule:".to_string());
        if let Some(min) = table.min_rows {
            lines.push(format!("  Min rows:       {}", min));
        }
        if let Some(max) = table.max_rows {
            lines.push(format!("  Max rows:       {}", max));
        }
        if table.no_duplicates {
            lines.push("  No duplicates:  yes".to_string());
        }
        if let Some(keys) = &table.unique_keys {
            lines.push(format!("  Unique keys:    {}", keys.join(", ")));
        }
        if let Some(expected) = &table.expected_columns {
            lines.push(format!("  Expected:       {}", expected.join(", ")));
        }
        for check in &table.cross_validations {
            lines.push(format!(
                "  Cross check:    {} '{}' ({:?})",
                check.kind(),
                check.describe(),
                check.action()
            ));
        }
    }

    Ok(lines.join("\n"))
}

fn describe_column(rule: &ColumnRule) -> String {
    let mut parts = Vec::new();
    if let Some(dtype) = rule.dtype {
        parts.push(format!("dtype={}", dtype));
    }
    if !rule.allow_null {
        parts.push("not null".to_string());
    }
    if let Some(min) = &rule.min {
        parts.push(format!("min={}", min));
    }
    if let Some(max) = &rule.max {
        parts.push(format!("max={}", max));
    }
    if let Some(allowed) = &rule.allowed_values {
        parts.push(format!("{} allowed value(s)", allowed.len()));
    }
    if let Some(pattern) = &rule.pattern {
        parts.push(format!("pattern={}", pattern));
    }
    if rule.unique {
        parts.push("unique".to_string());
    }
    if rule.drop_if_invalid {
        parts.push("drop invalid".to_string());
    }

    if parts.is_empty() {
        "no checks".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn print_report(rendered: &str, to_stderr: bool) {
    if to_stderr {
        eprintln!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
