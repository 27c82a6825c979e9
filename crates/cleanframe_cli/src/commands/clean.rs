use anyhow::{Context, Result};
use cleanframe_engine::Cleaner;
use cleanframe_parser::parse_file;
use std::path::Path;
use tracing::info;

use crate::{io, output};

pub fn execute(
    data_path: &str,
    schema_path: &str,
    output_path: Option<&str>,
    format: &str,
    strict: bool,
) -> Result<()> {
    info!("Cleaning {} with schema {}", data_path, schema_path);

    let schema = parse_file(Path::new(schema_path))
        .with_context(|| format!("Failed to parse schema file: {}", schema_path))?;
    let table = io::read_table(Path::new(data_path))
        .with_context(|| format!("Failed to load data file: {}", data_path))?;

    info!("Loaded {} row(s) and {} column(s)", table.len(), table.width());

    let outcome = Cleaner::new(schema).clean(&table);

    // With no output file the cleaned CSV owns stdout and the report moves to stderr.
    io::write_table(&outcome.table, output_path.map(Path::new))?;
    if let (Some(path), "text") = (output_path, format) {
        output::print_info(&format!(
            "Wrote {} row(s) to {}",
            outcome.table.len(),
            path
        ));
    }

    let rendered = output::render_clean_report(&outcome, format)?;
    output::print_report(&rendered, output_path.is_none());

    if strict && outcome.report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
