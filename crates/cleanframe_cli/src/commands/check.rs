use anyhow::{Context, Result};
use cleanframe_parser::parse_file;
use std::path::Path;
use tracing::info;

use crate::output;

pub fn execute(schema_path: &str, format: &str) -> Result<()> {
    info!("Checking schema: {}", schema_path);

    let schema = parse_file(Path::new(schema_path))
        .with_context(|| format!("Failed to parse schema file: {}", schema_path))?;

    if format != "json" {
        output::print_success("Schema is valid");
    }
    println!("{}", output::render_schema_summary(&schema, format)?);

    Ok(())
}
