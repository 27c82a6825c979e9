mod commands;
mod io;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cleanframe")]
#[command(version, about = "Rule-driven tabular data cleaning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a data file against a schema
    Clean {
        /// Path to the data file (CSV or JSON)
        data: String,

        /// Path to the schema file (YAML or TOML)
        #[arg(short, long)]
        schema: String,

        /// Where to write the cleaned table (defaults to CSV on stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Report format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Exit with status 1 when the report contains errors
        #[arg(long)]
        strict: bool,
    },

    /// Check a schema file without cleaning any data
    Check {
        /// Path to the schema file (YAML or TOML)
        schema: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Report messages are rendered by the commands; the mirrored log lines
    // only show up with --verbose or RUST_LOG.
    let default_filter = if cli.verbose {
        "debug"
    } else {
        "info,cleanframe::report=off"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Clean {
            data,
            schema,
            output,
            format,
            strict,
        } => commands::clean::execute(&data, &schema, output.as_deref(), &format, strict),

        Commands::Check { schema, format } => commands::check::execute(&schema, &format),
    }
}
