// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// strata-lifecycle - Database schema lifecycle CLI
///
/// Cleans or drops database schemas, one transaction per schema.
#[derive(Parser, Debug)]
#[command(name = "strata-lifecycle")]
#[command(author = "Strata Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clean or drop database schemas with per-schema transactions")]
#[command(long_about = "strata-lifecycle - Database schema lifecycle CLI

Removes every object from the configured schemas (clean) or removes the
schemas themselves (drop). Schemas are processed in the configured order,
each inside its own transaction. Processing stops at the first failure.

This operation is destructive and has no dry-run mode.

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
  strata-lifecycle clean --env development
  strata-lifecycle clean --env test --schema app --schema app_audit
  strata-lifecycle clean --env test --drop-schemas --format json")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean (or drop) the configured schemas
    ///
    /// Schemas are taken from --schema flags, then from the `clean.schemas`
    /// section of the config file, and finally default to the session's
    /// current schema.
    ///
    /// EXAMPLES:
    ///   # Clean the schemas listed in the config file
    ///   strata-lifecycle clean --env development
    ///
    ///   # Drop two schemas in order
    ///   strata-lifecycle clean --env test --schema app --schema app_audit --drop-schemas
    Clean {
        /// Target environment
        #[arg(short, long, value_name = "ENV", default_value = "development")]
        env: String,

        /// Schema to process (repeatable, processed in the given order)
        #[arg(short, long = "schema", value_name = "NAME")]
        schemas: Vec<String>,

        /// Drop the schemas themselves instead of cleaning them
        #[arg(long)]
        drop_schemas: bool,
    },
}
