use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile CSV files into a relational table", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize a CSV file into a database table (create or extend the schema, then upsert rows)
    Sync(SyncArgs),
    /// Show the schema changes a sync would apply, without touching the database
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Input CSV file to synchronize
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// SQLite database file (created if missing)
    #[arg(short = 'd', long = "database")]
    pub database: PathBuf,
    /// Destination table name
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// Column used to match existing rows (defaults to the first CSV column)
    #[arg(long = "key-column")]
    pub key_column: Option<String>,
    /// Number of rows to sample when inferring column types
    #[arg(long, default_value_t = 100)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Input CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Existing database file to compare against (omit to plan table creation)
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,
    /// Destination table name
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// Write the inferred source schema to this YAML file
    #[arg(short, long)]
    pub meta: Option<PathBuf>,
    /// Number of rows to sample when inferring column types
    #[arg(long, default_value_t = 100)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
