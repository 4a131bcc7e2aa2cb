pub mod cli;
pub mod diff;
pub mod infer;
pub mod io_utils;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod sync;

use std::{env, fs::File, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, PlanArgs},
    reconcile::ColumnDef,
    source::CsvSource,
    store::{SqliteStore, Store},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sync", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => sync::execute(&args),
        Commands::Plan(args) => handle_plan(&args),
    }
}

#[derive(Serialize)]
struct SchemaMeta {
    columns: Vec<ColumnDef>,
}

fn handle_plan(args: &PlanArgs) -> Result<()> {
    let source = CsvSource::open(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let fields = source.headers()?;
    let sample = source.sample(args.sample_rows)?;

    // A dry run must not create the database file; an absent file means an
    // absent table.
    let existing = match &args.database {
        Some(path) if path.exists() => {
            let store = SqliteStore::open_read_only(path)?;
            if store.table_exists(&args.table)? {
                Some(store.list_columns(&args.table)?)
            } else {
                None
            }
        }
        _ => None,
    };

    let ops = reconcile::plan(&args.table, &fields, &sample, existing.as_deref());
    if ops.is_empty() {
        info!("Table '{}' already holds every source column", args.table);
    }
    for op in &ops {
        println!("{};", op.render());
    }

    if let Some(path) = &args.meta {
        let meta = SchemaMeta {
            columns: reconcile::infer_columns(&fields, &sample),
        };
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, &meta).context("Writing schema YAML")?;
        info!(
            "Inferred schema for {} column(s) written to {:?}",
            fields.len(),
            path
        );
    }
    Ok(())
}
