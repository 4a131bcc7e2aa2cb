//! Synchronization: ensure the destination schema, then upsert every source
//! row.
//!
//! Orchestrates the pure components (inference, reconciliation, diffing)
//! against the source and store collaborators. Schema changes are applied
//! once, before any row-level DML. Each row is its own atomic unit — lookup,
//! optional diff, at most one DML statement — with no transaction spanning
//! rows. A crash mid-run leaves applied rows in place; rerunning recomputes
//! the missing-column diff from the catalog and finds already-applied rows
//! unchanged, so the whole operation is at-least-once and idempotent.
//!
//! Concurrent runs against the same table are not safe: the lookup-then-
//! insert sequence can race another writer into duplicate identifier rows.
//! Serialize runs externally.

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::{debug, info};

use crate::{
    cli::SyncArgs,
    diff::{self, ChangeSet},
    reconcile::{self, DdlOp},
    source::{CsvSource, Record},
    store::{SqliteStore, Store, quote_ident},
};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Destination table name.
    pub table: String,
    /// Column used to match existing rows; defaults to the first CSV field.
    pub key_column: Option<String>,
    /// Number of rows sampled for type inference.
    pub sample_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created_table: bool,
    pub added_columns: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn rows(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

pub fn execute(args: &SyncArgs) -> Result<()> {
    let source = CsvSource::open(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let store = SqliteStore::open(&args.database)?;
    let options = SyncOptions {
        table: args.table.clone(),
        key_column: args.key_column.clone(),
        sample_rows: args.sample_rows,
    };
    info!(
        "Synchronizing '{}' into table '{}' of {:?}",
        args.input.display(),
        options.table,
        args.database
    );
    let report = synchronize(&source, &store, &options)
        .with_context(|| format!("Synchronizing {:?}", args.input))?;
    info!(
        "{} row(s): {} inserted, {} updated, {} unchanged",
        report.rows(),
        report.inserted,
        report.updated,
        report.unchanged
    );
    Ok(())
}

/// Runs one full synchronization of `source` into `options.table`.
pub fn synchronize(
    source: &CsvSource,
    store: &dyn Store,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let fields = source.headers()?;
    let key_index = match &options.key_column {
        Some(name) => fields
            .iter()
            .position(|field| field.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("Key column '{name}' not present in the CSV header"))?,
        None => 0,
    };
    let key_column = fields[key_index].clone();
    let sample = source.sample(options.sample_rows)?;

    let mut report = SyncReport::default();
    let existing = if store.table_exists(&options.table)? {
        Some(store.list_columns(&options.table)?)
    } else {
        None
    };
    for op in reconcile::plan(&options.table, &fields, &sample, existing.as_deref()) {
        match &op {
            DdlOp::CreateTable { columns, .. } => {
                info!(
                    "Creating table '{}' with {} column(s)",
                    options.table,
                    columns.len()
                );
                report.created_table = true;
            }
            DdlOp::AddColumn { column, .. } => {
                info!("Adding column '{}' ({})", column.name, column.kind);
                report.added_columns += 1;
            }
        }
        store
            .execute(&op.render(), &[])
            .context("Applying schema change")?;
    }

    // Columns are selected in source field order so the stored row lines up
    // positionally with the field list the differ walks.
    let select_sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        fields.iter().map(|field| quote_ident(field)).join(", "),
        quote_ident(&options.table),
        quote_ident(&key_column),
    );

    for record in source.records()? {
        let record = record?;
        let id = record
            .get(&key_column)
            .ok_or_else(|| anyhow!("Row is missing key column '{key_column}'"))?
            .to_string();
        match store.query_one(&select_sql, &[&id])? {
            Some(stored) => {
                let changes = diff::diff_record(&fields, key_index, &stored, &record);
                if changes.is_empty() {
                    report.unchanged += 1;
                } else {
                    apply_update(store, &options.table, &key_column, &id, &changes)?;
                    debug!("Updated '{id}' ({} field(s))", changes.len());
                    report.updated += 1;
                }
            }
            None => {
                apply_insert(store, &options.table, &id, &record)?;
                debug!("Inserted '{id}'");
                report.inserted += 1;
            }
        }
    }
    Ok(report)
}

fn apply_update(
    store: &dyn Store,
    table: &str,
    key_column: &str,
    id: &str,
    changes: &ChangeSet,
) -> Result<()> {
    let assignments = changes
        .changes()
        .iter()
        .enumerate()
        .map(|(idx, change)| format!("{} = ?{}", quote_ident(&change.column), idx + 1))
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE {} = ?{}",
        quote_ident(table),
        quote_ident(key_column),
        changes.len() + 1
    );
    let mut params: Vec<&str> = changes
        .changes()
        .iter()
        .map(|change| change.value.as_str())
        .collect();
    params.push(id);
    store
        .execute(&sql, &params)
        .with_context(|| format!("Updating row '{id}'"))
}

fn apply_insert(store: &dyn Store, table: &str, id: &str, record: &Record) -> Result<()> {
    let columns = record.iter().map(|(name, _)| quote_ident(name)).join(", ");
    let placeholders = (1..=record.len()).map(|idx| format!("?{idx}")).join(", ");
    let sql = format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_ident(table)
    );
    let params: Vec<&str> = record.iter().map(|(_, value)| value).collect();
    store
        .execute(&sql, &params)
        .with_context(|| format!("Inserting row '{id}'"))
}
