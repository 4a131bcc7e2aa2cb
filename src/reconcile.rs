//! Additive schema reconciliation between a source field list and a table's
//! actual columns.
//!
//! [`plan()`] is pure: it compares the source headers against the catalog's
//! column set (case-insensitively — the catalog may report a different case
//! than the header) and returns the DDL operations that bring the table in
//! line. Execution stays in the synchronizer. Reconciliation only ever adds
//! columns; it never removes or renames them, so the plan for an already
//! up-to-date table is empty and re-planning after a partial failure picks up
//! exactly the columns still missing.

use std::collections::HashSet;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    infer::{self, Kind},
    store::quote_ident,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlOp {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
}

impl DdlOp {
    pub fn render(&self) -> String {
        match self {
            DdlOp::CreateTable { table, columns } => {
                let definitions = columns
                    .iter()
                    .map(|column| {
                        format!("{} {}", quote_ident(&column.name), column.kind.sql_type())
                    })
                    .join(", ");
                format!("CREATE TABLE {} ({definitions})", quote_ident(table))
            }
            DdlOp::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote_ident(table),
                quote_ident(&column.name),
                column.kind.sql_type()
            ),
        }
    }
}

/// Types every source field from its column of the row sample.
pub fn infer_columns(fields: &[String], sample: &[Vec<String>]) -> Vec<ColumnDef> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, name)| ColumnDef {
            name: name.clone(),
            kind: infer::infer_kind(column_samples(sample, idx)),
        })
        .collect()
}

fn column_samples<'a>(sample: &'a [Vec<String>], index: usize) -> impl Iterator<Item = &'a str> {
    sample
        .iter()
        .filter_map(move |row| row.get(index).map(String::as_str))
}

/// Computes the DDL operations required for `table` to hold the source
/// fields. `existing` is the catalog's column list when the table is present,
/// `None` when it must be created.
pub fn plan(
    table: &str,
    fields: &[String],
    sample: &[Vec<String>],
    existing: Option<&[String]>,
) -> Vec<DdlOp> {
    let Some(existing) = existing else {
        return vec![DdlOp::CreateTable {
            table: table.to_string(),
            columns: infer_columns(fields, sample),
        }];
    };

    let mut known: HashSet<String> = existing.iter().map(|name| name.to_lowercase()).collect();
    let mut ops = Vec::new();
    for (idx, field) in fields.iter().enumerate() {
        let lowered = field.to_lowercase();
        if known.contains(&lowered) {
            continue;
        }
        // New columns are typed from a single representative sample value.
        let representative = sample.first().and_then(|row| row.get(idx));
        let kind = infer::infer_kind(representative.map(String::as_str));
        ops.push(DdlOp::AddColumn {
            table: table.to_string(),
            column: ColumnDef {
                name: field.clone(),
                kind,
            },
        });
        known.insert(lowered);
    }
    ops
}
