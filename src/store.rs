//! Destination-table access.
//!
//! The synchronizer consumes the destination through [`Store`], which exposes
//! exactly the four operations the core needs: an existence probe, a catalog
//! column listing, statement execution, and a single-row lookup.
//! [`SqliteStore`] is the shipped backend; tests drive the same trait against
//! an in-memory database.
//!
//! Row values cross this boundary as canonical text (`Option<String>`):
//! NULL maps to `None`, INTEGER and REAL to their decimal rendering, TEXT
//! as-is. The differ never sees driver-native types.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, types::ValueRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database at {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("statement `{sql}` failed")]
    Statement {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait Store {
    /// Whether `table` exists in the destination.
    fn table_exists(&self, table: &str) -> StoreResult<bool>;
    /// Column names the catalog reports for `table`, in catalog order.
    fn list_columns(&self, table: &str) -> StoreResult<Vec<String>>;
    /// Executes one DDL or DML statement with positional string parameters.
    fn execute(&self, sql: &str, params: &[&str]) -> StoreResult<()>;
    /// Runs a SELECT expected to match at most one row; returns its cells as
    /// canonical text, or `None` when no row matches.
    fn query_one(&self, sql: &str, params: &[&str]) -> StoreResult<Option<Vec<Option<String>>>>;
}

/// Double-quote escapes an identifier for interpolation into SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if missing) a database file.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { conn })
    }

    /// Opens an existing database file without write access. Fails if the
    /// file is absent rather than creating it.
    pub fn open_read_only(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            },
        )?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn })
    }
}

fn statement_error(sql: &str, source: rusqlite::Error) -> StoreError {
    StoreError::Statement {
        sql: sql.to_string(),
        source,
    }
}

impl Store for SqliteStore {
    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        // Probe with a trivial read; any store-reported failure classifies
        // the table as absent rather than erroring.
        let sql = format!("SELECT 1 FROM {} LIMIT 1", quote_ident(table));
        Ok(self.conn.prepare(&sql).is_ok())
    }

    fn list_columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let sql = "SELECT name FROM pragma_table_info(?1)";
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|err| statement_error(sql, err))?;
        let rows = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(|err| statement_error(sql, err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| statement_error(sql, err))
    }

    fn execute(&self, sql: &str, params: &[&str]) -> StoreResult<()> {
        self.conn
            .execute(sql, rusqlite::params_from_iter(params.iter()))
            .map(|_| ())
            .map_err(|err| statement_error(sql, err))
    }

    fn query_one(&self, sql: &str, params: &[&str]) -> StoreResult<Option<Vec<Option<String>>>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|err| statement_error(sql, err))?;
        let column_count = stmt.column_count();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(|err| statement_error(sql, err))?;
        let Some(row) = rows.next().map_err(|err| statement_error(sql, err))? else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row.get_ref(idx).map_err(|err| statement_error(sql, err))?;
            values.push(canonical_text(value));
        }
        Ok(Some(values))
    }
}

fn canonical_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(int) => Some(int.to_string()),
        ValueRef::Real(real) => Some(real.to_string()),
        ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Some(String::from_utf8_lossy(blob).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn probe_classifies_missing_table_as_absent() {
        let store = SqliteStore::open_in_memory().expect("open in-memory");
        assert!(!store.table_exists("nope").expect("probe"));
        store
            .execute("CREATE TABLE t (\"id\" NUMERIC)", &[])
            .expect("create");
        assert!(store.table_exists("t").expect("probe"));
    }

    #[test]
    fn list_columns_reports_catalog_names() {
        let store = SqliteStore::open_in_memory().expect("open in-memory");
        store
            .execute("CREATE TABLE t (\"ID\" NUMERIC, \"Name\" VARCHAR(255))", &[])
            .expect("create");
        assert_eq!(store.list_columns("t").expect("columns"), vec!["ID", "Name"]);
    }

    #[test]
    fn query_one_returns_canonical_text() {
        let store = SqliteStore::open_in_memory().expect("open in-memory");
        store
            .execute(
                "CREATE TABLE t (\"id\" NUMERIC, \"price\" NUMERIC, \"note\" VARCHAR(255))",
                &[],
            )
            .expect("create");
        store
            .execute("INSERT INTO t VALUES (?1, ?2, ?3)", &["1", "9.90", "hi"])
            .expect("insert");
        let row = store
            .query_one("SELECT \"id\", \"price\", \"note\" FROM t WHERE \"id\" = ?1", &["1"])
            .expect("query")
            .expect("row present");
        assert_eq!(row[0].as_deref(), Some("1"));
        // Numeric affinity stores 9.90 as the real 9.9.
        assert_eq!(row[1].as_deref(), Some("9.9"));
        assert_eq!(row[2].as_deref(), Some("hi"));

        let missing = store
            .query_one("SELECT \"id\" FROM t WHERE \"id\" = ?1", &["2"])
            .expect("query");
        assert!(missing.is_none());
    }
}
