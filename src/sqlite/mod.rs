// src/sqlite/mod.rs

use rusqlite::{params_from_iter, Connection, ErrorCode};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, trace};

use crate::error::{ImportError, Result};
use crate::load::Dataset;

/// A column as declared in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
}

/// A user table, its declared columns and how many rows it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub rows: u64,
}

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Open the database at `path`, creating the file if it doesn't exist.
/// The parent directory must already exist.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ImportError::DbDirMissing(parent.to_path_buf()));
        }
    }

    match Connection::open(path) {
        Ok(conn) => Ok(conn),
        Err(rusqlite::Error::SqliteFailure(e, msg)) if e.code == ErrorCode::CannotOpen => {
            Err(ImportError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other(msg.unwrap_or_else(|| e.to_string())),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Close `conn`, surfacing anything SQLite reports on the way out.
pub fn close_database(conn: Connection) -> Result<()> {
    conn.close().map_err(|(_, e)| ImportError::Db(e))
}

/// Drop `table` if present, recreate it from `data`'s columns and insert every
/// row. All of it happens in one transaction, so a failure leaves the previous
/// table untouched. Returns the number of rows written.
pub fn replace_table(conn: &mut Connection, table: &str, data: &Dataset) -> Result<usize> {
    let ident = quote_ident(table);
    let column_defs = data
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; data.columns.len()].join(", ");

    let create_sql = format!("CREATE TABLE {} ({})", ident, column_defs);
    let insert_sql = format!("INSERT INTO {} VALUES ({})", ident, placeholders);
    debug!("{}", create_sql);

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", ident), [])?;
    tx.execute(&create_sql, [])?;

    let mut written = 0;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for row in &data.rows {
            written += stmt.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;

    trace!("committed {} rows into {}", written, ident);
    Ok(written)
}

/// List every user table with its declared columns and row count, by name.
pub fn describe_tables(conn: &Connection) -> Result<Vec<TableInfo>> {
    let names: Vec<String> = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' ORDER BY name",
        )?
        .query_map([], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns: Vec<ColumnInfo> = conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?
            .query_map([&name], |r| {
                Ok(ColumnInfo {
                    name: r.get(0)?,
                    decl_type: r.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        let rows: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(&name)),
            [],
            |r| r.get(0),
        )?;

        tables.push(TableInfo {
            name,
            columns,
            rows: rows as u64,
        });
    }
    Ok(tables)
}
