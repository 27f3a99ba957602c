use anyhow::{bail, Context, Result};
use lahman_loader::sqlite::describe_tables;
use rusqlite::{Connection, OpenFlags};
use std::{env, path::Path};

fn main() -> Result<()> {
    let db = env::args()
        .nth(1)
        .context("Usage: inspect_db <DB_PATH>")?;
    let path = Path::new(&db);

    let (yaml, count) = render_tables(path)?;
    print!("{}", yaml);
    eprintln!("→ {} tables in {}", count, path.display());
    Ok(())
}

/// Describe every table of the database at `path` as YAML, e.g.
///
/// - name: Teams
///   columns:
///   - name: yearID
///     decl_type: INTEGER
///   rows: 3015
fn render_tables(path: &Path) -> Result<(String, usize)> {
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("opening {}", path.display()))?;
    let tables = describe_tables(&conn)?;
    Ok((serde_yaml::to_string(&tables)?, tables.len()))
}
