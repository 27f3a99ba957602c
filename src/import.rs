// src/import.rs

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, info_span};

use crate::{
    discover::discover_sources,
    error::{ImportError, Result},
    load::{read_csv, HeaderPolicy},
    sqlite::{close_database, open_database, replace_table},
};

/// Knobs that change how files are found and read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub recursive: bool,
    pub header_policy: HeaderPolicy,
}

/// One table written during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTable {
    pub table_name: String,
    pub source: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Everything a successful run wrote, in the order it was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tables: Vec<ImportedTable>,
}

impl ImportSummary {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Loads every CSV of one directory into one SQLite file.
pub struct Importer {
    input_dir: PathBuf,
    db_path: PathBuf,
    options: ImportOptions,
}

impl Importer {
    pub fn new(input_dir: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            db_path: db_path.into(),
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the import, writing one `Imported <table>: <n> rows` line to `out`
    /// per table as soon as it is committed, then a final `Done!` line.
    ///
    /// Stops at the first failure. Tables committed before it stay in the
    /// database.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<ImportSummary> {
        let started = Instant::now();
        let sources = discover_sources(&self.input_dir, self.options.recursive)?;

        let mut conn = open_database(&self.db_path)?;
        let mut summary = ImportSummary::default();

        for source in sources {
            let span = info_span!("table", name = %source.table_name);
            let _enter = span.enter();

            let dataset = read_csv(&source.path, self.options.header_policy)?;
            let rows = replace_table(&mut conn, &source.table_name, &dataset)?;
            info!(rows, columns = dataset.columns.len(), "imported");

            writeln!(out, "Imported {}: {} rows", source.table_name, rows)
                .map_err(ImportError::Output)?;
            summary.tables.push(ImportedTable {
                table_name: source.table_name,
                source: source.path,
                rows,
                columns: dataset.columns.len(),
            });
        }

        close_database(conn)?;

        info!(
            tables = summary.tables.len(),
            rows = summary.total_rows(),
            elapsed = ?started.elapsed(),
            "import finished"
        );
        writeln!(out, "Done! {} created.", db_file_name(&self.db_path))
            .map_err(ImportError::Output)?;
        Ok(summary)
    }
}

/// Load every `*.csv` in `input_dir` into `db_path` with default options,
/// reporting progress on stdout.
pub fn import_all(input_dir: impl AsRef<Path>, db_path: impl AsRef<Path>) -> Result<ImportSummary> {
    let importer = Importer::new(input_dir.as_ref(), db_path.as_ref());
    importer.run(&mut io::stdout().lock())
}

fn db_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sqlite::describe_tables;
    use anyhow::Result;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::tempdir;

    fn write_rows(dir: &Path, name: &str, header: &str, rows: usize) {
        let mut body = format!("{}\n", header);
        for i in 0..rows {
            body.push_str(&format!("{},{}_{}\n", 1871 + i, name.to_lowercase(), i));
        }
        fs::write(dir.join(format!("{}.csv", name)), body).unwrap();
    }

    fn run(importer: &Importer) -> (std::result::Result<ImportSummary, ImportError>, String) {
        let mut out = Vec::new();
        let result = importer.run(&mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn dump(conn: &Connection, table: &str) -> Vec<Vec<String>> {
        let sql = format!("SELECT * FROM \"{}\" ORDER BY rowid", table);
        let mut stmt = conn.prepare(&sql).unwrap();
        let width = stmt.column_count();
        let rows: Vec<Vec<String>> = stmt
            .query_map([], |r| {
                (0..width)
                    .map(|i| r.get::<_, rusqlite::types::Value>(i).map(|v| format!("{:?}", v)))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        rows
    }

    #[test]
    fn teams_and_players_scenario() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        let db_dir = tmp.path().join("db");
        fs::create_dir(&csvs)?;
        fs::create_dir(&db_dir)?;
        write_rows(&csvs, "Teams", "yearID,teamID", 3);
        write_rows(&csvs, "Players", "birthYear,playerID", 10);

        let db_path = db_dir.join("database.sqlite");
        let (result, out) = run(&Importer::new(&csvs, &db_path));
        let summary = result?;

        // glob yields paths sorted, so Players comes first
        assert_eq!(
            out,
            "Imported Players: 10 rows\nImported Teams: 3 rows\nDone! database.sqlite created.\n"
        );
        assert_eq!(summary.tables.len(), 2);
        assert_eq!(summary.total_rows(), 13);

        let conn = Connection::open(&db_path)?;
        let tables = describe_tables(&conn)?;
        let counts: Vec<_> = tables.iter().map(|t| (t.name.as_str(), t.rows)).collect();
        assert_eq!(counts, vec![("Players", 10), ("Teams", 3)]);
        for t in &tables {
            assert_eq!(t.columns.len(), 2);
        }
        Ok(())
    }

    #[test]
    fn rerun_is_idempotent() -> Result<()> {
        let tmp = tempdir()?;
        write_rows(tmp.path(), "Teams", "yearID,teamID", 4);
        fs::write(tmp.path().join("Mixed.csv"), "a,b,c\n1,,x\n2,2.5,\n")?;
        let db_path = tmp.path().join("database.sqlite");
        let importer = Importer::new(tmp.path(), &db_path);

        run(&importer).0?;
        let conn = Connection::open(&db_path)?;
        let first = (
            describe_tables(&conn)?,
            dump(&conn, "Teams"),
            dump(&conn, "Mixed"),
        );
        drop(conn);

        run(&importer).0?;
        let conn = Connection::open(&db_path)?;
        let second = (
            describe_tables(&conn)?,
            dump(&conn, "Teams"),
            dump(&conn, "Mixed"),
        );

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn rerun_replaces_rather_than_appends() -> Result<()> {
        let tmp = tempdir()?;
        let db_path = tmp.path().join("database.sqlite");
        let csvs = tmp.path().join("csvs");
        fs::create_dir(&csvs)?;

        write_rows(&csvs, "Teams", "yearID,teamID", 5);
        run(&Importer::new(&csvs, &db_path)).0?;
        write_rows(&csvs, "Teams", "yearID,teamID", 2);
        run(&Importer::new(&csvs, &db_path)).0?;

        let conn = Connection::open(&db_path)?;
        assert_eq!(describe_tables(&conn)?[0].rows, 2);
        Ok(())
    }

    #[test]
    fn header_only_file_makes_empty_table() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        fs::create_dir(&csvs)?;
        fs::write(csvs.join("People.csv"), "playerID,nameFirst,nameLast\n")?;
        let db_path = tmp.path().join("database.sqlite");

        let (result, out) = run(&Importer::new(&csvs, &db_path));
        result?;
        assert!(out.starts_with("Imported People: 0 rows\n"));

        let conn = Connection::open(&db_path)?;
        let tables = describe_tables(&conn)?;
        assert_eq!(tables[0].rows, 0);
        assert_eq!(tables[0].columns.len(), 3);
        Ok(())
    }

    #[test]
    fn empty_directory_prints_only_done() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        fs::create_dir(&csvs)?;
        let db_path = tmp.path().join("database.sqlite");

        let (result, out) = run(&Importer::new(&csvs, &db_path));
        assert!(result?.tables.is_empty());
        assert_eq!(out, "Done! database.sqlite created.\n");

        assert!(db_path.exists());
        let conn = Connection::open(&db_path)?;
        assert!(describe_tables(&conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn failure_keeps_earlier_tables() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        fs::create_dir(&csvs)?;
        write_rows(&csvs, "AllStar", "yearID,playerID", 2);
        fs::write(csvs.join("Broken.csv"), "a,b\n1,2,3\n")?;
        write_rows(&csvs, "Zeta", "yearID,playerID", 2);
        let db_path = tmp.path().join("database.sqlite");

        let (result, out) = run(&Importer::new(&csvs, &db_path));
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(out, "Imported AllStar: 2 rows\n");

        let conn = Connection::open(&db_path)?;
        let names: Vec<_> = describe_tables(&conn)?.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["AllStar"]);
        Ok(())
    }

    #[test]
    fn strict_headers_abort_the_run() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        fs::create_dir(&csvs)?;
        fs::write(csvs.join("Dupes.csv"), "id,id\n1,2\n")?;
        let db_path = tmp.path().join("database.sqlite");

        let strict = Importer::new(&csvs, &db_path).with_options(ImportOptions {
            header_policy: HeaderPolicy::Strict,
            ..ImportOptions::default()
        });
        assert_eq!(run(&strict).0.unwrap_err().kind(), ErrorKind::Schema);

        let (result, _) = run(&Importer::new(&csvs, &db_path));
        result?;
        let conn = Connection::open(&db_path)?;
        let cols: Vec<_> = describe_tables(&conn)?[0]
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(cols, vec!["id", "id.1"]);
        Ok(())
    }

    #[test]
    fn collisions_are_caught_before_the_database_is_touched() -> Result<()> {
        let tmp = tempdir()?;
        let csvs = tmp.path().join("csvs");
        fs::create_dir_all(csvs.join("archive"))?;
        write_rows(&csvs, "Teams", "yearID,teamID", 1);
        write_rows(&csvs.join("archive"), "Teams", "yearID,teamID", 1);
        let db_path = tmp.path().join("database.sqlite");

        let importer = Importer::new(&csvs, &db_path).with_options(ImportOptions {
            recursive: true,
            ..ImportOptions::default()
        });
        let err = run(&importer).0.unwrap_err();
        assert!(matches!(err, ImportError::TableCollision { .. }));
        assert!(!db_path.exists());
        Ok(())
    }

    #[test]
    fn missing_db_directory_is_an_io_error() {
        let tmp = tempdir().unwrap();
        let err = run(&Importer::new(tmp.path(), tmp.path().join("db/database.sqlite")))
            .0
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn column_types_land_in_the_schema() -> Result<()> {
        let tmp = tempdir()?;
        fs::write(
            tmp.path().join("Batting.csv"),
            "playerID,yearID,AVG,HOF,note\naaronha01,1954,0.280,True,\naaronto01,1962,0.231,False,x\n",
        )?;
        let db_path = tmp.path().join("database.sqlite");
        run(&Importer::new(tmp.path(), &db_path)).0?;

        let conn = Connection::open(&db_path)?;
        let types: Vec<_> = describe_tables(&conn)?[0]
            .columns
            .iter()
            .map(|c| c.decl_type.clone())
            .collect();
        assert_eq!(types, vec!["TEXT", "INTEGER", "REAL", "INTEGER", "TEXT"]);

        let hof: i64 = conn.query_row(
            "SELECT HOF FROM Batting WHERE playerID = 'aaronha01'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(hof, 1);
        let note: Option<String> = conn.query_row(
            "SELECT note FROM Batting WHERE playerID = 'aaronha01'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(note, None);
        Ok(())
    }
}
