// src/load/mod.rs

pub mod headers;
pub mod infer;

use csv::ReaderBuilder;
use rusqlite::types::Value;
use std::{fs::File, io::BufReader, path::Path};
use tracing::{debug, trace};

use crate::error::{ImportError, Result};
pub use headers::{normalize_headers, HeaderPolicy};
pub use infer::{convert_cell, infer_column_type, infer_types, is_missing, ColumnType};

/// One column of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// A whole CSV file, typed and held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<Column>,
    /// Row-major, each row exactly `columns.len()` wide.
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Read `path` as a comma-separated file whose first row is the header.
///
/// Blank lines are skipped, short rows are padded with NULLs, and a row wider
/// than the header fails the whole file.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_csv(path: &Path, policy: HeaderPolicy) -> Result<Dataset> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv_from(BufReader::new(file), path, policy)
}

/// Same as [`read_csv`] over any reader; `path` is only used in errors.
pub fn read_csv_from<R: std::io::Read>(reader: R, path: &Path, policy: HeaderPolicy) -> Result<Dataset> {
    let csv_err = |source: csv::Error| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    if raw_headers.is_empty() || (raw_headers.len() == 1 && raw_headers[0].is_empty()) {
        return Err(ImportError::NoColumns(path.to_path_buf()));
    }
    let names = normalize_headers(path, &raw_headers, policy)?;
    let width = names.len();

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;

        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() > width {
            return Err(ImportError::RaggedRow {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            });
        }

        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|c| if is_missing(c) { None } else { Some(c.to_string()) })
            .collect();
        row.resize(width, None);
        cells.push(row);
    }
    trace!("read {} rows × {} columns", cells.len(), width);

    let table_hint = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let types = infer_types(&table_hint, &names, &cells);

    let rows: Vec<Vec<Value>> = cells
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(&types)
                .map(|(cell, ty)| convert_cell(cell.as_deref(), *ty))
                .collect()
        })
        .collect();

    let columns: Vec<Column> = names
        .into_iter()
        .zip(types)
        .map(|(name, ty)| Column { name, ty })
        .collect();
    debug!("columns: {:?}", columns);

    Ok(Dataset { columns, rows })
}
