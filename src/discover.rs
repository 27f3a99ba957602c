// src/discover.rs

use glob::{glob_with, MatchOptions, Pattern};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{ImportError, Result};

/// A CSV file found in the input directory, with the table it loads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub table_name: String,
}

/// Strip the directory prefix and one trailing `.csv` from `path`.
pub fn derive_table_name(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ImportError::InvalidTableName(path.to_path_buf()))?
        .to_str()
        .ok_or_else(|| ImportError::NonUtf8Path(path.to_path_buf()))?;

    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    if stem.is_empty() {
        return Err(ImportError::InvalidTableName(path.to_path_buf()));
    }
    Ok(stem.to_string())
}

/// Enumerate `*.csv` files under `input_dir` (every depth when `recursive`)
/// in glob order, i.e. sorted by path. Hidden files are skipped.
///
/// Fails before anything is written if two files would load into the same
/// table. SQLite compares table names case-insensitively, so `teams.csv` and
/// `Teams.csv` collide as well.
#[tracing::instrument(level = "debug", skip(input_dir), fields(dir = %input_dir.display()))]
pub fn discover_sources(input_dir: &Path, recursive: bool) -> Result<Vec<SourceFile>> {
    // glob silently yields nothing for a missing directory, so probe it first
    fs::read_dir(input_dir).map_err(|source| ImportError::InputDir {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let pattern = csv_pattern(input_dir, recursive)?;
    debug!(%pattern, "globbing");

    let mut sources = Vec::new();
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();

    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let entries = glob_with(&pattern, options).map_err(|e| ImportError::Io {
        path: input_dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, e),
    })?;

    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ImportError::Io {
                path,
                source: io::Error::from(e),
            }
        })?;
        if !path.is_file() {
            continue;
        }

        let table_name = derive_table_name(&path)?;
        if let Some(first) = claimed.insert(table_name.to_ascii_lowercase(), path.clone()) {
            return Err(ImportError::TableCollision {
                table: table_name,
                first,
                second: path,
            });
        }
        sources.push(SourceFile { path, table_name });
    }

    info!("found {} CSV files in {}", sources.len(), input_dir.display());
    Ok(sources)
}

fn csv_pattern(input_dir: &Path, recursive: bool) -> Result<String> {
    let dir = input_dir
        .to_str()
        .ok_or_else(|| ImportError::NonUtf8Path(input_dir.to_path_buf()))?;
    let trimmed = dir.trim_end_matches('/');
    let base = if trimmed.is_empty() && !dir.is_empty() {
        String::new()
    } else {
        Pattern::escape(trimmed)
    };
    let tail = if recursive { "**/*.csv" } else { "*.csv" };
    Ok(format!("{}/{}", base, tail))
}
