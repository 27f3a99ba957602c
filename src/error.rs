// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure classes reported by an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Schema,
    Database,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database directory {0} does not exist")]
    DbDirMissing(PathBuf),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{0}: no columns to parse from file")]
    NoColumns(PathBuf),

    #[error("{path}: expected {expected} fields in line {line}, saw {found}")]
    RaggedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{path}: header at index {index} is empty")]
    EmptyHeader { path: PathBuf, index: usize },

    #[error("{path}: duplicate column name `{name}`")]
    DuplicateHeader { path: PathBuf, name: String },

    #[error("cannot derive a table name from {0}")]
    InvalidTableName(PathBuf),

    #[error("table `{table}` would be loaded from both {first} and {second}")]
    TableCollision {
        table: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("writing progress output: {0}")]
    Output(#[source] std::io::Error),
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputDir { .. }
            | Self::DbDirMissing(_)
            | Self::NonUtf8Path(_)
            | Self::Io { .. }
            | Self::Output(_) => ErrorKind::Io,
            Self::Csv { source, .. } if source.is_io_error() => ErrorKind::Io,
            Self::Csv { .. } | Self::NoColumns(_) | Self::RaggedRow { .. } => ErrorKind::Parse,
            Self::EmptyHeader { .. }
            | Self::DuplicateHeader { .. }
            | Self::InvalidTableName(_)
            | Self::TableCollision { .. } => ErrorKind::Schema,
            Self::Db(_) => ErrorKind::Database,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
