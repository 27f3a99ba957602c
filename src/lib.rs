pub mod config;
pub mod discover;
pub mod error;
pub mod import;
pub mod load;
pub mod sqlite;

pub use error::{ErrorKind, ImportError};
pub use import::{import_all, ImportOptions, ImportSummary, Importer};
