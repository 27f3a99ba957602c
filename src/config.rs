// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path, path::PathBuf};

use crate::import::ImportOptions;
use crate::load::HeaderPolicy;

pub const DEFAULT_INPUT_DIR: &str = "csvs";
pub const DEFAULT_DB_PATH: &str = "db/database.sqlite";

/// Run configuration. Every field is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input_dir: PathBuf,
    pub db_path: PathBuf,
    pub recursive: bool,
    pub header_policy: HeaderPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            recursive: false,
            header_policy: HeaderPolicy::default(),
        }
    }
}

impl Config {
    /// Read a YAML config file; keys it leaves out keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening config file {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            recursive: self.recursive,
            header_policy: self.header_policy,
        }
    }
}
