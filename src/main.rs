use anyhow::{Context, Result};
use clap::Parser;
use lahman_loader::{config::Config, load::HeaderPolicy, Importer};
use std::{io, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Load every CSV in a directory into a SQLite database, one table per file.
#[derive(Debug, Parser)]
#[command(name = "lahman-loader", version)]
struct Args {
    /// YAML file with input_dir / db_path / recursive / header_policy
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the *.csv files
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// SQLite file to write; its directory must exist
    #[arg(long = "db")]
    db_path: Option<PathBuf>,

    /// Also pick up *.csv files in subdirectories
    #[arg(long)]
    recursive: bool,

    /// Fail on empty or repeated headers instead of renaming them
    #[arg(long)]
    strict_headers: bool,
}

impl Args {
    fn resolve(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(dir) = self.input_dir {
            cfg.input_dir = dir;
        }
        if let Some(db) = self.db_path {
            cfg.db_path = db;
        }
        if self.recursive {
            cfg.recursive = true;
        }
        if self.strict_headers {
            cfg.header_policy = HeaderPolicy::Strict;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    // logs go to stderr, stdout carries the import report
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let cfg = Args::parse().resolve()?;
    info!(
        input = %cfg.input_dir.display(),
        db = %cfg.db_path.display(),
        "startup"
    );

    let importer = Importer::new(&cfg.input_dir, &cfg.db_path).with_options(cfg.import_options());
    importer.run(&mut io::stdout().lock()).with_context(|| {
        format!(
            "importing {} into {}",
            cfg.input_dir.display(),
            cfg.db_path.display()
        )
    })?;

    Ok(())
}
