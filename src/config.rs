use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// File name used when no database path is given
pub const DEFAULT_DB_FILE: &str = "arkdata.sqlite3";

/// Per-user data directory, created on demand
pub fn data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "arkdata-sqlite")
        .context("Could not determine data directory")?;
    let dir = proj_dirs.data_dir().to_path_buf();

    fs::create_dir_all(&dir).context("Failed to create data directory")?;

    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DEFAULT_DB_FILE))
}

/// Explicit path (argument or `ARKDATA_DB`, already merged by clap) wins;
/// otherwise the platform data directory is used.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}
