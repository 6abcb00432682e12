use anyhow::{bail, Context, Result};
use log::info;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::schema_gen::{generate_create_table, generate_indexes, generate_update_trigger};
use crate::db::SCHEMA_VERSION;
use crate::schema::{TableSchema, TAG_DICT, TAG_DICT_SEED};

/// Creates one table with its indexes and `updated_at` trigger
pub fn create_table(conn: &Connection, schema: &TableSchema) -> rusqlite::Result<()> {
    conn.execute_batch(&generate_create_table(schema))?;
    for index_sql in generate_indexes(schema) {
        conn.execute_batch(&index_sql)?;
    }
    conn.execute_batch(&generate_update_trigger(schema))?;
    Ok(())
}

/// Inserts the fixed tag vocabulary, skipping names already present.
/// Returns the number of rows actually inserted.
pub fn seed_tag_dict(conn: &Connection) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {} (tag_name) VALUES (?1)",
        TAG_DICT.name
    ))?;

    let mut inserted = 0;
    for tag in TAG_DICT_SEED {
        inserted += stmt.execute(params![tag])?;
    }
    Ok(inserted)
}

/// Creates `tables` (dependency-ordered) on an empty database, optionally
/// seeds the tag dictionary, then stamps the schema version.
/// Callers wrap this in a transaction.
pub fn apply_schema(conn: &Connection, tables: &[&TableSchema], seed: bool) -> rusqlite::Result<()> {
    for schema in tables {
        create_table(conn, schema)?;
    }
    if seed && tables.iter().any(|t| t.name == TAG_DICT.name) {
        seed_tag_dict(conn)?;
    }
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Writes a fresh database file
pub struct SchemaWriter {
    conn: Connection,
}

impl SchemaWriter {
    pub fn new(db_path: &Path, force: bool) -> Result<Self> {
        if db_path.exists() {
            if !force {
                bail!(
                    "Database {:?} already exists (use --force to replace it)",
                    db_path
                );
            }
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }
        // A replaced WAL database may leave its sidecar files behind
        for sidecar in sidecar_paths(db_path) {
            if sidecar.exists() {
                if !force {
                    bail!(
                        "Stale journal {:?} found next to the database (use --force to replace it)",
                        sidecar
                    );
                }
                std::fs::remove_file(&sidecar)
                    .with_context(|| format!("Failed to remove {:?}", sidecar))?;
            }
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self { conn })
    }

    /// Create all tables for the given schemas inside one transaction
    pub fn create_tables(&mut self, schemas: &[&TableSchema], seed: bool) -> Result<()> {
        info!("event=create_tables module=writer status=start tables={}", schemas.len());

        let tx = self.conn.transaction()?;
        for schema in schemas {
            create_table(&tx, schema)
                .with_context(|| format!("Failed to create table: {}", schema.name))?;
        }
        if seed && schemas.iter().any(|t| t.name == TAG_DICT.name) {
            let inserted = seed_tag_dict(&tx).context("Failed to seed tag_dict")?;
            info!("event=seed module=writer status=ok table=tag_dict rows={}", inserted);
        }
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;

        Ok(())
    }

    /// Row count of a table, for the summary line
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count as u64)
    }

    /// Finalize the database
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// `-wal` and `-shm` files SQLite keeps next to a WAL-mode database
fn sidecar_paths(db_path: &Path) -> [PathBuf; 2] {
    ["-wal", "-shm"].map(|suffix| {
        let mut name = db_path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    })
}

/// Outcome of `initialize_database`
#[derive(Debug, Clone)]
pub struct InitSummary {
    pub path: PathBuf,
    pub tables: usize,
    pub seeded_tags: u64,
    pub elapsed_secs: f64,
}

/// Create a new database file holding the full schema
pub fn initialize_database(
    output_db: &Path,
    tables: &[&TableSchema],
    seed: bool,
    force: bool,
) -> Result<InitSummary> {
    let start = Instant::now();
    let mut writer = SchemaWriter::new(output_db, force)?;

    writer.create_tables(tables, seed)?;

    let seeded_tags = if tables.iter().any(|t| t.name == TAG_DICT.name) {
        writer.count_rows(TAG_DICT.name)?
    } else {
        0
    };

    writer.finalize()?;

    Ok(InitSummary {
        path: output_db.to_path_buf(),
        tables: tables.len(),
        seeded_tags,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ALL_TABLES, TERMS};

    #[test]
    fn test_seed_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_table(&conn, &TAG_DICT).unwrap();

        assert_eq!(seed_tag_dict(&conn).unwrap(), TAG_DICT_SEED.len());
        assert_eq!(seed_tag_dict(&conn).unwrap(), 0);
    }

    #[test]
    fn test_initialize_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ark.sqlite3");

        let summary = initialize_database(&path, ALL_TABLES, true, false).unwrap();
        assert_eq!(summary.tables, ALL_TABLES.len());
        assert_eq!(summary.seeded_tags, 17);

        assert!(initialize_database(&path, ALL_TABLES, true, false).is_err());
        assert!(initialize_database(&path, ALL_TABLES, false, true).is_ok());
    }

    #[test]
    fn test_force_removes_stale_wal_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ark.sqlite3");
        initialize_database(&path, ALL_TABLES, true, false).unwrap();

        let [wal, shm] = sidecar_paths(&path);
        assert!(wal.ends_with("ark.sqlite3-wal"));
        std::fs::write(&wal, b"stale").unwrap();
        std::fs::write(&shm, b"stale").unwrap();

        initialize_database(&path, ALL_TABLES, true, true).unwrap();
        assert!(!wal.exists());
        assert!(!shm.exists());
    }

    #[test]
    fn test_seed_skipped_when_tag_dict_not_selected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms-only.sqlite3");

        let summary = initialize_database(&path, &[&TERMS], true, false).unwrap();
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.seeded_tags, 0);
    }
}
