use log::{debug, error, info};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::time::{Duration, Instant};

use super::{StoreError, StoreResult, SCHEMA_VERSION};
use crate::schema::ALL_TABLES;
use crate::writer::apply_schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a database file and makes sure the schema is present
pub fn open_db(path: impl AsRef<Path>) -> StoreResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file path={}", path.display());

    let result = Connection::open(path)
        .map_err(StoreError::from)
        .and_then(|mut conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });

    log_outcome("file", started_at, &result);
    result
}

/// Opens a private in-memory database with the schema applied
pub fn open_db_in_memory() -> StoreResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(StoreError::from)
        .and_then(|mut conn| {
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });

    log_outcome("memory", started_at, &result);
    result
}

/// Current `PRAGMA user_version` of the connection
pub fn schema_version(conn: &Connection) -> StoreResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }
    if current == SCHEMA_VERSION {
        debug!("event=schema_check module=db status=ok version={}", current);
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    apply_schema(&tx, ALL_TABLES, true)?;
    tx.commit()?;
    info!(
        "event=schema_apply module=db status=ok tables={} version={}",
        ALL_TABLES.len(),
        SCHEMA_VERSION
    );

    Ok(())
}

fn log_outcome(mode: &str, started_at: Instant, result: &StoreResult<Connection>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode, duration_ms
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={}",
            mode, duration_ms, err
        ),
    }
}
