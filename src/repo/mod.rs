//! Data access per aggregate.
//!
//! # Invariants
//! - Multi-row writes run in one `IMMEDIATE` transaction; a failure leaves
//!   nothing behind.
//! - Reads skip `is_deleted = 1` rows unless the caller asks for them.
//! - Constraint failures surface as the matching `StoreError` variant.

pub mod operator_repo;
pub mod relation_repo;
pub mod tag_repo;
pub mod term_repo;

pub use operator_repo::{OperatorListQuery, OperatorRepository, SqliteOperatorRepository};
pub use relation_repo::{SqliteTermRelationRepository, TermRelationRepository};
pub use tag_repo::{SqliteTagRepository, TagRepository};
pub use term_repo::{SqliteTermRepository, TermRepository};

use crate::db::{StoreError, StoreResult};
use crate::model::OperatorId;
use rusqlite::{Connection, OptionalExtension};

/// Name of a live operator, or `NotFound`
pub(crate) fn live_operator_name(conn: &Connection, id: OperatorId) -> StoreResult<String> {
    conn.query_row(
        "SELECT name FROM operators WHERE id = ?1 AND is_deleted = 0",
        [id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("operator", id))
}

/// Errors with `NotFound` unless a live operator has this name
pub(crate) fn ensure_live_operator_name(conn: &Connection, name: &str) -> StoreResult<()> {
    conn.query_row(
        "SELECT 1 FROM operators WHERE name = ?1 AND is_deleted = 0",
        [name],
        |_| Ok(()),
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("operator", name))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
