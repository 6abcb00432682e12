use log::info;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashSet;

use super::live_operator_name;
use crate::db::{StoreError, StoreResult};
use crate::model::{OperatorId, Tag};
use crate::writer::seed_tag_dict;

/// Tag dictionary and operator tag membership
pub trait TagRepository {
    /// Inserts the fixed vocabulary; names already present are skipped
    fn seed_tags(&mut self) -> StoreResult<usize>;
    /// Inserts one new tag. An existing name is a `UniqueViolation`.
    fn insert_tag(&self, tag_name: &str) -> StoreResult<i64>;
    fn list_tags(&self) -> StoreResult<Vec<Tag>>;
    fn find_tag(&self, tag_name: &str) -> StoreResult<Option<Tag>>;
    fn operator_tags(&self, operator_id: OperatorId) -> StoreResult<Vec<String>>;
    /// Replaces the whole tag set of an operator
    fn set_operator_tags(&mut self, operator_id: OperatorId, tags: &[String]) -> StoreResult<()>;
}

pub struct SqliteTagRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn seed_tags(&mut self) -> StoreResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = seed_tag_dict(&tx)?;
        tx.commit()?;
        info!("event=seed module=repo status=ok table=tag_dict rows={}", inserted);
        Ok(inserted)
    }

    fn insert_tag(&self, tag_name: &str) -> StoreResult<i64> {
        let tag_name = tag_name.trim();
        if tag_name.is_empty() {
            return Err(StoreError::Invalid("tag name cannot be empty".to_string()));
        }
        self.conn
            .execute("INSERT INTO tag_dict (tag_name) VALUES (?1)", [tag_name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tag_name FROM tag_dict WHERE is_deleted = 0 ORDER BY id",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    tag_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn find_tag(&self, tag_name: &str) -> StoreResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, tag_name FROM tag_dict WHERE tag_name = ?1 AND is_deleted = 0",
                [tag_name],
                |row| {
                    Ok(Tag {
                        id: row.get(0)?,
                        tag_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(tag)
    }

    fn operator_tags(&self, operator_id: OperatorId) -> StoreResult<Vec<String>> {
        load_operator_tags(self.conn, operator_id)
    }

    fn set_operator_tags(&mut self, operator_id: OperatorId, tags: &[String]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, operator_id)?;

        tx.execute(
            "DELETE FROM operator_tags WHERE operator_id = ?1",
            [operator_id],
        )?;
        insert_operator_tags(&tx, operator_id, tags)?;
        tx.commit()?;

        Ok(())
    }
}

/// Links an operator to dictionary tags by name. Repeated names are linked
/// once; a name missing from the dictionary is `NotFound`.
pub(crate) fn insert_operator_tags(
    conn: &Connection,
    operator_id: OperatorId,
    tags: &[String],
) -> StoreResult<()> {
    let mut lookup = conn.prepare_cached(
        "SELECT id FROM tag_dict WHERE tag_name = ?1 AND is_deleted = 0",
    )?;
    let mut insert = conn.prepare_cached(
        "INSERT INTO operator_tags (operator_id, tag_id) VALUES (?1, ?2)",
    )?;

    let mut seen = HashSet::new();
    for tag in tags {
        let tag = tag.trim();
        if !seen.insert(tag) {
            continue;
        }
        let tag_id: i64 = lookup
            .query_row([tag], |row| row.get(0))
            .optional()?
            .ok_or_else(|| StoreError::not_found("tag", tag))?;
        insert.execute(params![operator_id, tag_id])?;
    }

    Ok(())
}

pub(crate) fn load_operator_tags(
    conn: &Connection,
    operator_id: OperatorId,
) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.tag_name
         FROM operator_tags ot
         INNER JOIN tag_dict t ON t.id = ot.tag_id
         WHERE ot.operator_id = ?1
           AND ot.is_deleted = 0
           AND t.is_deleted = 0
         ORDER BY t.id",
    )?;
    let tags = stmt
        .query_map([operator_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tags)
}
