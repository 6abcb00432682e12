use log::info;
use rusqlite::{params, Connection, TransactionBehavior};

use super::ensure_live_operator_name;
use crate::db::{StoreError, StoreResult};
use crate::model::{ModuleRef, TermRelation};

/// Term occurrences inside operator modules, keyed by names
pub trait TermRelationRepository {
    /// Inserts one relation. A missing or soft-deleted operator is `NotFound`,
    /// an unknown term a `ForeignKeyViolation` and a repeated relation a
    /// `UniqueViolation`.
    fn insert_relation(&self, relation: &TermRelation) -> StoreResult<i64>;
    /// Replaces every relation of one live operator
    fn replace_operator_relations(
        &mut self,
        operator_name: &str,
        relations: &[TermRelation],
    ) -> StoreResult<usize>;
    /// Live relations whose operator and term are both live
    fn relations_for_operator(&self, operator_name: &str) -> StoreResult<Vec<TermRelation>>;
    /// Names of live operators that reference the term
    fn operators_for_term(&self, term_name: &str) -> StoreResult<Vec<String>>;
}

pub struct SqliteTermRelationRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTermRelationRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TermRelationRepository for SqliteTermRelationRepository<'_> {
    fn insert_relation(&self, relation: &TermRelation) -> StoreResult<i64> {
        ensure_live_operator_name(self.conn, &relation.operator_name)?;
        insert_one(self.conn, relation)
    }

    fn replace_operator_relations(
        &mut self,
        operator_name: &str,
        relations: &[TermRelation],
    ) -> StoreResult<usize> {
        if let Some(stray) = relations
            .iter()
            .find(|relation| relation.operator_name != operator_name)
        {
            return Err(StoreError::Invalid(format!(
                "relation for `{}` passed while replacing `{}`",
                stray.operator_name, operator_name
            )));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_live_operator_name(&tx, operator_name)?;

        tx.execute(
            "DELETE FROM operator_term_relations WHERE operator_name = ?1",
            [operator_name],
        )?;
        for relation in relations {
            insert_one(&tx, relation)?;
        }
        tx.commit()?;

        info!(
            "event=relations_replace module=repo status=ok operator={} rows={}",
            operator_name,
            relations.len()
        );
        Ok(relations.len())
    }

    fn relations_for_operator(&self, operator_name: &str) -> StoreResult<Vec<TermRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.term_name, r.relation_type, r.module_index
             FROM operator_term_relations r
             INNER JOIN operators o ON o.name = r.operator_name
             INNER JOIN terms t ON t.term_name = r.term_name
             WHERE r.operator_name = ?1
               AND r.is_deleted = 0
               AND o.is_deleted = 0
               AND t.is_deleted = 0
             ORDER BY r.id",
        )?;
        let rows = stmt
            .query_map([operator_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(term_name, kind, index)| -> StoreResult<TermRelation> {
                let module = ModuleRef::from_parts(&kind, index)?;
                Ok(TermRelation::new(operator_name, term_name, module))
            })
            .collect()
    }

    fn operators_for_term(&self, term_name: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT r.operator_name
             FROM operator_term_relations r
             INNER JOIN operators o ON o.name = r.operator_name
             INNER JOIN terms t ON t.term_name = r.term_name
             WHERE r.term_name = ?1
               AND r.is_deleted = 0
               AND o.is_deleted = 0
               AND t.is_deleted = 0
             ORDER BY r.operator_name",
        )?;
        let names = stmt
            .query_map([term_name], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

fn insert_one(conn: &Connection, relation: &TermRelation) -> StoreResult<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO operator_term_relations (
            operator_name, term_name, relation_type, module_index
        ) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let id = stmt.insert(params![
        relation.operator_name,
        relation.term_name,
        relation.module.kind().as_str(),
        relation.module.index(),
    ])?;
    Ok(id)
}
