//! Operator aggregate persistence.
//!
//! # Invariants
//! - An operator and everything it owns are written in one transaction.
//! - Replacing a child collection is delete-then-insert in one transaction.
//! - Soft delete flags the operator and all its descendant rows together;
//!   hard delete relies on `ON DELETE CASCADE`.

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use super::tag_repo::{insert_operator_tags, load_operator_tags};
use super::{bool_to_int, live_operator_name};
use crate::db::{StoreError, StoreResult};
use crate::model::{
    operator::validate_skills, AttributeCheckpoint, ExtraAttributes, NewOperator, Operator,
    OperatorDetail, OperatorId, OperatorPatch, Skill, SkillLevel, Talent, TalentDetail,
};

const OPERATOR_SELECT_SQL: &str = "SELECT
        id,
        name,
        rarity,
        profession,
        branch,
        faction,
        gender,
        position,
        branch_description,
        trait_details,
        is_deleted,
        created_at,
        updated_at
     FROM operators";

/// Flag updates for one operator and every row it owns; `?1` id, `?2` flag.
/// A restore leaves relations to soft-deleted terms flagged.
const SET_DELETED_SQL: &[&str] = &[
    "UPDATE operator_term_relations SET is_deleted = ?2
     WHERE operator_name = (SELECT name FROM operators WHERE id = ?1)
       AND (?2 = 1 OR term_name IN (SELECT term_name FROM terms WHERE is_deleted = 0))",
    "UPDATE talent_details SET is_deleted = ?2
     WHERE talent_id IN (SELECT id FROM operator_talents WHERE operator_id = ?1)",
    "UPDATE skill_levels SET is_deleted = ?2
     WHERE skill_id IN (SELECT id FROM operator_skills WHERE operator_id = ?1)",
    "UPDATE operator_attributes SET is_deleted = ?2 WHERE operator_id = ?1",
    "UPDATE operator_extra_attrs SET is_deleted = ?2 WHERE operator_id = ?1",
    "UPDATE operator_talents SET is_deleted = ?2 WHERE operator_id = ?1",
    "UPDATE operator_skills SET is_deleted = ?2 WHERE operator_id = ?1",
    "UPDATE operator_tags SET is_deleted = ?2 WHERE operator_id = ?1",
    "UPDATE operators SET is_deleted = ?2 WHERE id = ?1",
];

/// Filters for listing operators
#[derive(Debug, Clone, Default)]
pub struct OperatorListQuery {
    pub profession: Option<String>,
    /// Exact tag name
    pub tag: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository for the operator aggregate
pub trait OperatorRepository {
    /// Creates the operator with all owned rows; returns the new id
    fn create_operator(&mut self, operator: &NewOperator) -> StoreResult<OperatorId>;
    fn get_operator(&self, id: OperatorId, include_deleted: bool) -> StoreResult<Option<Operator>>;
    fn find_operator_by_name(&self, name: &str) -> StoreResult<Option<Operator>>;
    /// Live operator with all live owned rows
    fn load_operator_detail(&self, id: OperatorId) -> StoreResult<Option<OperatorDetail>>;
    fn list_operators(&self, query: &OperatorListQuery) -> StoreResult<Vec<Operator>>;
    /// Updates the given fields of a live operator's own row
    fn update_operator(&mut self, id: OperatorId, patch: &OperatorPatch) -> StoreResult<()>;
    fn replace_attributes(
        &mut self,
        id: OperatorId,
        attributes: &[AttributeCheckpoint],
    ) -> StoreResult<()>;
    fn set_extra_attributes(&mut self, id: OperatorId, extra: &ExtraAttributes) -> StoreResult<()>;
    fn replace_talents(&mut self, id: OperatorId, talents: &[Talent]) -> StoreResult<()>;
    fn replace_skills(&mut self, id: OperatorId, skills: &[Skill]) -> StoreResult<()>;
    fn soft_delete_operator(&mut self, id: OperatorId) -> StoreResult<()>;
    fn restore_operator(&mut self, id: OperatorId) -> StoreResult<()>;
    /// Physically removes the operator; owned rows go with it
    fn delete_operator(&mut self, id: OperatorId) -> StoreResult<()>;
}

pub struct SqliteOperatorRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteOperatorRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    fn set_deleted(&mut self, id: OperatorId, deleted: bool) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<bool> = tx
            .query_row(
                "SELECT is_deleted FROM operators WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        // Already in the requested state counts as missing
        if current != Some(!deleted) {
            return Err(StoreError::not_found("operator", id));
        }

        for sql in SET_DELETED_SQL {
            tx.execute(sql, params![id, bool_to_int(deleted)])?;
        }
        tx.commit()?;

        info!(
            "event=operator_set_deleted module=repo status=ok id={} deleted={}",
            id, deleted
        );
        Ok(())
    }
}

impl OperatorRepository for SqliteOperatorRepository<'_> {
    fn create_operator(&mut self, operator: &NewOperator) -> StoreResult<OperatorId> {
        operator.validate().map_err(StoreError::Invalid)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO operators (
                name,
                rarity,
                profession,
                branch,
                faction,
                gender,
                position,
                branch_description,
                trait_details
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                operator.name.trim(),
                operator.rarity,
                operator.profession.trim(),
                operator.branch,
                operator.faction,
                operator.gender,
                operator.position,
                operator.branch_description,
                operator.trait_details,
            ],
        )?;
        let id = tx.last_insert_rowid();

        insert_attributes(&tx, id, &operator.attributes)?;
        if let Some(extra) = &operator.extra {
            insert_extra_attributes(&tx, id, extra)?;
        }
        insert_talents(&tx, id, &operator.talents)?;
        insert_skills(&tx, id, &operator.skills)?;
        insert_operator_tags(&tx, id, &operator.tags)?;

        tx.commit()?;

        info!(
            "event=operator_create module=repo status=ok id={} attributes={} talents={} skills={} tags={}",
            id,
            operator.attributes.len(),
            operator.talents.len(),
            operator.skills.len(),
            operator.tags.len()
        );
        Ok(id)
    }

    fn get_operator(&self, id: OperatorId, include_deleted: bool) -> StoreResult<Option<Operator>> {
        let operator = self
            .conn
            .query_row(
                &format!("{OPERATOR_SELECT_SQL} WHERE id = ?1 AND (?2 = 1 OR is_deleted = 0)"),
                params![id, bool_to_int(include_deleted)],
                parse_operator_row,
            )
            .optional()?;
        Ok(operator)
    }

    fn find_operator_by_name(&self, name: &str) -> StoreResult<Option<Operator>> {
        let operator = self
            .conn
            .query_row(
                &format!("{OPERATOR_SELECT_SQL} WHERE name = ?1 AND is_deleted = 0"),
                [name.trim()],
                parse_operator_row,
            )
            .optional()?;
        Ok(operator)
    }

    fn load_operator_detail(&self, id: OperatorId) -> StoreResult<Option<OperatorDetail>> {
        let Some(operator) = self.get_operator(id, false)? else {
            return Ok(None);
        };

        let detail = OperatorDetail {
            attributes: load_attributes(self.conn, id)?,
            extra: load_extra_attributes(self.conn, id)?,
            talents: load_talents(self.conn, id)?,
            skills: load_skills(self.conn, id)?,
            tags: load_operator_tags(self.conn, id)?,
            operator,
        };
        Ok(Some(detail))
    }

    fn list_operators(&self, query: &OperatorListQuery) -> StoreResult<Vec<Operator>> {
        let mut sql = format!("{OPERATOR_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }

        if let Some(profession) = query.profession.as_ref() {
            sql.push_str(" AND profession = ?");
            bind_values.push(Value::Text(profession.clone()));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM operator_tags ot
                    INNER JOIN tag_dict t ON t.id = ot.tag_id
                    WHERE ot.operator_id = operators.id
                      AND ot.is_deleted = 0
                      AND t.tag_name = ?
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY rarity DESC, name ASC");

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            None if query.offset > 0 => sql.push_str(" LIMIT -1"),
            None => {}
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        debug!("event=operator_list module=repo sql_binds={}", bind_values.len());

        let mut stmt = self.conn.prepare(&sql)?;
        let operators = stmt
            .query_map(params_from_iter(bind_values), parse_operator_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(operators)
    }

    fn update_operator(&mut self, id: OperatorId, patch: &OperatorPatch) -> StoreResult<()> {
        patch.validate().map_err(StoreError::Invalid)?;

        let text = |value: &Option<String>| {
            value.as_ref().map(|v| Value::Text(v.trim().to_string()))
        };
        let fields: Vec<(&str, Value)> = [
            ("name", text(&patch.name)),
            ("rarity", patch.rarity.map(Value::Integer)),
            ("profession", text(&patch.profession)),
            ("branch", text(&patch.branch)),
            ("faction", text(&patch.faction)),
            ("gender", text(&patch.gender)),
            ("position", text(&patch.position)),
            ("branch_description", text(&patch.branch_description)),
            ("trait_details", text(&patch.trait_details)),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, id)?;

        if !fields.is_empty() {
            let assignments: Vec<String> = fields
                .iter()
                .map(|(column, _)| format!("{} = ?", column))
                .collect();
            let sql = format!(
                "UPDATE operators SET {} WHERE id = ?",
                assignments.join(", ")
            );
            let mut bind_values: Vec<Value> = fields.into_iter().map(|(_, v)| v).collect();
            bind_values.push(Value::Integer(id));
            tx.execute(&sql, params_from_iter(bind_values))?;
        }
        tx.commit()?;

        info!("event=operator_update module=repo status=ok id={}", id);
        Ok(())
    }

    fn replace_attributes(
        &mut self,
        id: OperatorId,
        attributes: &[AttributeCheckpoint],
    ) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, id)?;

        tx.execute("DELETE FROM operator_attributes WHERE operator_id = ?1", [id])?;
        insert_attributes(&tx, id, attributes)?;
        tx.commit()?;
        Ok(())
    }

    fn set_extra_attributes(&mut self, id: OperatorId, extra: &ExtraAttributes) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, id)?;

        tx.execute("DELETE FROM operator_extra_attrs WHERE operator_id = ?1", [id])?;
        insert_extra_attributes(&tx, id, extra)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_talents(&mut self, id: OperatorId, talents: &[Talent]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, id)?;

        // talent_details follow through the cascade
        tx.execute("DELETE FROM operator_talents WHERE operator_id = ?1", [id])?;
        insert_talents(&tx, id, talents)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_skills(&mut self, id: OperatorId, skills: &[Skill]) -> StoreResult<()> {
        validate_skills(skills).map_err(StoreError::Invalid)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        live_operator_name(&tx, id)?;

        tx.execute("DELETE FROM operator_skills WHERE operator_id = ?1", [id])?;
        insert_skills(&tx, id, skills)?;
        tx.commit()?;
        Ok(())
    }

    fn soft_delete_operator(&mut self, id: OperatorId) -> StoreResult<()> {
        self.set_deleted(id, true)
    }

    fn restore_operator(&mut self, id: OperatorId) -> StoreResult<()> {
        self.set_deleted(id, false)
    }

    fn delete_operator(&mut self, id: OperatorId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM operators WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::not_found("operator", id));
        }

        info!("event=operator_delete module=repo status=ok id={}", id);
        Ok(())
    }
}

// =============================================================================
// Child Writers
// =============================================================================

fn insert_attributes(
    conn: &Connection,
    operator_id: OperatorId,
    attributes: &[AttributeCheckpoint],
) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO operator_attributes (
            operator_id, elite_level, max_hp, atk, def, res
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for attr in attributes {
        stmt.execute(params![
            operator_id,
            attr.elite_level,
            attr.max_hp,
            attr.atk,
            attr.def,
            attr.res,
        ])?;
    }
    Ok(())
}

fn insert_extra_attributes(
    conn: &Connection,
    operator_id: OperatorId,
    extra: &ExtraAttributes,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO operator_extra_attrs (
            operator_id,
            redeployment_time,
            initial_deployment_cost,
            attack_interval,
            block_count,
            hidden_faction
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            operator_id,
            extra.redeployment_time,
            extra.initial_deployment_cost,
            extra.attack_interval,
            extra.block_count,
            extra.hidden_faction,
        ],
    )?;
    Ok(())
}

fn insert_talents(conn: &Connection, operator_id: OperatorId, talents: &[Talent]) -> StoreResult<()> {
    let mut talent_stmt = conn.prepare_cached(
        "INSERT INTO operator_talents (
            operator_id, talent_type, talent_name, remarks
        ) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut detail_stmt = conn.prepare_cached(
        "INSERT INTO talent_details (
            talent_id, trigger_condition, description, potential_enhancement
        ) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for talent in talents {
        let talent_id = talent_stmt.insert(params![
            operator_id,
            talent.talent_type,
            talent.talent_name,
            talent.remarks,
        ])?;

        for detail in &talent.details {
            detail_stmt.execute(params![
                talent_id,
                detail.trigger_condition,
                detail.description,
                detail.potential_enhancement,
            ])?;
        }
    }
    Ok(())
}

fn insert_skills(conn: &Connection, operator_id: OperatorId, skills: &[Skill]) -> StoreResult<()> {
    let mut skill_stmt = conn.prepare_cached(
        "INSERT INTO operator_skills (
            operator_id, skill_number, skill_name, skill_type, unlock_condition, remarks
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut level_stmt = conn.prepare_cached(
        "INSERT INTO skill_levels (
            skill_id, level, initial_sp, sp_cost, duration, description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for skill in skills {
        let skill_id = skill_stmt.insert(params![
            operator_id,
            skill.skill_number,
            skill.skill_name,
            skill.skill_type,
            skill.unlock_condition,
            skill.remarks,
        ])?;

        for level in &skill.levels {
            level_stmt.execute(params![
                skill_id,
                level.level,
                level.initial_sp,
                level.sp_cost,
                level.duration,
                level.description,
            ])?;
        }
    }
    Ok(())
}

// =============================================================================
// Child Readers
// =============================================================================

fn parse_operator_row(row: &Row<'_>) -> rusqlite::Result<Operator> {
    Ok(Operator {
        id: row.get("id")?,
        name: row.get("name")?,
        rarity: row.get("rarity")?,
        profession: row.get("profession")?,
        branch: row.get("branch")?,
        faction: row.get("faction")?,
        gender: row.get("gender")?,
        position: row.get("position")?,
        branch_description: row.get("branch_description")?,
        trait_details: row.get("trait_details")?,
        is_deleted: row.get("is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_attributes(conn: &Connection, operator_id: OperatorId) -> StoreResult<Vec<AttributeCheckpoint>> {
    let mut stmt = conn.prepare_cached(
        "SELECT elite_level, max_hp, atk, def, res
         FROM operator_attributes
         WHERE operator_id = ?1 AND is_deleted = 0
         ORDER BY id",
    )?;
    let attributes = stmt
        .query_map([operator_id], |row| {
            Ok(AttributeCheckpoint {
                elite_level: row.get(0)?,
                max_hp: row.get(1)?,
                atk: row.get(2)?,
                def: row.get(3)?,
                res: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(attributes)
}

fn load_extra_attributes(
    conn: &Connection,
    operator_id: OperatorId,
) -> StoreResult<Option<ExtraAttributes>> {
    let extra = conn
        .query_row(
            "SELECT redeployment_time, initial_deployment_cost, attack_interval, block_count, hidden_faction
             FROM operator_extra_attrs
             WHERE operator_id = ?1 AND is_deleted = 0
             ORDER BY id DESC
             LIMIT 1",
            [operator_id],
            |row| {
                Ok(ExtraAttributes {
                    redeployment_time: row.get(0)?,
                    initial_deployment_cost: row.get(1)?,
                    attack_interval: row.get(2)?,
                    block_count: row.get(3)?,
                    hidden_faction: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(extra)
}

fn load_talents(conn: &Connection, operator_id: OperatorId) -> StoreResult<Vec<Talent>> {
    let mut talent_stmt = conn.prepare_cached(
        "SELECT id, talent_type, talent_name, remarks
         FROM operator_talents
         WHERE operator_id = ?1 AND is_deleted = 0
         ORDER BY id",
    )?;
    let rows = talent_stmt
        .query_map([operator_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Talent {
                    talent_type: row.get(1)?,
                    talent_name: row.get(2)?,
                    remarks: row.get(3)?,
                    details: Vec::new(),
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut detail_stmt = conn.prepare_cached(
        "SELECT trigger_condition, description, potential_enhancement
         FROM talent_details
         WHERE talent_id = ?1 AND is_deleted = 0
         ORDER BY id",
    )?;

    let mut talents = Vec::with_capacity(rows.len());
    for (talent_id, mut talent) in rows {
        talent.details = detail_stmt
            .query_map([talent_id], |row| {
                Ok(TalentDetail {
                    trigger_condition: row.get(0)?,
                    description: row.get(1)?,
                    potential_enhancement: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        talents.push(talent);
    }
    Ok(talents)
}

fn load_skills(conn: &Connection, operator_id: OperatorId) -> StoreResult<Vec<Skill>> {
    let mut skill_stmt = conn.prepare_cached(
        "SELECT id, skill_number, skill_name, skill_type, unlock_condition, remarks
         FROM operator_skills
         WHERE operator_id = ?1 AND is_deleted = 0
         ORDER BY skill_number",
    )?;
    let rows = skill_stmt
        .query_map([operator_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Skill {
                    skill_number: row.get(1)?,
                    skill_name: row.get(2)?,
                    skill_type: row.get(3)?,
                    unlock_condition: row.get(4)?,
                    remarks: row.get(5)?,
                    levels: Vec::new(),
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut level_stmt = conn.prepare_cached(
        "SELECT level, initial_sp, sp_cost, duration, description
         FROM skill_levels
         WHERE skill_id = ?1 AND is_deleted = 0
         ORDER BY id",
    )?;

    let mut skills = Vec::with_capacity(rows.len());
    for (skill_id, mut skill) in rows {
        skill.levels = level_stmt
            .query_map([skill_id], |row| {
                Ok(SkillLevel {
                    level: row.get(0)?,
                    initial_sp: row.get(1)?,
                    sp_cost: row.get(2)?,
                    duration: row.get(3)?,
                    description: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        skills.push(skill);
    }
    Ok(skills)
}
