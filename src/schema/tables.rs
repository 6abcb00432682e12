//! Table schema definitions for the operator reference data store

use super::types::*;

// =============================================================================
// Lookup Tables (no FK dependencies)
// =============================================================================

pub static TAG_DICT: TableSchema = TableSchema {
    name: "tag_dict",
    comment: "official operator tag vocabulary",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("tag id"),
        Column::required("tag_name", ColumnType::Text).comment("tag name, e.g. 治疗"),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["tag_name"])],
    checks: &[],
    child_tables: &[],
};

pub static TERMS: TableSchema = TableSchema {
    name: "terms",
    comment: "glossary of game mechanic keywords",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("term id"),
        Column::required("term_name", ColumnType::Text).comment("term name, globally unique"),
        Column::new("term_explanation", ColumnType::Text).comment("term explanation text"),
    ],
    foreign_keys: &[],
    indexes: &[Index::unique(&["term_name"])],
    checks: &[],
    child_tables: &[],
};

// =============================================================================
// Aggregate Root
// =============================================================================

pub static OPERATORS: TableSchema = TableSchema {
    name: "operators",
    comment: "playable operators",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("operator id"),
        Column::required("name", ColumnType::Text).comment("operator name, globally unique"),
        Column::new("rarity", ColumnType::Integer).comment("rarity in stars, 1-6"),
        Column::required("profession", ColumnType::Text).comment("profession, e.g. 医疗"),
        Column::new("branch", ColumnType::Text).comment("profession branch, e.g. 咒愈师"),
        Column::new("faction", ColumnType::Text).comment("faction"),
        Column::new("gender", ColumnType::Text).comment("gender"),
        Column::new("position", ColumnType::Text).comment("deployment position: 近战位/远程位"),
        Column::new("branch_description", ColumnType::Text).comment("branch trait summary"),
        Column::new("trait_details", ColumnType::Text).comment("branch trait details"),
    ],
    foreign_keys: &[],
    indexes: &[
        Index::unique(&["name"]),
        Index::on(&["profession"]),
        Index::on(&["rarity"]),
    ],
    checks: &[],
    child_tables: &[
        "operator_attributes",
        "operator_extra_attrs",
        "operator_talents",
        "operator_skills",
        "operator_tags",
        "operator_term_relations",
    ],
};

// =============================================================================
// Operator Children
// =============================================================================

pub static OPERATOR_ATTRIBUTES: TableSchema = TableSchema {
    name: "operator_attributes",
    comment: "stat block at one elite/level checkpoint",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("attribute row id"),
        Column::required("operator_id", ColumnType::Integer).comment("owning operator"),
        Column::required("elite_level", ColumnType::Text)
            .comment("checkpoint label, e.g. elite_0_level_1, elite_2_max, trust_bonus"),
        Column::new("max_hp", ColumnType::Integer).comment("max HP, NULL for special values"),
        Column::new("atk", ColumnType::Integer).comment("attack, NULL for special values"),
        Column::new("def", ColumnType::Integer).comment("defense, NULL for special values"),
        Column::new("res", ColumnType::Integer).comment("arts resistance, NULL for special values"),
    ],
    foreign_keys: &[ForeignKey::new("operator_id", "operators")],
    indexes: &[Index::unique(&["operator_id", "elite_level"])],
    checks: &[],
    child_tables: &[],
};

pub static OPERATOR_EXTRA_ATTRS: TableSchema = TableSchema {
    name: "operator_extra_attrs",
    comment: "deployment-related stats",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("extra attribute row id"),
        Column::required("operator_id", ColumnType::Integer).comment("owning operator"),
        Column::new("redeployment_time", ColumnType::Text).comment("redeployment time, e.g. 70s"),
        Column::new("initial_deployment_cost", ColumnType::Integer).comment("initial deployment cost"),
        Column::new("attack_interval", ColumnType::Text).comment("attack interval, e.g. 1.6s"),
        Column::new("block_count", ColumnType::Integer).comment("block count"),
        Column::new("hidden_faction", ColumnType::Text).comment("hidden faction"),
    ],
    foreign_keys: &[ForeignKey::new("operator_id", "operators")],
    indexes: &[Index::on(&["operator_id"])],
    checks: &[],
    child_tables: &[],
};

pub static OPERATOR_TALENTS: TableSchema = TableSchema {
    name: "operator_talents",
    comment: "passive ability slots",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("talent id"),
        Column::required("operator_id", ColumnType::Integer).comment("owning operator"),
        Column::required("talent_type", ColumnType::Text).comment("slot label, e.g. 第一天赋"),
        Column::required("talent_name", ColumnType::Text).comment("talent name"),
        Column::new("remarks", ColumnType::Text).comment("remarks"),
    ],
    foreign_keys: &[ForeignKey::new("operator_id", "operators")],
    indexes: &[Index::on(&["operator_id"])],
    checks: &[],
    child_tables: &["talent_details"],
};

pub static OPERATOR_SKILLS: TableSchema = TableSchema {
    name: "operator_skills",
    comment: "active skill slots",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("skill id"),
        Column::required("operator_id", ColumnType::Integer).comment("owning operator"),
        Column::required("skill_number", ColumnType::Integer).comment("skill slot, 1-3"),
        Column::required("skill_name", ColumnType::Text).comment("skill name"),
        Column::new("skill_type", ColumnType::Text).comment("recovery|trigger type, '|'-joined"),
        Column::new("unlock_condition", ColumnType::Text).comment("unlock condition, e.g. 精英1"),
        Column::new("remarks", ColumnType::Text).comment("remarks"),
    ],
    foreign_keys: &[ForeignKey::new("operator_id", "operators")],
    indexes: &[Index::unique(&["operator_id", "skill_number"])],
    checks: &[Check::new(
        "ck_operator_skills_skill_number",
        "skill_number BETWEEN 1 AND 3",
    )],
    child_tables: &["skill_levels"],
};

pub static OPERATOR_TAGS: TableSchema = TableSchema {
    name: "operator_tags",
    comment: "operator to tag membership",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("membership id"),
        Column::required("operator_id", ColumnType::Integer).comment("tagged operator"),
        Column::required("tag_id", ColumnType::Integer).comment("tag"),
    ],
    foreign_keys: &[
        ForeignKey::new("operator_id", "operators"),
        ForeignKey::new("tag_id", "tag_dict"),
    ],
    indexes: &[
        Index::unique(&["operator_id", "tag_id"]),
        Index::on(&["tag_id"]),
    ],
    checks: &[],
    child_tables: &[],
};

pub static OPERATOR_TERM_RELATIONS: TableSchema = TableSchema {
    name: "operator_term_relations",
    comment: "glossary term referenced inside an operator's trait, talent or skill",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("relation id"),
        Column::required("operator_name", ColumnType::Text).comment("operator natural key"),
        Column::required("term_name", ColumnType::Text).comment("term natural key"),
        Column::required("relation_type", ColumnType::Text).comment("module kind: trait/talent/skill"),
        Column::required("module_index", ColumnType::Integer)
            .comment("module index: 0 for trait, 1-2 for talent, 1-3 for skill"),
    ],
    foreign_keys: &[
        ForeignKey::natural("operator_name", "operators", "name"),
        ForeignKey::natural("term_name", "terms", "term_name"),
    ],
    indexes: &[
        Index::unique(&["operator_name", "term_name", "relation_type", "module_index"]),
        Index::on(&["term_name"]),
    ],
    checks: &[Check::new(
        "ck_operator_term_relations_module",
        "(relation_type = 'trait' AND module_index = 0) \
         OR (relation_type = 'talent' AND module_index IN (1, 2)) \
         OR (relation_type = 'skill' AND module_index IN (1, 2, 3))",
    )],
    child_tables: &[],
};

// =============================================================================
// Nested Detail Tables
// =============================================================================

pub static TALENT_DETAILS: TableSchema = TableSchema {
    name: "talent_details",
    comment: "effect text for a talent",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("detail id"),
        Column::required("talent_id", ColumnType::Integer).comment("owning talent"),
        Column::new("trigger_condition", ColumnType::Text).comment("unlock condition, e.g. 精英2"),
        Column::new("description", ColumnType::Text).comment("effect description"),
        Column::new("potential_enhancement", ColumnType::Text)
            .comment("description after potential enhancement"),
    ],
    foreign_keys: &[ForeignKey::new("talent_id", "operator_talents")],
    indexes: &[Index::on(&["talent_id"])],
    checks: &[],
    child_tables: &[],
};

pub static SKILL_LEVELS: TableSchema = TableSchema {
    name: "skill_levels",
    comment: "skill numbers at one level or mastery tier",
    columns: &[
        Column::required("id", ColumnType::Integer).comment("level row id"),
        Column::required("skill_id", ColumnType::Integer).comment("owning skill"),
        Column::required("level", ColumnType::Text).comment("level label, e.g. 7 or 专精3"),
        Column::new("initial_sp", ColumnType::Integer).comment("initial SP"),
        Column::new("sp_cost", ColumnType::Integer).comment("SP cost"),
        Column::new("duration", ColumnType::Text).comment("duration"),
        Column::new("description", ColumnType::Text).comment("effect description"),
    ],
    foreign_keys: &[ForeignKey::new("skill_id", "operator_skills")],
    indexes: &[Index::unique(&["skill_id", "level"])],
    checks: &[],
    child_tables: &[],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Lookup tables
    &TAG_DICT,
    &TERMS,
    // Root
    &OPERATORS,
    // Children of operators
    &OPERATOR_ATTRIBUTES,
    &OPERATOR_EXTRA_ATTRS,
    &OPERATOR_TALENTS,
    &OPERATOR_SKILLS,
    &OPERATOR_TAGS,
    &OPERATOR_TERM_RELATIONS,
    // Second-level children
    &TALENT_DETAILS,
    &SKILL_LEVELS,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
