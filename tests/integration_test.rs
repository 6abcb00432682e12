//! Integration tests for the store: constraints, cascades, soft delete and
//! the tag seed, exercised through the repositories and through raw SQL.
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

use arkdata_sqlite::db::{open_db, open_db_in_memory, schema_version, SCHEMA_VERSION};
use arkdata_sqlite::model::{
    AttributeCheckpoint, ExtraAttributes, ModuleRef, NewOperator, NewTerm, OperatorPatch, Skill,
    SkillLevel, Talent, TalentDetail, TermRelation,
};
use arkdata_sqlite::repo::{
    OperatorListQuery, OperatorRepository, SqliteOperatorRepository, SqliteTagRepository,
    SqliteTermRelationRepository, SqliteTermRepository, TagRepository, TermRelationRepository,
    TermRepository,
};
use arkdata_sqlite::schema::{ALL_TABLES, TAG_DICT_SEED};
use arkdata_sqlite::writer::initialize_database;
use arkdata_sqlite::StoreError;

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible tag sampling
const RANDOM_SEED: u64 = 42;

// =============================================================================
// Shared Test Database
// =============================================================================

/// File-backed database created once by `initialize_database` and reused
static TEST_DB: Lazy<Mutex<TestDatabase>> = Lazy::new(|| Mutex::new(TestDatabase::new()));

struct TestDatabase {
    _dir: TempDir,
    db_path: PathBuf,
}

impl TestDatabase {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("arkdata.sqlite3");

        initialize_database(&db_path, ALL_TABLES, true, false)
            .expect("Failed to initialize test database");

        Self { _dir: dir, db_path }
    }

    fn connection(&self) -> Connection {
        open_db(&self.db_path).expect("Failed to open test database")
    }
}

fn shared_db() -> MutexGuard<'static, TestDatabase> {
    TEST_DB.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn fresh_db() -> Connection {
    open_db_in_memory().expect("Failed to open in-memory database")
}

// =============================================================================
// Fixtures
// =============================================================================

fn sample_operator(name: &str) -> NewOperator {
    NewOperator {
        rarity: Some(6),
        branch: Some("咒愈师".into()),
        faction: Some("罗德岛".into()),
        gender: Some("女".into()),
        position: Some("远程位".into()),
        branch_description: Some("攻击造成法术伤害，同时治疗友方单位".into()),
        attributes: vec![
            AttributeCheckpoint {
                elite_level: "精英0 1级".into(),
                max_hp: Some(700),
                atk: Some(210),
                def: Some(55),
                res: Some(10),
            },
            AttributeCheckpoint {
                elite_level: "精英2 满级".into(),
                max_hp: Some(1420),
                atk: Some(520),
                def: Some(110),
                res: None,
            },
        ],
        extra: Some(ExtraAttributes {
            redeployment_time: Some("70s".into()),
            initial_deployment_cost: Some(17),
            attack_interval: Some("1.6s".into()),
            block_count: Some(1),
            hidden_faction: None,
        }),
        talents: vec![Talent {
            talent_type: "第一天赋".into(),
            talent_name: "余烬".into(),
            remarks: None,
            details: vec![
                TalentDetail {
                    trigger_condition: Some("精英1".into()),
                    description: Some("攻击使目标受到的治疗效果提升".into()),
                    potential_enhancement: None,
                },
                TalentDetail {
                    trigger_condition: Some("精英2".into()),
                    description: Some("效果提升".into()),
                    potential_enhancement: Some("潜能5 效果进一步提升".into()),
                },
            ],
        }],
        // Stored out of order on purpose; reads come back by skill_number
        skills: vec![
            Skill {
                skill_number: 2,
                skill_name: "焚烬之愈".into(),
                skill_type: Some("自动回复|手动触发".into()),
                unlock_condition: Some("精英1".into()),
                remarks: None,
                levels: vec![SkillLevel {
                    level: "7".into(),
                    initial_sp: Some(20),
                    sp_cost: Some(40),
                    duration: Some("20秒".into()),
                    description: Some("攻击力提升".into()),
                }],
            },
            Skill {
                skill_number: 1,
                skill_name: "灼心".into(),
                skill_type: Some("自动回复|自动触发".into()),
                unlock_condition: None,
                remarks: None,
                levels: vec![
                    SkillLevel {
                        level: "1".into(),
                        initial_sp: Some(0),
                        sp_cost: Some(5),
                        duration: None,
                        description: Some("下次攻击额外治疗".into()),
                    },
                    SkillLevel {
                        level: "专精3".into(),
                        initial_sp: Some(0),
                        sp_cost: Some(3),
                        duration: None,
                        description: Some("下次攻击额外治疗".into()),
                    },
                ],
            },
        ],
        tags: vec!["治疗".into(), "输出".into()],
        ..NewOperator::new(name, "医疗")
    }
}

fn create(conn: &mut Connection, operator: &NewOperator) -> i64 {
    SqliteOperatorRepository::new(conn)
        .create_operator(operator)
        .expect("Failed to create operator")
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0))
        .unwrap_or_else(|e| panic!("query failed: {}: {}", sql, e))
}

fn raw_error(conn: &Connection, sql: &str) -> StoreError {
    StoreError::from(conn.execute(sql, []).expect_err("statement should fail"))
}

/// Counts every operator-owned table
fn owned_row_counts(conn: &Connection) -> Vec<(&'static str, i64)> {
    [
        "operator_attributes",
        "operator_extra_attrs",
        "operator_talents",
        "talent_details",
        "operator_skills",
        "skill_levels",
        "operator_tags",
        "operator_term_relations",
    ]
    .into_iter()
    .map(|table| (table, count(conn, &format!("SELECT COUNT(*) FROM {}", table))))
    .collect()
}

// =============================================================================
// Bootstrap and Seed
// =============================================================================

#[test]
fn test_initialized_file_has_schema_and_seed() {
    let db = shared_db();
    let conn = db.connection();

    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM tag_dict") as usize,
        TAG_DICT_SEED.len()
    );
    assert_eq!(count(&conn, "PRAGMA foreign_keys"), 1);
}

#[test]
fn test_reopen_keeps_data() {
    let db = shared_db();
    let name = "reopen-check";
    {
        let mut conn = db.connection();
        create(&mut conn, &NewOperator::new(name, "先锋"));
    }

    let mut conn = db.connection();
    let found = SqliteOperatorRepository::new(&mut conn)
        .find_operator_by_name(name)
        .unwrap()
        .expect("operator should survive reopen");
    assert_eq!(found.profession, "先锋");
}

#[test]
fn test_reseed_restores_exactly_the_fixed_vocabulary() {
    let mut conn = fresh_db();

    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
    let mut tags: Vec<&str> = TAG_DICT_SEED.to_vec();
    tags.shuffle(&mut rng);
    for tag in &tags[..5] {
        conn.execute("DELETE FROM tag_dict WHERE tag_name = ?1", [*tag])
            .unwrap();
    }

    let mut repo = SqliteTagRepository::new(&mut conn);
    assert_eq!(repo.seed_tags().unwrap(), 5);
    assert_eq!(repo.seed_tags().unwrap(), 0);

    let names: BTreeSet<String> = repo
        .list_tags()
        .unwrap()
        .into_iter()
        .map(|t| t.tag_name)
        .collect();
    let expected: BTreeSet<String> = TAG_DICT_SEED.iter().map(|t| t.to_string()).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_duplicate_tag_is_unique_violation() {
    let mut conn = fresh_db();
    let repo = SqliteTagRepository::new(&mut conn);

    let err = repo.insert_tag("治疗").unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
    assert!(repo.insert_tag("新标签").is_ok());
    assert!(matches!(repo.insert_tag("  "), Err(StoreError::Invalid(_))));
}

// =============================================================================
// Operator Aggregate
// =============================================================================

#[test]
fn test_create_and_load_detail() {
    let mut conn = fresh_db();
    let operator = sample_operator("焰影苇草");
    let id = create(&mut conn, &operator);

    let repo = SqliteOperatorRepository::new(&mut conn);
    let detail = repo.load_operator_detail(id).unwrap().unwrap();

    assert_eq!(detail.operator.name, "焰影苇草");
    assert_eq!(detail.operator.rarity, Some(6));
    assert!(!detail.operator.is_deleted);
    assert_eq!(detail.attributes, operator.attributes);
    assert_eq!(detail.extra, operator.extra);
    assert_eq!(detail.talents, operator.talents);
    assert_eq!(detail.tags, vec!["治疗".to_string(), "输出".to_string()]);

    let numbers: Vec<u8> = detail.skills.iter().map(|s| s.skill_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(detail.skills[0].levels.len(), 2);
    assert_eq!(detail.skills[1].skill_name, "焚烬之愈");
}

#[test]
fn test_duplicate_operator_name_is_unique_violation() {
    let mut conn = fresh_db();
    create(&mut conn, &NewOperator::new("令", "辅助"));

    let err = SqliteOperatorRepository::new(&mut conn)
        .create_operator(&NewOperator::new("令", "术师"))
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM operators"), 1);
}

#[test]
fn test_failed_child_rolls_back_whole_aggregate() {
    let mut conn = fresh_db();

    let mut unknown_tag = sample_operator("史尔特尔");
    unknown_tag.tags.push("不存在的标签".into());
    let err = SqliteOperatorRepository::new(&mut conn)
        .create_operator(&unknown_tag)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "tag", .. }));

    let mut repeated_checkpoint = sample_operator("史尔特尔");
    repeated_checkpoint
        .attributes
        .push(repeated_checkpoint.attributes[0].clone());
    let err = SqliteOperatorRepository::new(&mut conn)
        .create_operator(&repeated_checkpoint)
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)));

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM operators"), 0);
    for (table, rows) in owned_row_counts(&conn) {
        assert_eq!(rows, 0, "{} kept rows after rollback", table);
    }
}

#[test]
fn test_invalid_input_is_rejected_before_sql() {
    let mut conn = fresh_db();
    let mut repo = SqliteOperatorRepository::new(&mut conn);

    let mut bad_rarity = NewOperator::new("能天使", "狙击");
    bad_rarity.rarity = Some(7);
    assert!(matches!(
        repo.create_operator(&bad_rarity),
        Err(StoreError::Invalid(_))
    ));

    let mut bad_skill = NewOperator::new("能天使", "狙击");
    bad_skill.skills.push(Skill {
        skill_number: 4,
        skill_name: "x".into(),
        ..Skill::default()
    });
    assert!(matches!(
        repo.create_operator(&bad_skill),
        Err(StoreError::Invalid(_))
    ));
}

#[test]
fn test_replace_skills_drops_old_levels() {
    let mut conn = fresh_db();
    let id = create(&mut conn, &sample_operator("艾雅法拉"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM skill_levels"), 3);

    let replacement = vec![Skill {
        skill_number: 3,
        skill_name: "火山".into(),
        levels: vec![SkillLevel {
            level: "专精3".into(),
            sp_cost: Some(70),
            ..SkillLevel::default()
        }],
        ..Skill::default()
    }];

    let mut repo = SqliteOperatorRepository::new(&mut conn);
    repo.replace_skills(id, &replacement).unwrap();
    let detail = repo.load_operator_detail(id).unwrap().unwrap();
    assert_eq!(detail.skills, replacement);

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM skill_levels"), 1);
}

#[test]
fn test_replace_attributes_talents_and_tags() {
    let mut conn = fresh_db();
    let id = create(&mut conn, &sample_operator("闪灵"));

    {
        let mut repo = SqliteOperatorRepository::new(&mut conn);
        repo.replace_attributes(
            id,
            &[AttributeCheckpoint {
                elite_level: "精英1 满级".into(),
                max_hp: Some(1200),
                ..AttributeCheckpoint::default()
            }],
        )
        .unwrap();
        repo.replace_talents(id, &[]).unwrap();
        repo.set_extra_attributes(
            id,
            &ExtraAttributes {
                block_count: Some(1),
                ..ExtraAttributes::default()
            },
        )
        .unwrap();
    }
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM talent_details"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM operator_extra_attrs"), 1);

    let mut tags = SqliteTagRepository::new(&mut conn);
    tags.set_operator_tags(id, &["支援".into(), "治疗".into(), "支援".into()])
        .unwrap();
    assert_eq!(
        tags.operator_tags(id).unwrap(),
        vec!["治疗".to_string(), "支援".to_string()]
    );
    assert!(matches!(
        tags.set_operator_tags(9999, &["治疗".into()]),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));

    let repo = SqliteOperatorRepository::new(&mut conn);
    let detail = repo.load_operator_detail(id).unwrap().unwrap();
    assert_eq!(detail.attributes.len(), 1);
    assert!(detail.talents.is_empty());
    assert_eq!(detail.extra.and_then(|e| e.block_count), Some(1));
}

#[test]
fn test_list_operators_filters_and_pages() {
    let mut conn = fresh_db();
    create(&mut conn, &sample_operator("焰影苇草"));
    let mut caster = NewOperator::new("艾雅法拉", "术师");
    caster.rarity = Some(6);
    caster.tags = vec!["输出".into()];
    create(&mut conn, &caster);
    let mut vanguard = NewOperator::new("芬", "先锋");
    vanguard.rarity = Some(3);
    vanguard.tags = vec!["费用回复".into()];
    create(&mut conn, &vanguard);

    let repo = SqliteOperatorRepository::new(&mut conn);
    let names = |query: OperatorListQuery| -> Vec<String> {
        repo.list_operators(&query)
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect()
    };

    assert_eq!(names(OperatorListQuery::default()).len(), 3);
    assert_eq!(
        names(OperatorListQuery {
            profession: Some("先锋".into()),
            ..OperatorListQuery::default()
        }),
        vec!["芬".to_string()]
    );

    let mut damage = names(OperatorListQuery {
        tag: Some("输出".into()),
        ..OperatorListQuery::default()
    });
    damage.sort();
    assert_eq!(damage, vec!["焰影苇草".to_string(), "艾雅法拉".to_string()]);

    // Rarity descending puts the 3-star last
    assert_eq!(
        names(OperatorListQuery {
            offset: 2,
            ..OperatorListQuery::default()
        }),
        vec!["芬".to_string()]
    );
    assert_eq!(
        names(OperatorListQuery {
            limit: Some(1),
            offset: 1,
            ..OperatorListQuery::default()
        })
        .len(),
        1
    );
}

// =============================================================================
// Engine Constraints (raw SQL)
// =============================================================================

#[test]
fn test_skill_level_with_missing_skill_is_foreign_key_violation() {
    let conn = fresh_db();
    let err = raw_error(
        &conn,
        "INSERT INTO skill_levels (skill_id, level) VALUES (9999, '1')",
    );
    assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
}

#[test]
fn test_skill_number_outside_range_is_check_violation() {
    let mut conn = fresh_db();
    let id = create(&mut conn, &NewOperator::new("陈", "近卫"));

    let err = raw_error(
        &conn,
        &format!(
            "INSERT INTO operator_skills (operator_id, skill_number, skill_name) VALUES ({}, 4, 'x')",
            id
        ),
    );
    assert!(matches!(err, StoreError::CheckViolation(_)));
}

#[test]
fn test_illegal_module_pairs_are_check_violations() {
    let mut conn = fresh_db();
    create(&mut conn, &NewOperator::new("陈", "近卫"));
    SqliteTermRepository::new(&mut conn)
        .insert_term(&NewTerm::new("法术伤害", "无视防御"))
        .unwrap();

    for (kind, index) in [("trait", 1), ("skill", 4), ("talent", 0), ("module", 1)] {
        let err = raw_error(
            &conn,
            &format!(
                "INSERT INTO operator_term_relations (operator_name, term_name, relation_type, module_index)
                 VALUES ('陈', '法术伤害', '{}', {})",
                kind, index
            ),
        );
        assert!(
            matches!(err, StoreError::CheckViolation(_)),
            "{}/{} should violate the check",
            kind,
            index
        );
        let rejected = ModuleRef::from_parts(kind, index).unwrap_err();
        assert!(matches!(
            StoreError::from(rejected),
            StoreError::InvalidModule(_)
        ));
    }

    // The same pairs the check accepts are the ones the model accepts
    for (kind, index) in [("trait", 0), ("talent", 2), ("skill", 3)] {
        let module = ModuleRef::from_parts(kind, index).unwrap();
        SqliteTermRelationRepository::new(&mut conn)
            .insert_relation(&TermRelation::new("陈", "法术伤害", module))
            .unwrap();
    }
}

#[test]
fn test_missing_required_column_is_not_null_violation() {
    let conn = fresh_db();
    let err = raw_error(&conn, "INSERT INTO operators (name) VALUES ('无职业')");
    assert!(matches!(err, StoreError::NotNullViolation(_)));
}

fn timestamps(conn: &Connection, id: i64) -> (String, String) {
    conn.query_row(
        "SELECT created_at, updated_at FROM operators WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap()
}

#[test]
fn test_update_refreshes_updated_at() {
    let mut conn = fresh_db();
    let id = create(&mut conn, &NewOperator::new("阿米娅", "术师"));

    let before = timestamps(&conn, id);
    sleep(Duration::from_millis(20));
    let patch = OperatorPatch {
        rarity: Some(5),
        faction: Some("罗德岛".into()),
        ..OperatorPatch::default()
    };
    SqliteOperatorRepository::new(&mut conn)
        .update_operator(id, &patch)
        .unwrap();
    let after = timestamps(&conn, id);

    assert_eq!(before.0, after.0);
    assert!(after.1 > before.1, "{} should be after {}", after.1, before.1);

    let operator = SqliteOperatorRepository::new(&mut conn)
        .get_operator(id, false)
        .unwrap()
        .unwrap();
    assert_eq!(operator.rarity, Some(5));
    assert_eq!(operator.faction.as_deref(), Some("罗德岛"));
    assert_eq!(operator.profession, "术师");
}

#[test]
fn test_update_operator_rules() {
    let mut conn = fresh_db();
    let id = create(&mut conn, &NewOperator::new("阿米娅", "术师"));
    create(&mut conn, &NewOperator::new("凯尔希", "医疗"));
    let mut repo = SqliteOperatorRepository::new(&mut conn);

    let taken = OperatorPatch {
        name: Some("凯尔希".into()),
        ..OperatorPatch::default()
    };
    assert!(matches!(
        repo.update_operator(id, &taken),
        Err(StoreError::UniqueViolation(_))
    ));

    let bad_rarity = OperatorPatch {
        rarity: Some(9),
        ..OperatorPatch::default()
    };
    assert!(matches!(
        repo.update_operator(id, &bad_rarity),
        Err(StoreError::Invalid(_))
    ));

    assert!(matches!(
        repo.update_operator(9999, &OperatorPatch::default()),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));

    repo.soft_delete_operator(id).unwrap();
    assert!(matches!(
        repo.update_operator(id, &bad_rarity),
        Err(StoreError::Invalid(_))
    ));
    let faction = OperatorPatch {
        faction: Some("罗德岛".into()),
        ..OperatorPatch::default()
    };
    assert!(matches!(
        repo.update_operator(id, &faction),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));
}

#[test]
fn test_rename_follows_through_to_relations() {
    let mut conn = fresh_db();
    let id = operator_with_relation(&mut conn, "焰影苇草");

    let rename = OperatorPatch {
        name: Some("苇草".into()),
        ..OperatorPatch::default()
    };
    SqliteOperatorRepository::new(&mut conn)
        .update_operator(id, &rename)
        .unwrap();

    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert!(relations.relations_for_operator("焰影苇草").unwrap().is_empty());
    assert_eq!(relations.relations_for_operator("苇草").unwrap().len(), 1);
    assert_eq!(
        relations.operators_for_term("治疗").unwrap(),
        vec!["苇草".to_string()]
    );
}

// =============================================================================
// Deletion
// =============================================================================

fn operator_with_relation(conn: &mut Connection, name: &str) -> i64 {
    let id = create(conn, &sample_operator(name));
    let term_exists = SqliteTermRepository::new(conn)
        .find_term("治疗")
        .unwrap()
        .is_some();
    if !term_exists {
        SqliteTermRepository::new(conn)
            .insert_term(&NewTerm::new("治疗", "恢复生命值"))
            .unwrap();
    }
    SqliteTermRelationRepository::new(conn)
        .insert_relation(&TermRelation::new(name, "治疗", ModuleRef::Skill(1)))
        .unwrap();
    id
}

#[test]
fn test_hard_delete_cascades_to_every_owned_table() {
    let mut conn = fresh_db();
    let id = operator_with_relation(&mut conn, "焰影苇草");
    for (table, rows) in owned_row_counts(&conn) {
        assert!(rows > 0, "{} should have rows before delete", table);
    }

    let mut repo = SqliteOperatorRepository::new(&mut conn);
    repo.delete_operator(id).unwrap();
    assert!(matches!(
        repo.delete_operator(id),
        Err(StoreError::NotFound { .. })
    ));

    for (table, rows) in owned_row_counts(&conn) {
        assert_eq!(rows, 0, "{} kept rows after cascade", table);
    }
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM terms"), 1);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM tag_dict") as usize,
        TAG_DICT_SEED.len()
    );
}

#[test]
fn test_soft_delete_hides_and_restore_brings_back() {
    let mut conn = fresh_db();
    let id = operator_with_relation(&mut conn, "焰影苇草");
    let original = SqliteOperatorRepository::new(&mut conn)
        .load_operator_detail(id)
        .unwrap()
        .unwrap();

    {
        let mut repo = SqliteOperatorRepository::new(&mut conn);
        repo.soft_delete_operator(id).unwrap();

        assert!(repo.get_operator(id, false).unwrap().is_none());
        assert!(repo.get_operator(id, true).unwrap().unwrap().is_deleted);
        assert!(repo.load_operator_detail(id).unwrap().is_none());
        assert!(repo.find_operator_by_name("焰影苇草").unwrap().is_none());
        assert!(repo
            .list_operators(&OperatorListQuery::default())
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_operators(&OperatorListQuery {
                include_deleted: true,
                ..OperatorListQuery::default()
            })
            .unwrap()
            .len(),
            1
        );
        assert!(matches!(
            repo.soft_delete_operator(id),
            Err(StoreError::NotFound { .. })
        ));
    }

    // Rows stay, flagged
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM skill_levels WHERE is_deleted = 0"),
        0
    );
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM skill_levels"), 3);
    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert!(relations.relations_for_operator("焰影苇草").unwrap().is_empty());
    assert!(relations.operators_for_term("治疗").unwrap().is_empty());

    let mut repo = SqliteOperatorRepository::new(&mut conn);
    repo.restore_operator(id).unwrap();
    let restored = repo.load_operator_detail(id).unwrap().unwrap();
    assert_eq!(restored.attributes, original.attributes);
    assert_eq!(restored.talents, original.talents);
    assert_eq!(restored.skills, original.skills);
    assert_eq!(restored.tags, original.tags);
    assert!(!restored.operator.is_deleted);

    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert_eq!(
        relations.operators_for_term("治疗").unwrap(),
        vec!["焰影苇草".to_string()]
    );
}

#[test]
fn test_restore_keeps_relations_to_deleted_terms_hidden() {
    let mut conn = fresh_db();
    let id = operator_with_relation(&mut conn, "陈");
    SqliteTermRepository::new(&mut conn)
        .insert_term(&NewTerm::new("眩晕", "无法行动"))
        .unwrap();
    SqliteTermRelationRepository::new(&mut conn)
        .insert_relation(&TermRelation::new("陈", "眩晕", ModuleRef::Trait))
        .unwrap();

    SqliteTermRepository::new(&mut conn)
        .soft_delete_term("眩晕")
        .unwrap();
    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert_eq!(relations.relations_for_operator("陈").unwrap().len(), 1);
    assert!(relations.operators_for_term("眩晕").unwrap().is_empty());

    let mut repo = SqliteOperatorRepository::new(&mut conn);
    repo.soft_delete_operator(id).unwrap();
    repo.restore_operator(id).unwrap();

    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert_eq!(
        relations.relations_for_operator("陈").unwrap(),
        vec![TermRelation::new("陈", "治疗", ModuleRef::Skill(1))]
    );
    assert!(relations.operators_for_term("眩晕").unwrap().is_empty());
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM operator_term_relations WHERE term_name = '眩晕' AND is_deleted = 1"
        ),
        1
    );
}

#[test]
fn test_relations_for_deleted_term_hidden_even_if_row_live() {
    let mut conn = fresh_db();
    operator_with_relation(&mut conn, "陈");
    conn.execute("UPDATE terms SET is_deleted = 1 WHERE term_name = '治疗'", [])
        .unwrap();

    let relations = SqliteTermRelationRepository::new(&mut conn);
    assert!(relations.relations_for_operator("陈").unwrap().is_empty());
    assert!(relations.operators_for_term("治疗").unwrap().is_empty());
}

// =============================================================================
// Terms and Relations
// =============================================================================

#[test]
fn test_term_names_are_unique() {
    let mut conn = fresh_db();
    let repo = SqliteTermRepository::new(&mut conn);

    repo.insert_term(&NewTerm::new("眩晕", "无法行动")).unwrap();
    assert!(matches!(
        repo.insert_term(&NewTerm::new("眩晕", "重复")),
        Err(StoreError::UniqueViolation(_))
    ));
    assert!(matches!(
        repo.insert_term(&NewTerm::new(" ", "空")),
        Err(StoreError::Invalid(_))
    ));
    assert_eq!(repo.count_terms().unwrap(), 1);
}

#[test]
fn test_bulk_term_insert_is_all_or_nothing() {
    let mut conn = fresh_db();
    let mut repo = SqliteTermRepository::new(&mut conn);

    let batch = vec![
        NewTerm::new("束缚", "无法移动"),
        NewTerm::new("冻结", "无法行动"),
        NewTerm::new("束缚", "重复"),
    ];
    assert!(matches!(
        repo.insert_terms(&batch),
        Err(StoreError::UniqueViolation(_))
    ));
    assert_eq!(repo.count_terms().unwrap(), 0);

    assert_eq!(repo.insert_terms(&batch[..2]).unwrap(), 2);
    assert_eq!(repo.count_terms().unwrap(), 2);

    repo.soft_delete_term("冻结").unwrap();
    assert_eq!(repo.count_terms().unwrap(), 1);
    assert!(repo.find_term("冻结").unwrap().is_none());
    assert_eq!(repo.list_terms(true).unwrap().len(), 2);
    assert!(matches!(
        repo.soft_delete_term("冻结"),
        Err(StoreError::NotFound { entity: "term", .. })
    ));
}

#[test]
fn test_relation_rules() {
    let mut conn = fresh_db();
    operator_with_relation(&mut conn, "焰影苇草");
    SqliteTermRepository::new(&mut conn)
        .insert_term(&NewTerm::new("法术伤害", "无视防御"))
        .unwrap();

    let mut repo = SqliteTermRelationRepository::new(&mut conn);

    let duplicate = TermRelation::new("焰影苇草", "治疗", ModuleRef::Skill(1));
    assert!(matches!(
        repo.insert_relation(&duplicate),
        Err(StoreError::UniqueViolation(_))
    ));

    let unknown_term = TermRelation::new("焰影苇草", "未收录", ModuleRef::Trait);
    assert!(matches!(
        repo.insert_relation(&unknown_term),
        Err(StoreError::ForeignKeyViolation(_))
    ));

    let stray = TermRelation::new("别人", "治疗", ModuleRef::Trait);
    assert!(matches!(
        repo.replace_operator_relations("焰影苇草", &[stray]),
        Err(StoreError::Invalid(_))
    ));

    assert!(matches!(
        repo.replace_operator_relations("不存在", &[]),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));
    let unknown_operator = TermRelation::new("不存在", "治疗", ModuleRef::Trait);
    assert!(matches!(
        repo.insert_relation(&unknown_operator),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));

    let replacement = vec![
        TermRelation::new("焰影苇草", "法术伤害", ModuleRef::Trait),
        TermRelation::new("焰影苇草", "治疗", ModuleRef::Talent(1)),
    ];
    assert_eq!(
        repo.replace_operator_relations("焰影苇草", &replacement)
            .unwrap(),
        2
    );
    assert_eq!(
        repo.relations_for_operator("焰影苇草").unwrap(),
        replacement
    );
}

#[test]
fn test_relation_writes_need_a_live_operator() {
    let mut conn = fresh_db();
    let id = operator_with_relation(&mut conn, "陈");
    SqliteOperatorRepository::new(&mut conn)
        .soft_delete_operator(id)
        .unwrap();

    let mut repo = SqliteTermRelationRepository::new(&mut conn);
    let relation = TermRelation::new("陈", "治疗", ModuleRef::Trait);
    assert!(matches!(
        repo.replace_operator_relations("陈", &[relation.clone()]),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));
    assert!(matches!(
        repo.insert_relation(&relation),
        Err(StoreError::NotFound { entity: "operator", .. })
    ));

    // The flagged relation from before the delete is untouched
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM operator_term_relations WHERE operator_name = '陈' AND is_deleted = 1"
        ),
        1
    );
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM operator_term_relations"), 1);
}
