//! Operator aggregate: the root row and everything it owns.

use serde::{Deserialize, Serialize};

/// Surrogate id of an `operators` row
pub type OperatorId = i64;

/// Highest skill slot an operator can have
pub const MAX_SKILL_NUMBER: u8 = 3;

/// A persisted operator row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub rarity: Option<i64>,
    pub profession: String,
    pub branch: Option<String>,
    pub faction: Option<String>,
    pub gender: Option<String>,
    pub position: Option<String>,
    pub branch_description: Option<String>,
    pub trait_details: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Stat block at one elite/level checkpoint.
/// `None` stands for values that are not plain numbers (e.g. `∞`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCheckpoint {
    pub elite_level: String,
    #[serde(default)]
    pub max_hp: Option<i64>,
    #[serde(default)]
    pub atk: Option<i64>,
    #[serde(default)]
    pub def: Option<i64>,
    #[serde(default)]
    pub res: Option<i64>,
}

/// Deployment-related stats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraAttributes {
    pub redeployment_time: Option<String>,
    pub initial_deployment_cost: Option<i64>,
    pub attack_interval: Option<String>,
    pub block_count: Option<i64>,
    pub hidden_faction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalentDetail {
    pub trigger_condition: Option<String>,
    pub description: Option<String>,
    pub potential_enhancement: Option<String>,
}

/// A passive ability slot with its effect rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talent {
    pub talent_type: String,
    pub talent_name: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub details: Vec<TalentDetail>,
}

/// Skill numbers at one level or mastery tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub level: String,
    #[serde(default)]
    pub initial_sp: Option<i64>,
    #[serde(default)]
    pub sp_cost: Option<i64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An active skill slot (1-3) with its level rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub skill_number: u8,
    pub skill_name: String,
    #[serde(default)]
    pub skill_type: Option<String>,
    #[serde(default)]
    pub unlock_condition: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub levels: Vec<SkillLevel>,
}

/// Input for creating an operator together with everything it owns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    pub name: String,
    #[serde(default)]
    pub rarity: Option<i64>,
    pub profession: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub faction: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub branch_description: Option<String>,
    #[serde(default)]
    pub trait_details: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeCheckpoint>,
    #[serde(default)]
    pub extra: Option<ExtraAttributes>,
    #[serde(default)]
    pub talents: Vec<Talent>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Names from the tag dictionary
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewOperator {
    pub fn new(name: impl Into<String>, profession: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profession: profession.into(),
            ..Self::default()
        }
    }

    /// Checks what can be checked before touching the database
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("operator name cannot be empty".to_string());
        }
        if self.profession.trim().is_empty() {
            return Err(format!("operator `{}` has no profession", self.name));
        }
        if let Some(rarity) = self.rarity {
            if !(1..=6).contains(&rarity) {
                return Err(format!("rarity {} out of range 1-6", rarity));
            }
        }
        validate_skills(&self.skills)
    }
}

pub(crate) fn validate_skills(skills: &[Skill]) -> Result<(), String> {
    for skill in skills {
        if !(1..=MAX_SKILL_NUMBER).contains(&skill.skill_number) {
            return Err(format!(
                "skill number {} out of range 1-{}",
                skill.skill_number, MAX_SKILL_NUMBER
            ));
        }
    }
    Ok(())
}

/// Changes to an operator's own row. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorPatch {
    /// Renaming follows through to term relations
    pub name: Option<String>,
    pub rarity: Option<i64>,
    pub profession: Option<String>,
    pub branch: Option<String>,
    pub faction: Option<String>,
    pub gender: Option<String>,
    pub position: Option<String>,
    pub branch_description: Option<String>,
    pub trait_details: Option<String>,
}

impl OperatorPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err("operator name cannot be empty".to_string());
        }
        if matches!(&self.profession, Some(p) if p.trim().is_empty()) {
            return Err("profession cannot be empty".to_string());
        }
        if let Some(rarity) = self.rarity {
            if !(1..=6).contains(&rarity) {
                return Err(format!("rarity {} out of range 1-6", rarity));
            }
        }
        Ok(())
    }
}

/// Full read model of one operator, soft-deleted children excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorDetail {
    pub operator: Operator,
    pub attributes: Vec<AttributeCheckpoint>,
    pub extra: Option<ExtraAttributes>,
    pub talents: Vec<Talent>,
    pub skills: Vec<Skill>,
    pub tags: Vec<String>,
}

/// Parses a scraped stat cell. Anything that is not a plain integer
/// (`∞`, `-`, empty) becomes `None`.
pub fn parse_stat(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Source lists carry 0-based rarity; stored rarity is 1-6 stars
pub fn normalize_rarity(raw: &str) -> Option<i64> {
    let zero_based = raw.trim().parse::<i64>().ok()?;
    let stars = zero_based + 1;
    (1..=6).contains(&stars).then_some(stars)
}
