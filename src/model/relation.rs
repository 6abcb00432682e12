//! Term-to-operator association, keyed by natural names.
//!
//! The (kind, index) legality rule lives here as well as in the table's
//! CHECK constraint: trait pairs with 0, talent with 1-2, skill with 1-3.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("unknown relation type `{0}`; expected trait|talent|skill")]
    UnknownKind(String),
    #[error("module index {index} is not valid for relation type `{kind}`")]
    IndexOutOfRange { kind: RelationKind, index: i64 },
}

/// Which part of an operator's page a term appears in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Trait,
    Talent,
    Skill,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Trait => "trait",
            RelationKind::Talent => "talent",
            RelationKind::Skill => "skill",
        }
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trait" => Ok(RelationKind::Trait),
            "talent" => Ok(RelationKind::Talent),
            "skill" => Ok(RelationKind::Skill),
            other => Err(ModuleError::UnknownKind(other.to_string())),
        }
    }
}

/// A legal (kind, index) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ModuleParts", into = "ModuleParts")]
pub enum ModuleRef {
    Trait,
    Talent(u8),
    Skill(u8),
}

impl ModuleRef {
    /// Validates a raw pair as stored in `relation_type`/`module_index`
    pub fn from_parts(kind: &str, index: i64) -> Result<Self, ModuleError> {
        Self::new(kind.parse()?, index)
    }

    pub fn new(kind: RelationKind, index: i64) -> Result<Self, ModuleError> {
        let module = match (kind, index) {
            (RelationKind::Trait, 0) => ModuleRef::Trait,
            (RelationKind::Talent, 1..=2) => ModuleRef::Talent(index as u8),
            (RelationKind::Skill, 1..=3) => ModuleRef::Skill(index as u8),
            _ => return Err(ModuleError::IndexOutOfRange { kind, index }),
        };
        Ok(module)
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            ModuleRef::Trait => RelationKind::Trait,
            ModuleRef::Talent(_) => RelationKind::Talent,
            ModuleRef::Skill(_) => RelationKind::Skill,
        }
    }

    pub fn index(&self) -> i64 {
        match self {
            ModuleRef::Trait => 0,
            ModuleRef::Talent(n) | ModuleRef::Skill(n) => i64::from(*n),
        }
    }
}

/// Wire form of `ModuleRef`, so deserialized values are always validated
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleParts {
    relation_type: RelationKind,
    module_index: i64,
}

impl TryFrom<ModuleParts> for ModuleRef {
    type Error = ModuleError;

    fn try_from(parts: ModuleParts) -> Result<Self, Self::Error> {
        ModuleRef::new(parts.relation_type, parts.module_index)
    }
}

impl From<ModuleRef> for ModuleParts {
    fn from(module: ModuleRef) -> Self {
        ModuleParts {
            relation_type: module.kind(),
            module_index: module.index(),
        }
    }
}

/// "Term `term_name` appears in `module` of operator `operator_name`"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRelation {
    pub operator_name: String,
    pub term_name: String,
    pub module: ModuleRef,
}

impl TermRelation {
    pub fn new(
        operator_name: impl Into<String>,
        term_name: impl Into<String>,
        module: ModuleRef,
    ) -> Self {
        Self {
            operator_name: operator_name.into(),
            term_name: term_name.into(),
            module,
        }
    }
}
