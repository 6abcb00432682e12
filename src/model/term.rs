use serde::{Deserialize, Serialize};

/// A persisted glossary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub id: i64,
    pub term_name: String,
    pub term_explanation: Option<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerm {
    pub term_name: String,
    #[serde(default)]
    pub term_explanation: Option<String>,
}

impl NewTerm {
    pub fn new(term_name: impl Into<String>, term_explanation: impl Into<String>) -> Self {
        Self {
            term_name: term_name.into(),
            term_explanation: Some(term_explanation.into()),
        }
    }
}

/// A tag dictionary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub tag_name: String,
}
