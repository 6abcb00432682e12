use serde::Serialize;
use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Text,
    /// Stored as INTEGER 0/1
    Boolean,
    /// Server-assigned `YYYY-MM-DD HH:MM:SS.SSS` text
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "INTEGER",
            ColumnType::Timestamp => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Raw SQL default expression
    pub default: Option<&'static str>,
    /// Human-readable description, emitted as a SQL comment
    pub comment: &'static str,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            default: None,
            comment: "",
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            default: None,
            comment: "",
        }
    }

    pub const fn default(self, expr: &'static str) -> Self {
        Self {
            default: Some(expr),
            ..self
        }
    }

    pub const fn comment(self, comment: &'static str) -> Self {
        Self { comment, ..self }
    }

    pub fn is_primary_key(&self) -> bool {
        self.name == "id"
    }
}

/// Columns every table carries after its own columns
pub static AUDIT_COLUMNS: &[Column] = &[
    Column::required("is_deleted", ColumnType::Boolean)
        .default("0")
        .comment("soft-delete flag: 0 live, 1 logically removed"),
    Column::required("created_at", ColumnType::Timestamp)
        .default("(strftime('%Y-%m-%d %H:%M:%f', 'now'))")
        .comment("row creation time"),
    Column::required("updated_at", ColumnType::Timestamp)
        .default("(strftime('%Y-%m-%d %H:%M:%f', 'now'))")
        .comment("last update time, refreshed by trigger"),
];

/// Foreign key reference. Every reference cascades on delete.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    /// Reference to the parent's surrogate `id`
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: "id",
        }
    }

    /// Reference to a natural key (a unique column other than `id`)
    pub const fn natural(
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
    ) -> Self {
        Self {
            column,
            references_table,
            references_column,
        }
    }

    pub fn is_natural_key(&self) -> bool {
        self.references_column != "id"
    }
}

/// Index definition
#[derive(Debug, Clone, Serialize)]
pub struct Index {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    /// Create a non-unique index
    pub const fn on(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: false,
        }
    }

    /// Create a unique index
    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: true,
        }
    }

    /// Index name: `uk_` prefix for unique, `idx_` otherwise
    pub fn name(&self, table: &str) -> String {
        let prefix = if self.unique { "uk" } else { "idx" };
        format!("{}_{}_{}", prefix, table, self.columns.join("_"))
    }
}

/// Named CHECK constraint
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub expr: &'static str,
}

impl Check {
    pub const fn new(name: &'static str, expr: &'static str) -> Self {
        Self { name, expr }
    }
}

/// Table schema definition
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: &'static str,
    pub comment: &'static str,
    /// Own columns; `AUDIT_COLUMNS` are appended on generation
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    pub indexes: &'static [Index],
    pub checks: &'static [Check],
    /// Tables whose rows are owned by this table's rows
    pub child_tables: &'static [&'static str],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    /// Own columns followed by the audit columns
    pub fn all_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().chain(AUDIT_COLUMNS.iter())
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.all_columns().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_names() {
        assert_eq!(
            Index::unique(&["operator_id", "tag_id"]).name("operator_tags"),
            "uk_operator_tags_operator_id_tag_id"
        );
        assert_eq!(
            Index::on(&["operator_id"]).name("operator_skills"),
            "idx_operator_skills_operator_id"
        );
    }

    #[test]
    fn test_natural_key_detection() {
        assert!(!ForeignKey::new("operator_id", "operators").is_natural_key());
        assert!(ForeignKey::natural("operator_name", "operators", "name").is_natural_key());
    }
}
