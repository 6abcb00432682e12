use crate::schema::{TableSchema, TAG_DICT, TAG_DICT_SEED};

/// Millisecond-precision server timestamp expression
pub const TIMESTAMP_NOW: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    // (definition, trailing comment)
    let mut lines: Vec<(String, &str)> = Vec::new();

    for col in schema.all_columns() {
        let mut def = format!("    {} {}", col.name, col.col_type.sql_type());
        if col.is_primary_key() {
            def.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if !col.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = col.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }
        lines.push((def, col.comment));
    }

    for fk in schema.foreign_keys {
        let on_update = if fk.is_natural_key() {
            " ON UPDATE CASCADE"
        } else {
            ""
        };
        lines.push((
            format!(
                "    FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE{}",
                fk.column, fk.references_table, fk.references_column, on_update
            ),
            "",
        ));
    }

    for check in schema.checks {
        lines.push((
            format!("    CONSTRAINT {} CHECK ({})", check.name, check.expr),
            "",
        ));
    }

    let mut sql = String::new();
    if !schema.comment.is_empty() {
        sql.push_str(&format!("-- {}: {}\n", schema.name, schema.comment));
    }
    sql.push_str(&format!("CREATE TABLE {} (\n", schema.name));

    let last = lines.len().saturating_sub(1);
    for (i, (def, comment)) in lines.iter().enumerate() {
        sql.push_str(def);
        if i != last {
            sql.push(',');
        }
        if !comment.is_empty() {
            sql.push_str(" -- ");
            sql.push_str(comment);
        }
        sql.push('\n');
    }
    sql.push_str(");");

    sql
}

/// Generate CREATE INDEX statements for the declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let unique = if index.unique { "UNIQUE " } else { "" };
            format!(
                "CREATE {}INDEX {} ON {}({});",
                unique,
                index.name(schema.name),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

/// Trigger that refreshes `updated_at` unless the update set it explicitly
pub fn generate_update_trigger(schema: &TableSchema) -> String {
    format!(
        "CREATE TRIGGER trg_{table}_updated_at\n\
         AFTER UPDATE ON {table}\n\
         FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at\n\
         BEGIN\n    \
             UPDATE {table} SET updated_at = {now} WHERE id = NEW.id;\n\
         END;",
        table = schema.name,
        now = TIMESTAMP_NOW,
    )
}

pub fn generate_drop_table(schema: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {};", schema.name)
}

/// Idempotent seed of the tag dictionary as a literal statement
pub fn generate_seed_insert() -> String {
    let values: Vec<String> = TAG_DICT_SEED
        .iter()
        .map(|tag| format!("    ('{}')", tag.replace('\'', "''")))
        .collect();

    format!(
        "INSERT OR IGNORE INTO {} (tag_name) VALUES\n{};",
        TAG_DICT.name,
        values.join(",\n")
    )
}

/// What goes into a generated script besides the CREATE statements
#[derive(Debug, Clone, Copy)]
pub struct ScriptOptions {
    pub drop_existing: bool,
    pub with_seed: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            drop_existing: true,
            with_seed: true,
        }
    }
}

/// Full script: drops in reverse order, then creates, indexes and triggers
/// in dependency order. `tables` must already be dependency-ordered.
pub fn generate_schema_script(tables: &[&TableSchema], options: ScriptOptions) -> String {
    let mut parts: Vec<String> = Vec::new();

    if options.drop_existing {
        for schema in tables.iter().rev() {
            parts.push(generate_drop_table(schema));
        }
    }

    for schema in tables {
        let mut block = generate_create_table(schema);
        for index_sql in generate_indexes(schema) {
            block.push('\n');
            block.push_str(&index_sql);
        }
        block.push('\n');
        block.push_str(&generate_update_trigger(schema));
        parts.push(block);
    }

    if options.with_seed && tables.iter().any(|t| t.name == TAG_DICT.name) {
        parts.push(generate_seed_insert());
    }

    parts.join("\n\n") + "\n"
}
