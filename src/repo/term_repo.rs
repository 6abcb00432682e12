use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::{StoreError, StoreResult};
use crate::model::{NewTerm, Term};

/// Glossary terms, unique by name
pub trait TermRepository {
    /// Inserts one term. A taken name is a `UniqueViolation`.
    fn insert_term(&self, term: &NewTerm) -> StoreResult<i64>;
    /// Inserts all terms or none
    fn insert_terms(&mut self, terms: &[NewTerm]) -> StoreResult<usize>;
    /// Number of live terms
    fn count_terms(&self) -> StoreResult<u64>;
    fn find_term(&self, term_name: &str) -> StoreResult<Option<Term>>;
    fn list_terms(&self, include_deleted: bool) -> StoreResult<Vec<Term>>;
    /// Flags the term and the relations pointing at it
    fn soft_delete_term(&mut self, term_name: &str) -> StoreResult<()>;
}

pub struct SqliteTermRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn insert_term(&self, term: &NewTerm) -> StoreResult<i64> {
        insert_one(self.conn, term)
    }

    fn insert_terms(&mut self, terms: &[NewTerm]) -> StoreResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for term in terms {
            insert_one(&tx, term)?;
        }
        tx.commit()?;

        info!("event=terms_insert module=repo status=ok rows={}", terms.len());
        Ok(terms.len())
    }

    fn count_terms(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM terms WHERE is_deleted = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_term(&self, term_name: &str) -> StoreResult<Option<Term>> {
        let term = self
            .conn
            .query_row(
                "SELECT id, term_name, term_explanation, is_deleted
                 FROM terms
                 WHERE term_name = ?1 AND is_deleted = 0",
                [term_name.trim()],
                parse_term_row,
            )
            .optional()?;
        Ok(term)
    }

    fn list_terms(&self, include_deleted: bool) -> StoreResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, term_name, term_explanation, is_deleted
             FROM terms
             WHERE ?1 = 1 OR is_deleted = 0
             ORDER BY id",
        )?;
        let terms = stmt
            .query_map([i64::from(include_deleted)], parse_term_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }

    fn soft_delete_term(&mut self, term_name: &str) -> StoreResult<()> {
        let term_name = term_name.trim();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE terms SET is_deleted = 1 WHERE term_name = ?1 AND is_deleted = 0",
            [term_name],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("term", term_name));
        }
        tx.execute(
            "UPDATE operator_term_relations SET is_deleted = 1 WHERE term_name = ?1",
            [term_name],
        )?;
        tx.commit()?;

        info!("event=term_soft_delete module=repo status=ok term={}", term_name);
        Ok(())
    }
}

fn insert_one(conn: &Connection, term: &NewTerm) -> StoreResult<i64> {
    let term_name = term.term_name.trim();
    if term_name.is_empty() {
        return Err(StoreError::Invalid("term name cannot be empty".to_string()));
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO terms (term_name, term_explanation) VALUES (?1, ?2)",
    )?;
    let id = stmt.insert(params![term_name, term.term_explanation])?;
    Ok(id)
}

fn parse_term_row(row: &Row<'_>) -> rusqlite::Result<Term> {
    Ok(Term {
        id: row.get(0)?,
        term_name: row.get(1)?,
        term_explanation: row.get(2)?,
        is_deleted: row.get(3)?,
    })
}
