use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::model::ModuleError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store. Constraint failures reported by SQLite are
/// classified by their extended result code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("check constraint violated: {0}")]
    CheckViolation(String),
    #[error("not null constraint violated: {0}")]
    NotNullViolation(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error(transparent)]
    InvalidModule(#[from] ModuleError),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for any of the engine-reported constraint classes
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::UniqueViolation(_)
                | StoreError::ForeignKeyViolation(_)
                | StoreError::CheckViolation(_)
                | StoreError::NotNullViolation(_)
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let constraint = match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_else(|| failure.to_string());
                Some((failure.extended_code, message))
            }
            _ => None,
        };
        let Some((code, message)) = constraint else {
            return StoreError::Sqlite(err);
        };

        match code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                StoreError::UniqueViolation(message)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ForeignKeyViolation(message),
            ffi::SQLITE_CONSTRAINT_CHECK => StoreError::CheckViolation(message),
            ffi::SQLITE_CONSTRAINT_NOTNULL => StoreError::NotNullViolation(message),
            _ => StoreError::Sqlite(err),
        }
    }
}
