//! SQLite connection bootstrap.
//!
//! Every connection handed out by this module has `foreign_keys=ON` (the
//! cascades depend on it) and a fully applied schema. A database whose
//! `PRAGMA user_version` is 0 is treated as empty and gets the schema and
//! tag seed applied in one transaction.

mod error;
mod open;

pub use error::{StoreError, StoreResult};
pub use open::{open_db, open_db_in_memory, schema_version};

/// Version written to `PRAGMA user_version` once the schema is applied
pub const SCHEMA_VERSION: u32 = 1;
