//! SQLite storage for Arknights operator reference data.
//!
//! The schema is declared once as static [`schema::TableSchema`] values and
//! turned into DDL by [`writer`]. Connections from [`db`] come with the schema
//! applied; the [`repo`] traits do all reads and writes on top of them.

pub mod cli;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod writer;

pub use cli::{Cli, Commands};
pub use db::{open_db, open_db_in_memory, StoreError, StoreResult};
