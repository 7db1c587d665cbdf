//! Database module
//!
//! Handles SQLite connection, migrations, and the record store used by the
//! estimation batch.

pub mod connection;
pub mod migrations;
mod store;

pub use connection::{Database, DbError, DbResult};
