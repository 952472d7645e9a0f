//! Database layer (SQLite via sqlx).

pub mod schema;
pub mod sqlite;

pub use sqlite::UserDb;
