//! # Tracker - storable entities on SQLite
//!
//! Generic object-relational mapping for the nutrition tracker.
//!
//! Tracker provides:
//! - A data model of schemas (column name, type, constraint) and rows of tagged scalar values
//! - The `Storable` contract any persisted entity implements
//! - A mapping engine with per-type identity caches and gap-filling ID allocation
//! - A single lazily-opened SQLite connection shared by every entity type

pub mod storage;
pub mod food;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use storage::{
    ColumnProperties, Constraint, Data, DataType, Database, DatabaseConfig, EntityStore, Row,
    RowValue, Storable,
};
pub use food::{Food, Macronutrients};

/// Result type alias for Tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tracker operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open database at {path}: {source}")]
    Connection {
        path: String,
        source: rusqlite::Error,
    },

    #[error("{context}: {source} (sql: {sql})")]
    Statement {
        context: &'static str,
        sql: String,
        source: rusqlite::Error,
    },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Unsupported {kind} value in column {column}")]
    UnsupportedValue { column: String, kind: &'static str },

    #[error("Column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("Schema mismatch for table {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
