//! Storage Layer - SQLite-backed object-relational mapping
//!
//! Every storable entity type gets one table named after the bare type name:
//! - `<Type>_id INTEGER PRIMARY KEY` is always the first column
//! - the remaining columns come from the type's declared schema
//!
//! The engine keeps one ID-sorted identity cache per type and issues all SQL
//! through a single lazily-opened connection.

pub mod cache;
pub mod connection;
pub mod data;
pub mod engine;
pub mod sql;
pub mod storable;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheRegistry, TypeCache};
pub use connection::{Database, DatabaseConfig, DatabaseLocation};
pub use data::{
    type_to_string, visit_row_data, ColumnProperties, Constraint, Data, DataType, Row, RowValue,
    RowVisitor, TIMESTAMP_FORMAT,
};
pub use engine::EntityStore;
pub use storable::{id_column, table_name, Columns, Storable};
