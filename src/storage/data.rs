//! Data model - schemas and rows exchanged between entities and the engine
//!
//! A `Data` value carries a table name, an ordered schema of
//! `ColumnProperties`, and rows of `RowValue`s positionally aligned with that
//! schema. Entities produce one row on write; the engine produces many on a
//! bulk read.

use crate::{Error, Result};
use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Text layout used for timestamps stored in TEXT columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQLite column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Real,
    Integer,
    Text,
    Null,
    Blob,
}

impl DataType {
    /// SQL keyword for this column type
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Real => "REAL",
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Null => "NULL",
            DataType::Blob => "BLOB",
        }
    }

    pub fn all() -> &'static [DataType] {
        &[
            DataType::Real,
            DataType::Integer,
            DataType::Text,
            DataType::Null,
            DataType::Blob,
        ]
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "REAL" | "FLOAT" | "DOUBLE" => Ok(DataType::Real),
            "INTEGER" | "INT" | "BIGINT" => Ok(DataType::Integer),
            "TEXT" | "VARCHAR" => Ok(DataType::Text),
            "NULL" => Ok(DataType::Null),
            "BLOB" => Ok(DataType::Blob),
            _ => Err(Error::Decode {
                column: String::new(),
                reason: format!("Unknown data type: {}", s),
            }),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column constraints understood by table creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constraint {
    PrimaryKey,
    Unique,
    NotNull,
    Check,
}

impl Constraint {
    /// SQL keyword(s) for this constraint
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::PrimaryKey => "PRIMARY KEY",
            Constraint::Unique => "UNIQUE",
            Constraint::NotNull => "NOT NULL",
            Constraint::Check => "CHECK",
        }
    }

    pub fn all() -> &'static [Constraint] {
        &[
            Constraint::PrimaryKey,
            Constraint::Unique,
            Constraint::NotNull,
            Constraint::Check,
        ]
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProperties {
    pub name: String,
    pub data_type: DataType,
    pub constraint: Constraint,
}

impl ColumnProperties {
    pub fn new(name: impl Into<String>, data_type: DataType, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraint,
        }
    }

    /// The synthetic `INTEGER PRIMARY KEY` identity column
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Integer, Constraint::PrimaryKey)
    }

    /// A `NOT NULL` column, the common case for entity fields
    pub fn not_null(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, Constraint::NotNull)
    }

    /// Column definition as it appears inside `CREATE TABLE`
    pub fn definition(&self) -> String {
        format!("{} {} {}", self.name, self.data_type, self.constraint)
    }
}

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowValue {
    Text(String),
    Real(f64),
    Int(i32),
    BigInt(i64),
    UInt(u64),
    Timestamp(NaiveDateTime),
}

impl RowValue {
    /// Name of the active variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            RowValue::Text(_) => "text",
            RowValue::Real(_) => "real",
            RowValue::Int(_) => "int",
            RowValue::BigInt(_) => "bigint",
            RowValue::UInt(_) => "uint",
            RowValue::Timestamp(_) => "timestamp",
        }
    }

    /// Decode a fetched SQLite value.
    ///
    /// SQLite reports one of five storage classes per cell. NULL and BLOB have
    /// no counterpart in `RowValue` and are rejected rather than defaulted.
    /// Integers that fit in 32 bits come back as `Int`, wider ones as `BigInt`.
    pub fn from_sql_ref(column: &str, value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Integer(i) => Ok(match i32::try_from(i) {
                Ok(small) => RowValue::Int(small),
                Err(_) => RowValue::BigInt(i),
            }),
            ValueRef::Real(f) => Ok(RowValue::Real(f)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| RowValue::Text(s.to_string()))
                .map_err(|e| Error::Decode {
                    column: column.to_string(),
                    reason: format!("invalid UTF-8 text: {}", e),
                }),
            ValueRef::Null => Err(Error::UnsupportedValue {
                column: column.to_string(),
                kind: "NULL",
            }),
            ValueRef::Blob(_) => Err(Error::UnsupportedValue {
                column: column.to_string(),
                kind: "BLOB",
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RowValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Floating-point view; integer variants convert
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RowValue::Real(f) => Some(*f),
            RowValue::Int(i) => Some(f64::from(*i)),
            RowValue::BigInt(i) => Some(*i as f64),
            RowValue::UInt(u) => Some(*u as f64),
            RowValue::Text(_) | RowValue::Timestamp(_) => None,
        }
    }

    /// Signed 64-bit view; only lossless conversions succeed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RowValue::Int(i) => Some(i64::from(*i)),
            RowValue::BigInt(i) => Some(*i),
            RowValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|i| i32::try_from(i).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RowValue::UInt(u) => Some(*u),
            RowValue::Int(i) => u64::try_from(*i).ok(),
            RowValue::BigInt(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Timestamp view; TEXT written with `TIMESTAMP_FORMAT` parses back
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValue::Timestamp(ts) => Some(*ts),
            RowValue::Text(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok(),
            _ => None,
        }
    }
}

impl From<String> for RowValue {
    fn from(value: String) -> Self {
        RowValue::Text(value)
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::Text(value.to_string())
    }
}

impl From<f64> for RowValue {
    fn from(value: f64) -> Self {
        RowValue::Real(value)
    }
}

impl From<i32> for RowValue {
    fn from(value: i32) -> Self {
        RowValue::Int(value)
    }
}

impl From<i64> for RowValue {
    fn from(value: i64) -> Self {
        RowValue::BigInt(value)
    }
}

impl From<u64> for RowValue {
    fn from(value: u64) -> Self {
        RowValue::UInt(value)
    }
}

impl From<NaiveDateTime> for RowValue {
    fn from(value: NaiveDateTime) -> Self {
        RowValue::Timestamp(value)
    }
}

/// Handler with one method per `RowValue` variant.
pub trait RowVisitor {
    type Output;

    fn visit_text(&mut self, value: &str) -> Self::Output;
    fn visit_real(&mut self, value: f64) -> Self::Output;
    fn visit_int(&mut self, value: i32) -> Self::Output;
    fn visit_big_int(&mut self, value: i64) -> Self::Output;
    fn visit_uint(&mut self, value: u64) -> Self::Output;
    fn visit_timestamp(&mut self, value: &NaiveDateTime) -> Self::Output;
}

/// Dispatch `value` to the visitor method for its active variant.
pub fn visit_row_data<V: RowVisitor>(visitor: &mut V, value: &RowValue) -> V::Output {
    match value {
        RowValue::Text(s) => visitor.visit_text(s),
        RowValue::Real(f) => visitor.visit_real(*f),
        RowValue::Int(i) => visitor.visit_int(*i),
        RowValue::BigInt(i) => visitor.visit_big_int(*i),
        RowValue::UInt(u) => visitor.visit_uint(*u),
        RowValue::Timestamp(ts) => visitor.visit_timestamp(ts),
    }
}

/// An ordered sequence of values aligned with a schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<RowValue>,
}

impl Row {
    pub fn new(values: Vec<RowValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<RowValue> for Row {
    fn from_iter<I: IntoIterator<Item = RowValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Table name, schema, and rows moving between an entity and the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Data {
    pub table_name: String,
    pub schema: Vec<ColumnProperties>,
    pub rows: Vec<Row>,
}

impl Data {
    /// Position of a column within the schema
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == name)
    }
}

/// Bare type name with the module path and generic arguments stripped.
///
/// `tracker::food::Food` becomes `Food`. This is the table name for `T`.
pub fn type_to_string<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
