//! The contract every persisted entity implements

use crate::storage::data::{type_to_string, ColumnProperties, Data, Row, RowValue};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// An entity the engine can map onto its own table.
///
/// The table is named after the bare type name and its first column is the
/// identity column `<Type>_id`. Implementors keep their ID private and never
/// renumber themselves; the engine assigns it once at creation.
pub trait Storable: Sized + std::fmt::Display + 'static {
    /// Declared columns in row order, identity column first
    fn schema() -> Vec<ColumnProperties>;

    /// Current state as one row aligned with `schema()`
    fn row(&self) -> Row;

    /// Rebuild an entity from a fetched row
    fn from_row(schema: &[ColumnProperties], row: &Row) -> Result<Self>;

    fn id(&self) -> i64;

    /// Table name, schema, and the entity's own row
    fn get_data(&self) -> Data {
        Data {
            table_name: table_name::<Self>().to_string(),
            schema: Self::schema(),
            rows: vec![self.row()],
        }
    }
}

/// Table backing `T`
pub fn table_name<T: Storable>() -> &'static str {
    type_to_string::<T>()
}

/// Identity column of `T`'s table, `<Table>_id`
pub fn id_column<T: Storable>() -> String {
    format!("{}_id", table_name::<T>())
}

/// A row keyed by column name.
///
/// Lets `Storable::from_row` pick values by name regardless of the column
/// order the database returned.
#[derive(Debug)]
pub struct Columns<'a> {
    values: HashMap<&'a str, &'a RowValue>,
}

impl<'a> Columns<'a> {
    pub fn zip(schema: &'a [ColumnProperties], row: &'a Row) -> Result<Self> {
        if schema.len() != row.len() {
            return Err(Error::Decode {
                column: String::new(),
                reason: format!(
                    "row has {} values but schema has {} columns",
                    row.len(),
                    schema.len()
                ),
            });
        }

        let values = schema
            .iter()
            .map(|column| column.name.as_str())
            .zip(row.values.iter())
            .collect();
        Ok(Self { values })
    }

    pub fn get(&self, column: &str) -> Result<&'a RowValue> {
        self.values.get(column).copied().ok_or_else(|| Error::Decode {
            column: column.to_string(),
            reason: "missing column".to_string(),
        })
    }

    pub fn text(&self, column: &str) -> Result<String> {
        let value = self.get(column)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }

    pub fn real(&self, column: &str) -> Result<f64> {
        let value = self.get(column)?;
        value.as_f64().ok_or_else(|| mismatch(column, "real", value))
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        let value = self.get(column)?;
        value.as_i64().ok_or_else(|| mismatch(column, "integer", value))
    }

    pub fn int(&self, column: &str) -> Result<i32> {
        let value = self.get(column)?;
        value.as_i32().ok_or_else(|| mismatch(column, "32-bit integer", value))
    }

    pub fn unsigned(&self, column: &str) -> Result<u64> {
        let value = self.get(column)?;
        value.as_u64().ok_or_else(|| mismatch(column, "unsigned integer", value))
    }

    pub fn timestamp(&self, column: &str) -> Result<NaiveDateTime> {
        let value = self.get(column)?;
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(column, "timestamp", value))
    }
}

fn mismatch(column: &str, expected: &str, found: &RowValue) -> Error {
    Error::Decode {
        column: column.to_string(),
        reason: format!("expected {}, found {}", expected, found.kind()),
    }
}
