//! SQL text generation
//!
//! Every statement the engine issues is built here from a table name, a
//! schema, and a row. Values are rendered as SQL literals through
//! `visit_row_data`.

use crate::storage::data::{visit_row_data, ColumnProperties, Row, RowValue, RowVisitor, TIMESTAMP_FORMAT};
use crate::{Error, Result};
use chrono::NaiveDateTime;

/// Renders a `RowValue` as a SQL literal
pub struct SqlLiteral;

impl RowVisitor for SqlLiteral {
    type Output = String;

    fn visit_text(&mut self, value: &str) -> String {
        quote(value)
    }

    fn visit_real(&mut self, value: f64) -> String {
        // SQLite has no literal for NaN or infinity
        if value.is_finite() {
            format!("{:?}", value)
        } else {
            "NULL".to_string()
        }
    }

    fn visit_int(&mut self, value: i32) -> String {
        value.to_string()
    }

    fn visit_big_int(&mut self, value: i64) -> String {
        value.to_string()
    }

    fn visit_uint(&mut self, value: u64) -> String {
        value.to_string()
    }

    fn visit_timestamp(&mut self, value: &NaiveDateTime) -> String {
        quote(&value.format(TIMESTAMP_FORMAT).to_string())
    }
}

/// Single-quote a string, doubling embedded quotes
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn literal(value: &RowValue) -> String {
    visit_row_data(&mut SqlLiteral, value)
}

fn check_alignment(table: &str, schema: &[ColumnProperties], row: &Row) -> Result<()> {
    if schema.len() != row.len() {
        return Err(Error::SchemaMismatch {
            table: table.to_string(),
            reason: format!(
                "row has {} values but schema has {} columns",
                row.len(),
                schema.len()
            ),
        });
    }
    Ok(())
}

/// SQLite integers are signed 64-bit; larger unsigned values would be stored
/// as REAL and never read back as `UInt`.
fn check_values(schema: &[ColumnProperties], row: &Row) -> Result<()> {
    for (column, value) in schema.iter().zip(&row.values) {
        if let RowValue::UInt(u) = value {
            if i64::try_from(*u).is_err() {
                return Err(Error::UnsupportedValue {
                    column: column.name.clone(),
                    kind: "out-of-range UINT",
                });
            }
        }
    }
    Ok(())
}

pub fn create_table(table: &str, schema: &[ColumnProperties]) -> String {
    let columns: Vec<String> = schema.iter().map(ColumnProperties::definition).collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({});", table, columns.join(", "))
}

pub fn insert(table: &str, schema: &[ColumnProperties], row: &Row) -> Result<String> {
    check_alignment(table, schema, row)?;
    check_values(schema, row)?;
    let names: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
    let values: Vec<String> = row.values.iter().map(literal).collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        names.join(", "),
        values.join(", ")
    ))
}

/// `UPDATE` every column except the identity column
pub fn update(
    table: &str,
    id_column: &str,
    schema: &[ColumnProperties],
    row: &Row,
    id: i64,
) -> Result<String> {
    check_alignment(table, schema, row)?;
    check_values(schema, row)?;
    let assignments: Vec<String> = schema
        .iter()
        .zip(row.values.iter())
        .filter(|(column, _)| column.name != id_column)
        .map(|(column, value)| format!("{} = {}", column.name, literal(value)))
        .collect();

    if assignments.is_empty() {
        return Err(Error::SchemaMismatch {
            table: table.to_string(),
            reason: "no columns to update besides the identity column".to_string(),
        });
    }

    Ok(format!(
        "UPDATE {} SET {} WHERE {} = {};",
        table,
        assignments.join(", "),
        id_column,
        id
    ))
}

pub fn delete(table: &str, id_column: &str, id: i64) -> String {
    format!("DELETE FROM {} WHERE {} = {};", table, id_column, id)
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {};", table)
}

pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {};", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::data::DataType;
    use chrono::NaiveDate;

    fn schema() -> Vec<ColumnProperties> {
        vec![
            ColumnProperties::primary_key("Food_id"),
            ColumnProperties::not_null("name", DataType::Text),
            ColumnProperties::not_null("fat", DataType::Real),
        ]
    }

    fn row() -> Row {
        Row::new(vec![RowValue::Int(3), RowValue::from("taco"), RowValue::Real(10.0)])
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            create_table("Food", &schema()),
            "CREATE TABLE IF NOT EXISTS Food (Food_id INTEGER PRIMARY KEY, name TEXT NOT NULL, fat REAL NOT NULL);"
        );
    }

    #[test]
    fn test_insert() {
        assert_eq!(
            insert("Food", &schema(), &row()).unwrap(),
            "INSERT INTO Food (Food_id, name, fat) VALUES (3, 'taco', 10.0);"
        );
    }

    #[test]
    fn test_update_skips_identity() {
        assert_eq!(
            update("Food", "Food_id", &schema(), &row(), 3).unwrap(),
            "UPDATE Food SET name = 'taco', fat = 10.0 WHERE Food_id = 3;"
        );
    }

    #[test]
    fn test_update_identity_only() {
        let schema = vec![ColumnProperties::primary_key("Food_id")];
        let row = Row::new(vec![RowValue::Int(1)]);
        assert!(update("Food", "Food_id", &schema, &row, 1).is_err());
    }

    #[test]
    fn test_misaligned_row() {
        let short = Row::new(vec![RowValue::Int(3)]);
        assert!(matches!(
            insert("Food", &schema(), &short),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_unsigned_beyond_i64_is_rejected() {
        let schema = vec![
            ColumnProperties::primary_key("Counter_id"),
            ColumnProperties::not_null("hits", DataType::Integer),
        ];
        let fits = Row::new(vec![RowValue::Int(1), RowValue::UInt(i64::MAX as u64)]);
        assert_eq!(
            insert("Counter", &schema, &fits).unwrap(),
            "INSERT INTO Counter (Counter_id, hits) VALUES (1, 9223372036854775807);"
        );

        let too_big = Row::new(vec![RowValue::Int(1), RowValue::UInt(u64::MAX)]);
        let err = insert("Counter", &schema, &too_big).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { ref column, .. } if column == "hits"));
        assert!(update("Counter", "Counter_id", &schema, &too_big, 1).is_err());
    }

    #[test]
    fn test_other_statements() {
        assert_eq!(delete("Food", "Food_id", 7), "DELETE FROM Food WHERE Food_id = 7;");
        assert_eq!(drop_table("Food"), "DROP TABLE Food;");
        assert_eq!(select_all("Food"), "SELECT * FROM Food;");
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(&RowValue::from("it's")), "'it''s'");
        assert_eq!(literal(&RowValue::Real(2.5)), "2.5");
        assert_eq!(literal(&RowValue::Real(f64::NAN)), "NULL");
        assert_eq!(literal(&RowValue::BigInt(-4)), "-4");
        assert_eq!(literal(&RowValue::UInt(42)), "42");

        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(literal(&RowValue::Timestamp(ts)), "'2024-03-01 08:30:00'");
    }
}
