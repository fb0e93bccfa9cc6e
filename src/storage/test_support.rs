//! Minimal storable entity shared by the storage tests

use crate::storage::data::{ColumnProperties, DataType, Row};
use crate::storage::storable::{id_column, Columns, Storable};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct DummyStorable {
    id: i64,
    name: String,
}

impl DummyStorable {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl std::fmt::Display for DummyStorable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.id, self.name)
    }
}

impl Storable for DummyStorable {
    fn schema() -> Vec<ColumnProperties> {
        vec![
            ColumnProperties::primary_key(id_column::<Self>()),
            ColumnProperties::not_null("name", DataType::Text),
        ]
    }

    fn row(&self) -> Row {
        Row::new(vec![self.id.into(), self.name.clone().into()])
    }

    fn from_row(schema: &[ColumnProperties], row: &Row) -> Result<Self> {
        let columns = Columns::zip(schema, row)?;
        Ok(Self {
            id: columns.integer(&id_column::<Self>())?,
            name: columns.text("name")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}
