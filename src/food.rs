//! Food - the tracker's storable nutrition entry
//!
//! Stored in table `Food`:
//! `Food_id | name | fat | carbohydrate | fiber | protein | added_on`

use crate::storage::{id_column, ColumnProperties, Columns, DataType, Row, Storable};
use crate::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const KCAL_PER_GRAM_FAT: f64 = 9.0;
const KCAL_PER_GRAM_CARBOHYDRATE: f64 = 4.0;
const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;

/// Grams of each macronutrient in one serving.
///
/// `fiber` is part of `carbohydrate`, not in addition to it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macronutrients {
    pub fat: f64,
    pub carbohydrate: f64,
    pub fiber: f64,
    pub protein: f64,
}

impl Macronutrients {
    pub fn new(fat: f64, carbohydrate: f64, fiber: f64, protein: f64) -> Self {
        Self {
            fat,
            carbohydrate,
            fiber,
            protein,
        }
    }

    /// Carbohydrate minus fiber, never negative
    pub fn net_carbohydrate(&self) -> f64 {
        (self.carbohydrate - self.fiber).max(0.0)
    }

    pub fn calories(&self) -> f64 {
        self.fat * KCAL_PER_GRAM_FAT
            + self.net_carbohydrate() * KCAL_PER_GRAM_CARBOHYDRATE
            + self.protein * KCAL_PER_GRAM_PROTEIN
    }
}

/// A food with its macronutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    id: i64,
    name: String,
    macronutrients: Macronutrients,
    added_on: NaiveDateTime,
}

impl Food {
    /// Build a food for `EntityStore::make`, which supplies `id`
    pub fn new(
        id: i64,
        name: impl Into<String>,
        macronutrients: Macronutrients,
        added_on: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            macronutrients,
            added_on,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn macronutrients(&self) -> Macronutrients {
        self.macronutrients
    }

    pub fn set_macronutrients(&mut self, macronutrients: Macronutrients) {
        self.macronutrients = macronutrients;
    }

    pub fn added_on(&self) -> NaiveDateTime {
        self.added_on
    }
}

/// Pipe-delimited, the way the sqlite3 shell prints a row
impl std::fmt::Display for Food {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.macronutrients;
        write!(
            f,
            "{}|{}|{}|{}|{}|{}",
            self.id, self.name, m.fat, m.carbohydrate, m.fiber, m.protein
        )
    }
}

impl Storable for Food {
    fn schema() -> Vec<ColumnProperties> {
        vec![
            ColumnProperties::primary_key(id_column::<Self>()),
            ColumnProperties::not_null("name", DataType::Text),
            ColumnProperties::not_null("fat", DataType::Real),
            ColumnProperties::not_null("carbohydrate", DataType::Real),
            ColumnProperties::not_null("fiber", DataType::Real),
            ColumnProperties::not_null("protein", DataType::Real),
            ColumnProperties::not_null("added_on", DataType::Text),
        ]
    }

    fn row(&self) -> Row {
        let m = &self.macronutrients;
        Row::new(vec![
            self.id.into(),
            self.name.clone().into(),
            m.fat.into(),
            m.carbohydrate.into(),
            m.fiber.into(),
            m.protein.into(),
            self.added_on.into(),
        ])
    }

    fn from_row(schema: &[ColumnProperties], row: &Row) -> Result<Self> {
        let columns = Columns::zip(schema, row)?;
        Ok(Self {
            id: columns.integer(&id_column::<Self>())?,
            name: columns.text("name")?,
            macronutrients: Macronutrients {
                fat: columns.real("fat")?,
                carbohydrate: columns.real("carbohydrate")?,
                fiber: columns.real("fiber")?,
                protein: columns.real("protein")?,
            },
            added_on: columns.timestamp("added_on")?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityStore;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tacos(id: i64) -> Food {
        Food::new(id, "tacos", Macronutrients::new(10.0, 10.0, 10.0, 10.0), noon())
    }

    #[test]
    fn test_calories() {
        let macros = Macronutrients::new(10.0, 30.0, 5.0, 20.0);
        assert_eq!(macros.net_carbohydrate(), 25.0);
        assert_eq!(macros.calories(), 90.0 + 100.0 + 80.0);
        assert_eq!(Macronutrients::new(0.0, 1.0, 3.0, 0.0).net_carbohydrate(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(tacos(1).to_string(), "1|tacos|10|10|10|10");
    }

    #[test]
    fn test_round_trip() {
        let food = Food::new(
            5,
            "Grandma's oatmeal",
            Macronutrients::new(2.5, 27.0, 4.0, 5.25),
            noon(),
        );
        let data = food.get_data();
        assert_eq!(data.table_name, "Food");

        let rebuilt = Food::from_row(&data.schema, &data.rows[0]).unwrap();
        assert_eq!(rebuilt, food);
    }

    #[test]
    fn test_persist_and_reload() {
        let mut store = EntityStore::open_in_memory();
        let taco = store.make(tacos).unwrap();
        assert_eq!(taco.id(), 1);

        store
            .modify::<Food, _>(1, |food| {
                food.set_macronutrients(Macronutrients::new(12.0, 30.0, 6.0, 15.0))
            })
            .unwrap();

        store.clear_caches();
        let reloaded = store.get::<Food>(1).unwrap().unwrap().clone();
        assert_eq!(reloaded.name(), "tacos");
        assert_eq!(reloaded.macronutrients().protein, 15.0);
        assert_eq!(reloaded.added_on(), noon());

        store.delete_storable::<Food>(1).unwrap();
        assert_eq!(store.count_rows::<Food>().unwrap(), 0);
    }
}
