use crate::food::Food;
use crate::storage::Storable;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// One food as a table row
#[derive(Tabled)]
pub struct FoodRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Fat (g)")]
    pub fat: String,
    #[tabled(rename = "Carbs (g)")]
    pub carbohydrate: String,
    #[tabled(rename = "Fiber (g)")]
    pub fiber: String,
    #[tabled(rename = "Protein (g)")]
    pub protein: String,
    #[tabled(rename = "kcal")]
    pub calories: String,
    #[tabled(rename = "Added")]
    pub added_on: String,
}

impl From<&Food> for FoodRow {
    fn from(food: &Food) -> Self {
        let m = food.macronutrients();
        Self {
            id: food.id(),
            name: food.name().to_string(),
            fat: format!("{:.1}", m.fat),
            carbohydrate: format!("{:.1}", m.carbohydrate),
            fiber: format!("{:.1}", m.fiber),
            protein: format!("{:.1}", m.protein),
            calories: format!("{:.0}", m.calories()),
            added_on: food.added_on().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub fn food_table(foods: &[Food]) -> String {
    if foods.is_empty() {
        return String::new();
    }
    let rows: Vec<FoodRow> = foods.iter().map(FoodRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::Macronutrients;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_tables() {
        assert!(stats_table(&[]).is_empty());
        assert!(food_table(&[]).is_empty());
    }

    #[test]
    fn test_food_table() {
        let added = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let food = Food::new(1, "tacos", Macronutrients::new(10.0, 20.0, 5.0, 12.0), added);

        let table = food_table(&[food]);
        assert!(table.contains("tacos"));
        assert!(table.contains("Protein (g)"));
        assert!(table.contains("2024-03-01 12:00"));
        // 10*9 + 15*4 + 12*4
        assert!(table.contains("198"));
    }

    #[test]
    fn test_stats_table() {
        let table = stats_table(&[("Rows", "3")]);
        assert!(table.contains("Metric"));
        assert!(table.contains("Rows"));
    }
}
