pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, food_name, header, info, kcal, success, summary_row, warn};
pub use table::{food_table, stats_table, FoodRow, TableBuilder};
pub use theme::{theme, Theme};
