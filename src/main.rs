//! Tracker CLI - record foods and their macronutrients in SQLite

use chrono::{Local, Timelike};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracker::config::{self, TrackerConfig};
use tracker::storage::table_name;
use tracker::ui::{self, Icons};
use tracker::{EntityStore, Food, Macronutrients, Storable};

#[derive(Parser)]
#[command(name = "tracker")]
#[command(version)]
#[command(about = "Nutrition tracker - foods and macronutrients stored in SQLite")]
#[command(long_about = r#"
Tracker keeps a table of foods with their macronutrients.

Example usage:
  tracker add --name tacos --fat 10 --carbohydrate 20 --fiber 5 --protein 12
  tracker list
  tracker rename --id 1 --name "fish tacos"
  tracker delete --id 1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct MacroArgs {
    /// Grams of fat
    #[arg(long, default_value_t = 0.0)]
    fat: f64,

    /// Grams of carbohydrate (including fiber)
    #[arg(long, default_value_t = 0.0)]
    carbohydrate: f64,

    /// Grams of fiber
    #[arg(long, default_value_t = 0.0)]
    fiber: f64,

    /// Grams of protein
    #[arg(long, default_value_t = 0.0)]
    protein: f64,
}

impl From<&MacroArgs> for Macronutrients {
    fn from(args: &MacroArgs) -> Self {
        Macronutrients::new(args.fat, args.carbohydrate, args.fiber, args.protein)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a tracker.toml with default settings
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Add a food
    Add {
        /// Food name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        macros: MacroArgs,
    },

    /// List every food
    List,

    /// Show one food
    Show {
        #[arg(short, long)]
        id: i64,
    },

    /// Rename a food
    Rename {
        #[arg(short, long)]
        id: i64,

        /// New name
        #[arg(short, long)]
        name: String,
    },

    /// Replace a food's macronutrients
    SetMacros {
        #[arg(short, long)]
        id: i64,

        #[command(flatten)]
        macros: MacroArgs,
    },

    /// Delete a food
    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// Show table statistics
    Stats,

    /// Drop the food table and everything in it
    Drop {
        /// Confirm the drop
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let db_config = file_config.database_config(cli.database.as_deref());
    if !matches!(cli.command, Commands::Init { .. }) {
        config::ensure_db_dir(&db_config)?;
    }
    tracing::debug!("Using database {}", db_config.location);

    // Nothing is opened until the first command touches the database
    let mut store = EntityStore::open(db_config);
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &TrackerConfig::with_defaults(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Add { name, macros } => {
            let now = Local::now().naive_local();
            let added_on = now.with_nanosecond(0).unwrap_or(now);
            let food = store.make(|id| Food::new(id, name, Macronutrients::from(&macros), added_on))?;
            if json {
                println!("{}", serde_json::to_string_pretty(food)?);
            } else {
                ui::header(Icons::NEW, &format!("Added {}", ui::food_name(food.name())));
                ui::info("id", &food.id().to_string());
                ui::info("energy", &ui::kcal(food.macronutrients().calories()));
            }
        }

        Commands::List => {
            let foods = store.retrieve_all::<Food>()?;
            if json {
                println!("{}", serde_json::to_string_pretty(foods)?);
            } else if foods.is_empty() {
                println!("{} No foods recorded.", Icons::EMPTY);
            } else {
                ui::header(Icons::FOOD, &format!("{} foods", foods.len()));
                println!("{}", ui::food_table(foods));
            }
        }

        Commands::Show { id } => {
            let Some(food) = store.get::<Food>(id)? else {
                anyhow::bail!("no food with id {}", id);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(food)?);
            } else {
                println!("{}", ui::food_table(std::slice::from_ref(food)));
                ui::summary_row("row:", &food.to_string());
            }
        }

        Commands::Rename { id, name } => {
            ensure_food(&mut store, id)?;
            let food = store.modify::<Food, _>(id, |food| food.set_name(name))?;
            report_change(json, food, "Renamed")?;
        }

        Commands::SetMacros { id, macros } => {
            ensure_food(&mut store, id)?;
            let macros = Macronutrients::from(&macros);
            let food = store.modify::<Food, _>(id, |food| food.set_macronutrients(macros))?;
            report_change(json, food, "Updated")?;
        }

        Commands::Delete { id } => {
            ensure_food(&mut store, id)?;
            store.delete_storable::<Food>(id)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                ui::header(Icons::DEL, &format!("Deleted food {}", id));
            }
        }

        Commands::Stats => {
            let exists = store.table_exists::<Food>()?;
            let rows = store.count_rows::<Food>()?;
            let next_id = store.get_new_id::<Food>()?;
            let calories: f64 = store
                .retrieve_all::<Food>()?
                .iter()
                .map(|food| food.macronutrients().calories())
                .sum();

            if json {
                let data = serde_json::json!({
                    "table": table_name::<Food>(),
                    "exists": exists,
                    "rows": rows,
                    "next_id": next_id,
                    "calories": calories,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                ui::header(Icons::STATS, "Tracker Statistics");
                ui::info("database", &store.database().config().location.to_string());
                let rows_str = rows.to_string();
                let next_id_str = next_id.to_string();
                let calories_str = format!("{:.0}", calories);
                println!(
                    "{}",
                    ui::stats_table(&[
                        ("Table", table_name::<Food>()),
                        ("Exists", if exists { "yes" } else { "no" }),
                        ("Rows", rows_str.as_str()),
                        ("Next ID", next_id_str.as_str()),
                        ("Total kcal", calories_str.as_str()),
                    ])
                );
            }
        }

        Commands::Drop { yes } => {
            if !yes {
                ui::warn("Refusing to drop without --yes");
                anyhow::bail!("drop not confirmed");
            }
            store.drop_table::<Food>()?;
            if json {
                println!("{}", serde_json::json!({ "dropped": table_name::<Food>() }));
            } else {
                ui::header(Icons::DATABASE, &format!("Dropped table {}", table_name::<Food>()));
            }
        }
    }

    Ok(())
}

fn ensure_food(store: &mut EntityStore, id: i64) -> anyhow::Result<()> {
    if store.get::<Food>(id)?.is_none() {
        anyhow::bail!("no food with id {}", id);
    }
    Ok(())
}

fn report_change(json: bool, food: &Food, verb: &str) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(food)?);
    } else {
        ui::header(Icons::MOD, &format!("{} food {}", verb, food.id()));
        ui::summary_row("row:", &food.to_string());
        ui::summary_row("energy:", &ui::kcal(food.macronutrients().calories()));
    }
    Ok(())
}
