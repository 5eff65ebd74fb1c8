//! Seed the exercise catalog: inserts every exercise whose name is not already stored.
//!
//! Usage:
//!   cargo run --bin seed_catalog -- [path/to/exercises.json]
//!
//! Without a path the bundled catalog is used. Storage location comes from `GymBotConfig`.

use gymbot_core::store::{default_catalog, parse_catalog};
use gymbot_core::{open_stores, GymBotConfig};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = GymBotConfig::load()?;
    let exercises = match std::env::args().nth(1) {
        Some(path) => parse_catalog(&std::fs::read_to_string(&path)?)?,
        None => default_catalog()?,
    };

    let (_, catalog) = open_stores(&config.storage_path)?;
    let report = catalog.seed_missing(exercises)?;

    println!("Added {} exercises", report.added_total());
    for (category, count) in &report.added {
        println!("  {:<16} +{}", category.as_str(), count);
    }
    if !report.skipped.is_empty() {
        println!("Skipped {} already present", report.skipped.len());
    }

    println!("Catalog now holds {} exercises", report.total);
    for stat in catalog.stats()? {
        println!(
            "  {:<16} {:<5} {}",
            stat.category.as_str(),
            stat.environment.as_str(),
            stat.count
        );
    }
    Ok(())
}
