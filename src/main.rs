//! Football Feature Pipeline CLI
//!
//! Turns scraped match reports into per-fixture training and prediction
//! tensors for a match outcome model.

use clap::{Parser, Subcommand};
use footy::{Config, Result};

#[derive(Parser)]
#[command(name = "footy")]
#[command(about = "Football match outcome features from scraped stats", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Normalize raw scraped rows into canonical match records
    Transform,
    /// Build per-fixture history tensors and register units
    Features {
        /// Override the history window length
        #[arg(long)]
        window: Option<usize>,
    },
    /// Show database and unit status
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Transform => commands::transform(&config),
        Commands::Features { window } => commands::features(&config, window),
        Commands::Status => commands::status(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use footy::data::{Database, DataTransformer, TensorStore};
    use footy::pipeline::FeaturePipeline;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Load scraped match rows into the raw_matches table");
        println!("  3. Run 'footy transform' to normalize them");
        println!("  4. Run 'footy features' to build per-fixture tensors");

        Ok(())
    }

    pub fn transform(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;

        let summary = DataTransformer::new(&db).run()?;
        println!("Transformed {} raw matches", summary.transformed);
        if summary.malformed_score > 0 || summary.malformed_date > 0 {
            println!(
                "Skipped {} malformed scores, {} malformed dates",
                summary.malformed_score, summary.malformed_date
            );
        }
        if summary.incomplete_stats > 0 {
            println!(
                "{} matches stored without stats (incomplete reports)",
                summary.incomplete_stats
            );
        }
        if summary.unknown_category > 0 {
            println!(
                "{} matches had unrecognized stat categories; see the log",
                summary.unknown_category
            );
        }
        if summary.malformed_blob > 0 {
            println!(
                "{} matches had unparseable stat blobs; see the log",
                summary.malformed_blob
            );
        }

        Ok(())
    }

    pub fn features(config: &Config, window: Option<usize>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let store = TensorStore::open(&config.data.tensor_path)?;
        let window = window.unwrap_or(config.pipeline.window);

        let summary = FeaturePipeline::new(&db, store, window).run()?;
        println!(
            "Built {} units from {} fixtures",
            summary.processed, summary.total
        );
        if summary.insufficient_history > 0 {
            println!(
                "{} fixtures not ready (fewer than {} prior matches with full stats)",
                summary.insufficient_history, window
            );
        }
        if summary.persistence_failures > 0 {
            println!("{} units failed to persist; see the log", summary.persistence_failures);
        }

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let store = TensorStore::open(&config.data.tensor_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:        {}", config.data.database_path);
        println!("  Raw rows:    {}", stats.raw_count);
        println!("  Matches:     {}", stats.match_count);
        println!("  Training:    {} units", stats.training_units);
        println!("  Prediction:  {} units", stats.prediction_units);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:       {} to {}", earliest, latest);
        }

        let ready = db
            .get_all_units()?
            .iter()
            .filter(|u| store.contains(&u.unit_id))
            .count();
        println!("  Tensors:     {} units on disk", ready);

        Ok(())
    }
}
