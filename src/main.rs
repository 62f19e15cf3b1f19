use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    CatalogCommand, CategoryCommand, ConfigCommand, ExportCommand, ImportCommand, ItemCommand,
    ListCommand, RemoteCommand, StoreCommand,
};
use grocer::config::Config;
use grocer_core::{AutomergePersistence, GroceryEngine};

#[derive(Parser)]
#[command(name = "grocer")]
#[command(version)]
#[command(about = "Grocery catalog and shopping lists", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stores in the catalog
    Store(StoreCommand),

    /// Manage categories within a store
    Category(CategoryCommand),

    /// Manage catalog items
    Item(ItemCommand),

    /// Browse the catalog
    Catalog(CatalogCommand),

    /// Manage shopping lists
    List(ListCommand),

    /// Write all data as an export file
    Export(ExportCommand),

    /// Replace all data with an export file
    Import(ImportCommand),

    /// Talk to a grocer server
    Remote(RemoteCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_engine(
    config: &Config,
) -> Result<GroceryEngine<AutomergePersistence>, Box<dyn std::error::Error>> {
    let persistence = AutomergePersistence::open(config.data_dir.value.clone())?;
    Ok(GroceryEngine::load(persistence, config.engine_options())?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Store(cmd)) => cmd.run(&mut open_engine(&config)?)?,
        Some(Commands::Category(cmd)) => cmd.run(&mut open_engine(&config)?)?,
        Some(Commands::Item(cmd)) => cmd.run(&mut open_engine(&config)?)?,
        Some(Commands::Catalog(cmd)) => cmd.run(&open_engine(&config)?)?,
        Some(Commands::List(cmd)) => cmd.run(&mut open_engine(&config)?)?,
        Some(Commands::Export(cmd)) => cmd.run(&open_engine(&config)?)?,
        Some(Commands::Import(cmd)) => cmd.run(&mut open_engine(&config)?)?,
        Some(Commands::Remote(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config, &config_path)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
