use clap::Args;
use std::fs;
use std::path::PathBuf;

use grocer_core::{parse_import, ExportEnvelope, GroceryEngine, Persistence};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct ExportCommand {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn run<P: Persistence>(&self, engine: &GroceryEngine<P>) -> CmdResult {
        let json = ExportEnvelope::new(engine.export_data()).to_json()?;
        match &self.output {
            Some(path) => {
                fs::write(path, json)?;
                println!("Exported to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct ImportCommand {
    /// Export file to read
    pub file: PathBuf,

    /// Confirm replacing all current lists and the catalog
    #[arg(long)]
    pub yes: bool,
}

impl ImportCommand {
    pub fn run<P: Persistence>(&self, engine: &mut GroceryEngine<P>) -> CmdResult {
        let content = fs::read_to_string(&self.file)?;
        // Validate before asking for confirmation.
        let data = parse_import(&content)?;

        if !self.yes {
            return Err(format!(
                "Importing replaces all {} list(s) and {} store(s). Re-run with --yes to confirm.",
                engine.lists().lists().len() + engine.lists().archived_lists().len(),
                engine.catalog().stores().len()
            )
            .into());
        }

        let (lists, stores) = (data.lists.len(), data.master_stores.stores().len());
        engine.import_data(data)?;
        println!("Imported {} list(s) and {} store(s)", lists, stores);
        Ok(())
    }
}
