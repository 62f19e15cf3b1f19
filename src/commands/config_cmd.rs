use clap::{Args, Subcommand};
use std::fs;
use std::path::Path;

use super::OutputFormat;
use grocer::config::{Config, ConfigValue};

const DEFAULT_CONFIG: &str = r#"# grocer configuration

# Where catalog and list documents are stored (default: platform data dir)
# data_dir: ~/.local/share/grocer

# Category every new store starts with
default_category: General

# Name of the list created when there is none
default_list_name: My First List

# Server used by `grocer remote`
# server:
#   url: http://localhost:8080
"#;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    /// `config_path` is where `init` writes.
    pub fn run(
        &self,
        config: &Config,
        config_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        match &config.config_file {
                            Some(path) => println!("Config file: {}", path.display()),
                            None => println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            ),
                        }
                        println!();
                        print_value(
                            "data_dir",
                            &config.data_dir.value.display().to_string(),
                            &config.data_dir,
                        );
                        print_value(
                            "default_category",
                            &config.default_category.value,
                            &config.default_category,
                        );
                        print_value(
                            "default_list_name",
                            &config.default_list_name.value,
                            &config.default_list_name,
                        );
                        println!(
                            "server.url: {}",
                            config.server.url.as_deref().unwrap_or("(not set)")
                        );
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'grocer config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(config_path, DEFAULT_CONFIG)?;

                println!("Created config file: {}", config_path.display());
                Ok(())
            }
        }
    }
}

fn print_value<T>(key: &str, shown: &str, value: &ConfigValue<T>) {
    println!("{}: {}", key, shown);
    println!("  source: {}", value.source);
}
