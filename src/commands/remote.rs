//! Commands that talk to a running grocer server.

use clap::{Args, Subcommand};

use grocer::config::Config;
use grocer_core::{RemoteClient, RemoteError};

#[derive(Args)]
pub struct RemoteCommand {
    #[command(subcommand)]
    pub command: RemoteSubcommand,
}

#[derive(Subcommand)]
pub enum RemoteSubcommand {
    /// Copy items from one list to another on the server
    Copy {
        /// Destination list ID
        destination: String,

        /// Source list ID
        source: String,
    },

    /// Show the server's lists
    Lists,

    /// Check that the server is reachable
    Health,
}

impl RemoteCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let url = config.server.url.as_deref().ok_or(RemoteError::NotConfigured)?;
        let client = RemoteClient::new(url)?;

        match &self.command {
            RemoteSubcommand::Copy {
                destination,
                source,
            } => {
                let response = client.copy_items(destination, source).await?;
                println!("{}", response.message);
            }
            RemoteSubcommand::Lists => {
                let remote = client.lists().await?;
                for list in &remote.lists {
                    let mark = if remote.active_list_id.as_deref() == Some(list.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}  {} ({} items)", mark, list.id, list.name, list.items.len());
                }
                for list in &remote.archived_lists {
                    println!("a {}  {} ({} items)", list.id, list.name, list.items.len());
                }
            }
            RemoteSubcommand::Health => {
                let health = client.health().await?;
                println!(
                    "{} is {} (version {})",
                    client.base_url(),
                    health.status,
                    health.version
                );
            }
        }
        Ok(())
    }
}
