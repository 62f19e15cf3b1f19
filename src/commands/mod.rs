mod catalog;
mod config_cmd;
mod list;
mod remote;
mod resolve;
mod transfer;

pub use catalog::{CatalogCommand, CategoryCommand, ItemCommand, StoreCommand};
pub use config_cmd::ConfigCommand;
pub use list::ListCommand;
pub use remote::RemoteCommand;
pub use transfer::{ExportCommand, ImportCommand};

use clap::ValueEnum;
use grocer_core::{Direction, Outcome};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Direction argument for `move` subcommands
#[derive(Clone, Copy, ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(direction: MoveDirection) -> Self {
        match direction {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

/// One-line summary of an outcome for `what`.
fn describe(what: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created { id } => format!("Created {} ({})", what, id),
        Outcome::LineItemAdded { line_item } => format!("Added to list: {}", line_item),
        Outcome::Updated => format!("Updated {}", what),
        Outcome::Moved { changed: true } => format!("Moved {}", what),
        Outcome::Moved { changed: false } => format!("{} is already at the edge", what),
        Outcome::Toggled { checked: true } => format!("Checked {}", what),
        Outcome::Toggled { checked: false } => format!("Unchecked {}", what),
        Outcome::Reordered { count } => format!("Reordered {} {}(s)", count, what),
        Outcome::Copied { message, .. } => message.clone(),
    }
}
