//! Shopping list CLI commands.
//!
//! Line item commands act on the active list unless `--list` names
//! another active list.

use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::{describe, resolve, OutputFormat};
use grocer_core::{Catalog, GroceryEngine, Intent, Persistence, ShoppingList};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// Show all lists, active first
    Ls {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the items on a list grouped by store and category
    Show {
        /// List ID or name (defaults to the active list)
        list: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a list and make it active
    Create {
        /// List name
        name: String,
    },

    /// Make a list the active one
    Select {
        /// List ID or name
        list: String,
    },

    /// Archive a list (at least one list stays active)
    Archive { list: String },

    /// Restore an archived list
    Restore { list: String },

    /// Permanently delete an archived list
    Delete {
        list: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Put a catalog item on the active list
    Add {
        store: String,
        category: String,
        item: String,
    },

    /// Take a line item off a list
    Remove {
        /// Line item ID or name
        line_item: String,

        #[arg(long)]
        list: Option<String>,
    },

    /// Toggle a line item's checked state
    Check {
        /// Line item ID or name
        line_item: String,

        #[arg(long)]
        list: Option<String>,
    },

    /// Set the order of line items within one store/category group
    Reorder {
        store: String,
        category: String,

        /// Line item IDs or names, in the new order
        #[arg(required = true)]
        line_items: Vec<String>,

        #[arg(long)]
        list: Option<String>,
    },

    /// Copy items another list has and this one lacks
    Copy {
        /// Source list ID or name (active or archived)
        source: String,

        /// Destination list ID or name (defaults to the active list)
        #[arg(long)]
        to: Option<String>,
    },
}

impl ListCommand {
    pub fn run<P: Persistence>(&self, engine: &mut GroceryEngine<P>) -> CmdResult {
        match &self.command {
            ListSubcommand::Ls { format } => {
                let lists = engine.lists();
                match format {
                    OutputFormat::Json => {
                        let all: Vec<&ShoppingList> = lists
                            .lists()
                            .iter()
                            .chain(lists.archived_lists())
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&all)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<2}{:<24}  {:<30}  ITEMS", "", "ID", "NAME");
                        println!("{}", "-".repeat(70));
                        for list in lists.lists() {
                            let mark = if lists.active_id() == Some(list.id.as_str()) {
                                "*"
                            } else {
                                ""
                            };
                            println!("{}", list_row(mark, list));
                        }
                        for list in lists.archived_lists() {
                            println!("{}", list_row("a", list));
                        }
                    }
                }
                Ok(())
            }

            ListSubcommand::Show { list, format } => {
                let lists = engine.lists();
                let list = match list {
                    Some(ident) => resolve::list(lists, ident)?,
                    None => lists.active().ok_or("No active list")?,
                };
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(list)?);
                    }
                    OutputFormat::Text => {
                        for line in render_list(list, engine.catalog()) {
                            println!("{}", line);
                        }
                    }
                }
                Ok(())
            }

            ListSubcommand::Create { name } => {
                let outcome = engine.dispatch(Intent::CreateList { name: name.clone() })?;
                println!("{}", describe("list", &outcome));
                Ok(())
            }

            ListSubcommand::Select { list } => {
                let list_id = resolve::list(engine.lists(), list)?.id.clone();
                engine.dispatch(Intent::SelectList {
                    list_id: list_id.clone(),
                })?;
                println!("Active list: {}", list_id);
                Ok(())
            }

            ListSubcommand::Archive { list } => {
                let list_id = resolve::list(engine.lists(), list)?.id.clone();
                engine.dispatch(Intent::ArchiveList { list_id })?;
                println!("Archived list: {}", list);
                Ok(())
            }

            ListSubcommand::Restore { list } => {
                let list_id = resolve::list(engine.lists(), list)?.id.clone();
                engine.dispatch(Intent::RestoreList { list_id })?;
                println!("Restored list: {}", list);
                Ok(())
            }

            ListSubcommand::Delete { list, force } => {
                let target = resolve::list(engine.lists(), list)?;
                let (list_id, name) = (target.id.clone(), target.name.clone());

                if !force {
                    print!("Delete archived list '{}'? [y/N] ", name);
                    io::stdout().flush()?;
                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;
                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Cancelled");
                        return Ok(());
                    }
                }

                engine.dispatch(Intent::DeleteArchivedList { list_id })?;
                println!("Deleted list: {}", name);
                Ok(())
            }

            ListSubcommand::Add {
                store,
                category,
                item,
            } => {
                let (store_id, category_id, item_id) =
                    resolve::item_path(engine.catalog(), store, category, item)?;
                let outcome = engine.dispatch(Intent::AddToActiveList {
                    store_id,
                    category_id,
                    item_id,
                })?;
                println!("{}", describe("item", &outcome));
                Ok(())
            }

            ListSubcommand::Remove { line_item, list } => {
                let (list_id, line_item_id) = target_line_item(engine, list.as_deref(), line_item)?;
                engine.dispatch(Intent::RemoveLineItem {
                    list_id,
                    line_item_id,
                })?;
                println!("Removed: {}", line_item);
                Ok(())
            }

            ListSubcommand::Check { line_item, list } => {
                let (list_id, line_item_id) = target_line_item(engine, list.as_deref(), line_item)?;
                let outcome = engine.dispatch(Intent::ToggleChecked {
                    list_id,
                    line_item_id,
                })?;
                println!("{}", describe(line_item, &outcome));
                Ok(())
            }

            ListSubcommand::Reorder {
                store,
                category,
                line_items,
                list,
            } => {
                let (store_id, category_id) =
                    resolve::location(engine.catalog(), store, category)?;
                let target = target_list(engine, list.as_deref())?;
                let line_item_ids = line_items
                    .iter()
                    .map(|ident| resolve::line_item(target, ident).map(|li| li.id.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                let list_id = target.id.clone();

                let outcome = engine.dispatch(Intent::ReorderGroup {
                    list_id,
                    store_id,
                    category_id,
                    line_item_ids,
                })?;
                println!("{}", describe("line item", &outcome));
                Ok(())
            }

            ListSubcommand::Copy { source, to } => {
                let source_list_id = resolve::list(engine.lists(), source)?.id.clone();
                let destination_list_id = target_list(engine, to.as_deref())?.id.clone();
                let outcome = engine.dispatch(Intent::CopyItems {
                    source_list_id,
                    destination_list_id,
                })?;
                println!("{}", describe("", &outcome));
                Ok(())
            }
        }
    }
}

/// The named list, or the active one.
fn target_list<'a, P: Persistence>(
    engine: &'a GroceryEngine<P>,
    ident: Option<&str>,
) -> Result<&'a ShoppingList, Box<dyn std::error::Error>> {
    match ident {
        Some(ident) => resolve::list(engine.lists(), ident),
        None => Ok(engine.active_list().ok_or("No active list")?),
    }
}

fn target_line_item<P: Persistence>(
    engine: &GroceryEngine<P>,
    list: Option<&str>,
    line_item: &str,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let target = target_list(engine, list)?;
    let line_item = resolve::line_item(target, line_item)?;
    Ok((target.id.clone(), line_item.id.clone()))
}

fn list_row(mark: &str, list: &ShoppingList) -> String {
    let name = if list.name.chars().count() > 30 {
        format!("{}...", list.name.chars().take(27).collect::<String>())
    } else {
        list.name.clone()
    };
    format!(
        "{:<2}{:<24}  {:<30}  {}/{}",
        mark,
        list.id,
        name,
        list.checked_count(),
        list.items.len()
    )
}

/// Text lines for one list, grouped by store then category.
fn render_list(list: &ShoppingList, catalog: &Catalog) -> Vec<String> {
    let status = if list.is_archived() { " (archived)" } else { "" };
    let mut lines = vec![format!(
        "{}{}  {}/{} checked",
        list.name,
        status,
        list.checked_count(),
        list.items.len()
    )];
    if list.items.is_empty() {
        lines.push("  (empty)".to_string());
        return lines;
    }
    for store in list.grouped(catalog) {
        lines.push(String::new());
        lines.push(store.store_name);
        for category in store.categories {
            lines.push(format!("  {}", category.category_name));
            for line_item in &category.items {
                lines.push(format!("    {}", line_item));
            }
        }
    }
    lines
}
