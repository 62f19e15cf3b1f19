use clap::{Args, Subcommand, ValueEnum};

use super::{describe, resolve, MoveDirection, OutputFormat};
use grocer_core::{GroceryEngine, Intent, Persistence, SortMode, Store};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct StoreCommand {
    #[command(subcommand)]
    pub command: StoreSubcommand,
}

#[derive(Subcommand)]
pub enum StoreSubcommand {
    /// Add a store (it starts with the default category)
    Add {
        /// Store name
        name: String,
    },

    /// Rename a store
    Rename {
        /// Store ID or name
        store: String,

        /// New name
        name: String,
    },

    /// Delete a store and everything in it
    Delete {
        /// Store ID or name
        store: String,
    },

    /// Move a store one place up or down
    Move {
        /// Store ID or name
        store: String,

        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

impl StoreCommand {
    pub fn run<P: Persistence>(&self, engine: &mut GroceryEngine<P>) -> CmdResult {
        let catalog = engine.catalog();
        let intent = match &self.command {
            StoreSubcommand::Add { name } => Intent::AddStore { name: name.clone() },
            StoreSubcommand::Rename { store, name } => Intent::RenameStore {
                store_id: resolve::store(catalog, store)?.id.clone(),
                name: name.clone(),
            },
            StoreSubcommand::Delete { store } => Intent::DeleteStore {
                store_id: resolve::store(catalog, store)?.id.clone(),
            },
            StoreSubcommand::Move { store, direction } => Intent::MoveStore {
                store_id: resolve::store(catalog, store)?.id.clone(),
                direction: (*direction).into(),
            },
        };
        let outcome = engine.dispatch(intent)?;
        println!("{}", describe("store", &outcome));
        Ok(())
    }
}

#[derive(Args)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// Add a category to a store
    Add {
        /// Store ID or name
        store: String,

        /// Category name
        name: String,
    },

    /// Rename a category
    Rename {
        store: String,
        category: String,

        /// New name
        name: String,
    },

    /// Delete a category (a store keeps at least one)
    Delete { store: String, category: String },

    /// Move a category one place up or down
    Move {
        store: String,
        category: String,

        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

impl CategoryCommand {
    pub fn run<P: Persistence>(&self, engine: &mut GroceryEngine<P>) -> CmdResult {
        let catalog = engine.catalog();
        let intent = match &self.command {
            CategorySubcommand::Add { store, name } => Intent::AddCategory {
                store_id: resolve::store(catalog, store)?.id.clone(),
                name: name.clone(),
            },
            CategorySubcommand::Rename {
                store,
                category,
                name,
            } => {
                let (store_id, category_id) = resolve::location(catalog, store, category)?;
                Intent::RenameCategory {
                    store_id,
                    category_id,
                    name: name.clone(),
                }
            }
            CategorySubcommand::Delete { store, category } => {
                let (store_id, category_id) = resolve::location(catalog, store, category)?;
                Intent::DeleteCategory {
                    store_id,
                    category_id,
                }
            }
            CategorySubcommand::Move {
                store,
                category,
                direction,
            } => {
                let (store_id, category_id) = resolve::location(catalog, store, category)?;
                Intent::MoveCategory {
                    store_id,
                    category_id,
                    direction: (*direction).into(),
                }
            }
        };
        let outcome = engine.dispatch(intent)?;
        println!("{}", describe("category", &outcome));
        Ok(())
    }
}

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item to a category
    Add {
        store: String,
        category: String,

        /// Item name
        name: String,
    },

    /// Rename an item or move it to another store/category
    ///
    /// Line items on active lists follow the change.
    Edit {
        store: String,
        category: String,
        item: String,

        /// New name (defaults to the current one)
        #[arg(long)]
        name: Option<String>,

        /// Destination store ID or name
        #[arg(long = "to-store")]
        to_store: Option<String>,

        /// Destination category ID or name
        #[arg(long = "to-category")]
        to_category: Option<String>,
    },

    /// Delete an item and remove it from active lists
    Delete {
        store: String,
        category: String,
        item: String,
    },

    /// Move an item one place up or down
    Move {
        store: String,
        category: String,
        item: String,

        #[arg(value_enum)]
        direction: MoveDirection,
    },

    /// Copy an item into another store/category under a new id
    Duplicate {
        store: String,
        category: String,
        item: String,

        #[arg(long = "to-store")]
        to_store: String,

        #[arg(long = "to-category")]
        to_category: String,
    },
}

impl ItemCommand {
    pub fn run<P: Persistence>(&self, engine: &mut GroceryEngine<P>) -> CmdResult {
        let catalog = engine.catalog();
        let intent = match &self.command {
            ItemSubcommand::Add {
                store,
                category,
                name,
            } => {
                let (store_id, category_id) = resolve::location(catalog, store, category)?;
                Intent::AddItem {
                    store_id,
                    category_id,
                    name: name.clone(),
                }
            }
            ItemSubcommand::Edit {
                store,
                category,
                item,
                name,
                to_store,
                to_category,
            } => {
                let (store_id, category_id, item_id) =
                    resolve::item_path(catalog, store, category, item)?;
                let current = catalog
                    .item(&store_id, &category_id, &item_id)
                    .map(|i| i.name.clone())
                    .unwrap_or_default();

                // A new category alone stays within the current store.
                let (new_store_id, new_category_id) = match (to_store, to_category) {
                    (None, None) => (None, None),
                    (Some(s), None) => (Some(resolve::store(catalog, s)?.id.clone()), None),
                    (s, Some(c)) => {
                        let (s, c) =
                            resolve::location(catalog, s.as_deref().unwrap_or(&store_id), c)?;
                        (Some(s), Some(c))
                    }
                };

                Intent::EditItem {
                    store_id,
                    category_id,
                    item_id,
                    name: name.clone().unwrap_or(current),
                    new_store_id,
                    new_category_id,
                }
            }
            ItemSubcommand::Delete {
                store,
                category,
                item,
            } => {
                let (store_id, category_id, item_id) =
                    resolve::item_path(catalog, store, category, item)?;
                Intent::DeleteItem {
                    store_id,
                    category_id,
                    item_id,
                }
            }
            ItemSubcommand::Move {
                store,
                category,
                item,
                direction,
            } => {
                let (store_id, category_id, item_id) =
                    resolve::item_path(catalog, store, category, item)?;
                Intent::MoveItem {
                    store_id,
                    category_id,
                    item_id,
                    direction: (*direction).into(),
                }
            }
            ItemSubcommand::Duplicate {
                store,
                category,
                item,
                to_store,
                to_category,
            } => {
                let (store_id, category_id, item_id) =
                    resolve::item_path(catalog, store, category, item)?;
                let (dest_store_id, dest_category_id) =
                    resolve::location(catalog, to_store, to_category)?;
                Intent::DuplicateItem {
                    store_id,
                    category_id,
                    item_id,
                    dest_store_id,
                    dest_category_id,
                }
            }
        };
        let outcome = engine.dispatch(intent)?;
        println!("{}", describe("item", &outcome));
        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum SortArg {
    #[default]
    Manual,
    Alphabetical,
}

impl From<SortArg> for SortMode {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Manual => SortMode::Manual,
            SortArg::Alphabetical => SortMode::Alphabetical,
        }
    }
}

#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// Show stores, categories and items
    Show {
        /// Ordering (alphabetical does not change the stored order)
        #[arg(long, value_enum, default_value = "manual")]
        sort: SortArg,

        /// Only show items whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl CatalogCommand {
    pub fn run<P: Persistence>(&self, engine: &GroceryEngine<P>) -> CmdResult {
        match &self.command {
            CatalogSubcommand::Show {
                sort,
                search,
                format,
            } => {
                let stores = engine.catalog().view((*sort).into(), search.as_deref());
                if stores.is_empty() {
                    println!("No items found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&stores)?);
                    }
                    OutputFormat::Text => {
                        let in_list = engine.active_list();
                        for line in render_catalog(&stores, |item_id| {
                            in_list.is_some_and(|l| l.contains_item(item_id))
                        }) {
                            println!("{}", line);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Text lines for a catalog view. Items already on the active list are
/// marked with `*`.
fn render_catalog(stores: &[Store], on_list: impl Fn(&str) -> bool) -> Vec<String> {
    let mut lines = Vec::new();
    for store in stores {
        lines.push(format!("{}  ({})", store.name, store.id));
        for category in &store.categories {
            lines.push(format!("  {}  ({})", category.name, category.id));
            for item in &category.items {
                let mark = if on_list(&item.id) { "*" } else { "-" };
                lines.push(format!("    {} {}  ({})", mark, item.name, item.id));
            }
        }
    }
    lines
}
