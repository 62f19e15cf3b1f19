//! Typed user intents and the table that routes them to engine operations.

use serde::{Deserialize, Serialize};

use super::{copy_message, GroceryEngine};
use crate::error::GroceryError;
use crate::models::{Direction, LineItem};
use crate::persistence::Persistence;

/// Everything a presentation layer can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    AddStore {
        name: String,
    },
    RenameStore {
        store_id: String,
        name: String,
    },
    DeleteStore {
        store_id: String,
    },
    MoveStore {
        store_id: String,
        direction: Direction,
    },
    AddCategory {
        store_id: String,
        name: String,
    },
    RenameCategory {
        store_id: String,
        category_id: String,
        name: String,
    },
    DeleteCategory {
        store_id: String,
        category_id: String,
    },
    MoveCategory {
        store_id: String,
        category_id: String,
        direction: Direction,
    },
    AddItem {
        store_id: String,
        category_id: String,
        name: String,
    },
    EditItem {
        store_id: String,
        category_id: String,
        item_id: String,
        name: String,
        new_store_id: Option<String>,
        new_category_id: Option<String>,
    },
    DeleteItem {
        store_id: String,
        category_id: String,
        item_id: String,
    },
    MoveItem {
        store_id: String,
        category_id: String,
        item_id: String,
        direction: Direction,
    },
    DuplicateItem {
        store_id: String,
        category_id: String,
        item_id: String,
        dest_store_id: String,
        dest_category_id: String,
    },
    CreateList {
        name: String,
    },
    SelectList {
        list_id: String,
    },
    ArchiveList {
        list_id: String,
    },
    RestoreList {
        list_id: String,
    },
    DeleteArchivedList {
        list_id: String,
    },
    AddToActiveList {
        store_id: String,
        category_id: String,
        item_id: String,
    },
    RemoveLineItem {
        list_id: String,
        line_item_id: String,
    },
    ToggleChecked {
        list_id: String,
        line_item_id: String,
    },
    ReorderGroup {
        list_id: String,
        store_id: String,
        category_id: String,
        line_item_ids: Vec<String>,
    },
    CopyItems {
        source_list_id: String,
        destination_list_id: String,
    },
}

/// What a dispatched intent produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Outcome {
    Created { id: String },
    LineItemAdded { line_item: LineItem },
    Updated,
    Moved { changed: bool },
    Toggled { checked: bool },
    Reordered { count: usize },
    Copied { items_copied: usize, message: String },
}

impl<P: Persistence> GroceryEngine<P> {
    /// Runs one intent.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome, GroceryError> {
        use Intent::*;

        let outcome = match intent {
            AddStore { name } => Outcome::Created {
                id: self.add_store(&name)?,
            },
            RenameStore { store_id, name } => {
                self.rename_store(&store_id, &name)?;
                Outcome::Updated
            }
            DeleteStore { store_id } => {
                self.delete_store(&store_id)?;
                Outcome::Updated
            }
            MoveStore {
                store_id,
                direction,
            } => Outcome::Moved {
                changed: self.move_store(&store_id, direction)?,
            },
            AddCategory { store_id, name } => Outcome::Created {
                id: self.add_category(&store_id, &name)?,
            },
            RenameCategory {
                store_id,
                category_id,
                name,
            } => {
                self.rename_category(&store_id, &category_id, &name)?;
                Outcome::Updated
            }
            DeleteCategory {
                store_id,
                category_id,
            } => {
                self.delete_category(&store_id, &category_id)?;
                Outcome::Updated
            }
            MoveCategory {
                store_id,
                category_id,
                direction,
            } => Outcome::Moved {
                changed: self.move_category(&store_id, &category_id, direction)?,
            },
            AddItem {
                store_id,
                category_id,
                name,
            } => Outcome::Created {
                id: self.add_item(&store_id, &category_id, &name)?,
            },
            EditItem {
                store_id,
                category_id,
                item_id,
                name,
                new_store_id,
                new_category_id,
            } => {
                self.edit_item(
                    &store_id,
                    &category_id,
                    &item_id,
                    &name,
                    new_store_id.as_deref(),
                    new_category_id.as_deref(),
                )?;
                Outcome::Updated
            }
            DeleteItem {
                store_id,
                category_id,
                item_id,
            } => {
                self.delete_item(&store_id, &category_id, &item_id)?;
                Outcome::Updated
            }
            MoveItem {
                store_id,
                category_id,
                item_id,
                direction,
            } => Outcome::Moved {
                changed: self.move_item(&store_id, &category_id, &item_id, direction)?,
            },
            DuplicateItem {
                store_id,
                category_id,
                item_id,
                dest_store_id,
                dest_category_id,
            } => Outcome::Created {
                id: self.duplicate_item(
                    &store_id,
                    &category_id,
                    &item_id,
                    &dest_store_id,
                    &dest_category_id,
                )?,
            },
            CreateList { name } => Outcome::Created {
                id: self.create_list(&name)?,
            },
            SelectList { list_id } => {
                self.select_list(&list_id)?;
                Outcome::Updated
            }
            ArchiveList { list_id } => {
                self.archive_list(&list_id)?;
                Outcome::Updated
            }
            RestoreList { list_id } => {
                self.restore_list(&list_id)?;
                Outcome::Updated
            }
            DeleteArchivedList { list_id } => {
                self.delete_archived_list(&list_id)?;
                Outcome::Updated
            }
            AddToActiveList {
                store_id,
                category_id,
                item_id,
            } => Outcome::LineItemAdded {
                line_item: self.add_item_to_active_list(&store_id, &category_id, &item_id)?,
            },
            RemoveLineItem {
                list_id,
                line_item_id,
            } => {
                self.remove_line_item(&list_id, &line_item_id)?;
                Outcome::Updated
            }
            ToggleChecked {
                list_id,
                line_item_id,
            } => Outcome::Toggled {
                checked: self.toggle_checked(&list_id, &line_item_id)?,
            },
            ReorderGroup {
                list_id,
                store_id,
                category_id,
                line_item_ids,
            } => Outcome::Reordered {
                count: self.reorder_within_group(&list_id, &store_id, &category_id, &line_item_ids)?,
            },
            CopyItems {
                source_list_id,
                destination_list_id,
            } => {
                let items_copied = self.copy_items(&source_list_id, &destination_list_id)?;
                Outcome::Copied {
                    items_copied,
                    message: copy_message(items_copied),
                }
            }
        };
        Ok(outcome)
    }
}
