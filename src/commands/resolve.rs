//! Look up catalog and list entries by id or by name.
//!
//! An exact id match wins. Otherwise the name is matched
//! case-insensitively and must be unique.

use grocer_core::{Catalog, Category, Item, LineItem, ListStore, ShoppingList, Store};

type Lookup<'a, T> = Result<&'a T, Box<dyn std::error::Error>>;

trait Named {
    const WHAT: &'static str;
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

macro_rules! named {
    ($($ty:ty => $what:literal),* $(,)?) => {
        $(impl Named for $ty {
            const WHAT: &'static str = $what;
            fn id(&self) -> &str {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

named! {
    Store => "Store",
    Category => "Category",
    Item => "Item",
    ShoppingList => "List",
    LineItem => "Line item",
}

fn pick<'a, T: Named>(entries: &'a [T], ident: &str) -> Lookup<'a, T> {
    if let Some(entry) = entries.iter().find(|e| e.id() == ident) {
        return Ok(entry);
    }
    let wanted = ident.trim().to_lowercase();
    let mut matches = entries.iter().filter(|e| e.name().to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry),
        (Some(_), Some(_)) => {
            Err(format!("{} name '{}' is ambiguous, use the id", T::WHAT, ident).into())
        }
        (None, _) => Err(format!("{} not found: {}", T::WHAT, ident).into()),
    }
}

pub fn store<'a>(catalog: &'a Catalog, ident: &str) -> Lookup<'a, Store> {
    pick(catalog.stores(), ident)
}

pub fn category<'a>(store: &'a Store, ident: &str) -> Lookup<'a, Category> {
    pick(&store.categories, ident)
}

pub fn item<'a>(category: &'a Category, ident: &str) -> Lookup<'a, Item> {
    pick(&category.items, ident)
}

/// Resolves a store and category pair, returning their ids.
pub fn location(
    catalog: &Catalog,
    store_ident: &str,
    category_ident: &str,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let store = store(catalog, store_ident)?;
    let category = category(store, category_ident)?;
    Ok((store.id.clone(), category.id.clone()))
}

/// Resolves a store, category and item, returning their ids.
pub fn item_path(
    catalog: &Catalog,
    store_ident: &str,
    category_ident: &str,
    item_ident: &str,
) -> Result<(String, String, String), Box<dyn std::error::Error>> {
    let store = store(catalog, store_ident)?;
    let category = category(store, category_ident)?;
    let item = item(category, item_ident)?;
    Ok((store.id.clone(), category.id.clone(), item.id.clone()))
}

/// Active lists are searched before archived ones.
pub fn list<'a>(lists: &'a ListStore, ident: &str) -> Lookup<'a, ShoppingList> {
    pick(lists.lists(), ident).or_else(|_| pick(lists.archived_lists(), ident))
}

pub fn line_item<'a>(list: &'a ShoppingList, ident: &str) -> Lookup<'a, LineItem> {
    pick(&list.items, ident)
}
