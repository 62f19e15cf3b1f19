//! Readers that turn Automerge documents back into catalog and lists.

use automerge::{AutoCommit, ObjId, ReadDoc, ScalarValue, Value, ROOT};
use chrono::{DateTime, Utc};

use crate::models::{Catalog, Category, Item, LineItem, ShoppingList, Store};
use crate::persistence::PersistenceError;

/// Reads the catalog, stores sorted by their manual order.
pub fn read_catalog(doc: &AutoCommit) -> Result<Catalog, PersistenceError> {
    let mut stores = Vec::new();

    for key in doc.keys(ROOT) {
        if let Some((value, obj)) = doc.get(ROOT, key.as_str())? {
            if value.is_object() {
                stores.push(read_store(doc, &obj, &key)?);
            }
        }
    }

    stores.sort_by_key(|s| s.order);
    Ok(Catalog::new(stores))
}

fn read_store(doc: &AutoCommit, obj: &ObjId, id: &str) -> Result<Store, PersistenceError> {
    let categories = read_list_of(doc, obj, "categories", |doc, category_obj| {
        Ok(Category {
            id: get_string(doc, category_obj, "id")?.unwrap_or_default(),
            name: get_string(doc, category_obj, "name")?.unwrap_or_default(),
            order: get_i64(doc, category_obj, "order")?.unwrap_or_default(),
            items: read_list_of(doc, category_obj, "items", |doc, item_obj| {
                Ok(Item {
                    id: get_string(doc, item_obj, "id")?.unwrap_or_default(),
                    name: get_string(doc, item_obj, "name")?.unwrap_or_default(),
                    order: get_i64(doc, item_obj, "order")?.unwrap_or_default(),
                })
            })?,
        })
    })?;

    Ok(Store {
        id: id.to_string(),
        name: get_string(doc, obj, "name")?.unwrap_or_default(),
        order: get_i64(doc, obj, "order")?.unwrap_or_default(),
        categories,
    })
}

/// Reads every list, oldest first.
pub fn read_lists(doc: &AutoCommit) -> Result<Vec<ShoppingList>, PersistenceError> {
    let mut lists = Vec::new();

    for key in doc.keys(ROOT) {
        if let Some((value, obj)) = doc.get(ROOT, key.as_str())? {
            if value.is_object() {
                lists.push(read_list(doc, &obj, &key)?);
            }
        }
    }

    lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(lists)
}

/// Reads archived lists, most recently archived first.
pub fn read_archived_lists(doc: &AutoCommit) -> Result<Vec<ShoppingList>, PersistenceError> {
    let mut lists = read_lists(doc)?;
    lists.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
    Ok(lists)
}

fn read_list(doc: &AutoCommit, obj: &ObjId, id: &str) -> Result<ShoppingList, PersistenceError> {
    let items = read_list_of(doc, obj, "shoppingList", |doc, li| {
        Ok(LineItem {
            id: get_string(doc, li, "id")?.unwrap_or_default(),
            item_id: get_string(doc, li, "itemId")?.unwrap_or_default(),
            name: get_string(doc, li, "name")?.unwrap_or_default(),
            store_id: get_string(doc, li, "storeId")?.unwrap_or_default(),
            category_id: get_string(doc, li, "categoryId")?.unwrap_or_default(),
            checked: get_bool(doc, li, "checked")?.unwrap_or(false),
            order: get_i64(doc, li, "order")?.unwrap_or_default(),
        })
    })?;

    Ok(ShoppingList {
        id: id.to_string(),
        name: get_string(doc, obj, "name")?.unwrap_or_default(),
        created_at: get_timestamp(doc, obj, "createdAt")?.unwrap_or_else(Utc::now),
        archived_at: get_timestamp(doc, obj, "archivedAt")?,
        items,
    })
}

/// Applies `read` to every map in the list stored at `obj[key]`.
fn read_list_of<T>(
    doc: &AutoCommit,
    obj: &ObjId,
    key: &str,
    read: impl Fn(&AutoCommit, &ObjId) -> Result<T, PersistenceError>,
) -> Result<Vec<T>, PersistenceError> {
    let mut result = Vec::new();

    if let Some((value, list_obj)) = doc.get(obj, key)? {
        if value.is_object() {
            for i in 0..doc.length(&list_obj) {
                if let Some((entry, entry_obj)) = doc.get(&list_obj, i)? {
                    if entry.is_object() {
                        result.push(read(doc, &entry_obj)?);
                    }
                }
            }
        }
    }

    Ok(result)
}

fn get_string(doc: &AutoCommit, obj: &ObjId, key: &str) -> Result<Option<String>, PersistenceError> {
    Ok(doc
        .get(obj, key)?
        .and_then(|(value, _)| value.into_string().ok()))
}

fn get_i64(doc: &AutoCommit, obj: &ObjId, key: &str) -> Result<Option<i64>, PersistenceError> {
    Ok(doc.get(obj, key)?.and_then(|(value, _)| value.to_i64()))
}

fn get_bool(doc: &AutoCommit, obj: &ObjId, key: &str) -> Result<Option<bool>, PersistenceError> {
    Ok(doc.get(obj, key)?.and_then(|(value, _)| match value {
        Value::Scalar(scalar) => match scalar.as_ref() {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        },
        _ => None,
    }))
}

fn get_timestamp(
    doc: &AutoCommit,
    obj: &ObjId,
    key: &str,
) -> Result<Option<DateTime<Utc>>, PersistenceError> {
    Ok(get_string(doc, obj, key)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
