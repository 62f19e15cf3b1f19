//! Writers for serializing catalog and lists into Automerge documents.
//!
//! The catalog document holds one map per store at `root[store.id]`. List
//! documents hold one map per list at `root[list.id]`.

use automerge::{transaction::Transactable, AutoCommit, AutomergeError, ObjId, ObjType, ROOT};
use std::collections::HashSet;

use crate::models::{Catalog, Category, LineItem, ShoppingList, Store};

/// Writes the whole catalog, dropping stores that no longer exist.
pub fn write_catalog(doc: &mut AutoCommit, catalog: &Catalog) -> Result<(), AutomergeError> {
    let wanted: HashSet<&str> = catalog.stores().iter().map(|s| s.id.as_str()).collect();
    remove_keys_except(doc, &wanted)?;
    for store in catalog.stores() {
        write_store(doc, store)?;
    }
    Ok(())
}

fn write_store(doc: &mut AutoCommit, store: &Store) -> Result<(), AutomergeError> {
    let store_obj = doc.put_object(ROOT, store.id.as_str(), ObjType::Map)?;
    doc.put(&store_obj, "name", store.name.as_str())?;
    doc.put(&store_obj, "order", store.order)?;

    let categories = doc.put_object(&store_obj, "categories", ObjType::List)?;
    for (i, category) in store.categories.iter().enumerate() {
        let category_obj = doc.insert_object(&categories, i, ObjType::Map)?;
        write_category(doc, &category_obj, category)?;
    }
    Ok(())
}

fn write_category(
    doc: &mut AutoCommit,
    obj: &ObjId,
    category: &Category,
) -> Result<(), AutomergeError> {
    doc.put(obj, "id", category.id.as_str())?;
    doc.put(obj, "name", category.name.as_str())?;
    doc.put(obj, "order", category.order)?;

    let items = doc.put_object(obj, "items", ObjType::List)?;
    for (i, item) in category.items.iter().enumerate() {
        let item_obj = doc.insert_object(&items, i, ObjType::Map)?;
        doc.put(&item_obj, "id", item.id.as_str())?;
        doc.put(&item_obj, "name", item.name.as_str())?;
        doc.put(&item_obj, "order", item.order)?;
    }
    Ok(())
}

/// Writes one list at `root[list.id]`, replacing any previous version.
pub fn write_list(doc: &mut AutoCommit, list: &ShoppingList) -> Result<(), AutomergeError> {
    let list_obj = doc.put_object(ROOT, list.id.as_str(), ObjType::Map)?;
    doc.put(&list_obj, "name", list.name.as_str())?;
    doc.put(&list_obj, "createdAt", list.created_at.to_rfc3339().as_str())?;
    if let Some(archived_at) = list.archived_at {
        doc.put(&list_obj, "archivedAt", archived_at.to_rfc3339().as_str())?;
    }

    let items = doc.put_object(&list_obj, "shoppingList", ObjType::List)?;
    for (i, line_item) in list.items.iter().enumerate() {
        let obj = doc.insert_object(&items, i, ObjType::Map)?;
        write_line_item(doc, &obj, line_item)?;
    }
    Ok(())
}

fn write_line_item(
    doc: &mut AutoCommit,
    obj: &ObjId,
    line_item: &LineItem,
) -> Result<(), AutomergeError> {
    doc.put(obj, "id", line_item.id.as_str())?;
    doc.put(obj, "itemId", line_item.item_id.as_str())?;
    doc.put(obj, "name", line_item.name.as_str())?;
    doc.put(obj, "storeId", line_item.store_id.as_str())?;
    doc.put(obj, "categoryId", line_item.category_id.as_str())?;
    doc.put(obj, "checked", line_item.checked)?;
    doc.put(obj, "order", line_item.order)?;
    Ok(())
}

/// Replaces every list in the document.
pub fn write_lists(doc: &mut AutoCommit, lists: &[ShoppingList]) -> Result<(), AutomergeError> {
    let wanted: HashSet<&str> = lists.iter().map(|l| l.id.as_str()).collect();
    remove_keys_except(doc, &wanted)?;
    for list in lists {
        write_list(doc, list)?;
    }
    Ok(())
}

/// Deletes a list. Missing ids are ignored.
pub fn delete_list(doc: &mut AutoCommit, list_id: &str) -> Result<(), AutomergeError> {
    use automerge::ReadDoc;

    if doc.get(ROOT, list_id)?.is_some() {
        doc.delete(ROOT, list_id)?;
    }
    Ok(())
}

fn remove_keys_except(doc: &mut AutoCommit, wanted: &HashSet<&str>) -> Result<(), AutomergeError> {
    use automerge::ReadDoc;

    let stale: Vec<String> = doc
        .keys(ROOT)
        .filter(|k| !wanted.contains(k.as_str()))
        .collect();
    for key in stale {
        doc.delete(ROOT, key.as_str())?;
    }
    Ok(())
}
