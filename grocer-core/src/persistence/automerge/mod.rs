//! Automerge-backed persistence.
//!
//! # Document Storage
//!
//! Each slice of state is one Automerge document in the data directory:
//! - `catalog.automerge`: map of store_id -> Store object
//! - `lists.automerge`: map of list_id -> active ShoppingList object
//! - `archived_lists.automerge`: map of list_id -> archived ShoppingList object
//! - `active_list`: text file with the selected list id
//!
//! Documents from other devices are folded in with [`Persistence::merge_remote`].

mod doc_type;
mod reader;
mod storage;
mod writer;

use automerge::AutoCommit;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub use doc_type::DocType;
pub use storage::DocumentStorage;

use super::{ChangeEvent, ChangeHub, LoadedData, Persistence, PersistenceError};
use crate::models::{AppData, Catalog, ShoppingList};

pub struct AutomergePersistence {
    storage: DocumentStorage,
    catalog: AutoCommit,
    lists: AutoCommit,
    archived: AutoCommit,
    hub: ChangeHub,
}

impl AutomergePersistence {
    /// Opens (or starts) the documents in `data_dir`.
    pub fn open(data_dir: PathBuf) -> Result<Self, PersistenceError> {
        let storage = DocumentStorage::new(data_dir);
        let catalog = storage.load_or_create(DocType::Catalog)?;
        let lists = storage.load_or_create(DocType::Lists)?;
        let archived = storage.load_or_create(DocType::ArchivedLists)?;
        info!(data_dir = %storage.data_dir().display(), "Opened document storage");
        Ok(Self {
            storage,
            catalog,
            lists,
            archived,
            hub: ChangeHub::new(),
        })
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    fn doc_mut(&mut self, doc_type: DocType) -> &mut AutoCommit {
        match doc_type {
            DocType::Catalog => &mut self.catalog,
            DocType::Lists => &mut self.lists,
            DocType::ArchivedLists => &mut self.archived,
        }
    }

    /// Current bytes of one document, for handing to another device.
    pub fn export_doc(&mut self, doc_type: DocType) -> Vec<u8> {
        self.doc_mut(doc_type).save()
    }

    /// Writes one document and publishes its new contents.
    fn persist(&mut self, doc_type: DocType) -> Result<(), PersistenceError> {
        let storage = self.storage.clone();
        storage.save(doc_type, self.doc_mut(doc_type))?;
        let event = self.event_for(doc_type)?;
        self.hub.publish(event);
        Ok(())
    }

    fn event_for(&self, doc_type: DocType) -> Result<ChangeEvent, PersistenceError> {
        Ok(match doc_type {
            DocType::Catalog => ChangeEvent::Catalog(reader::read_catalog(&self.catalog)?),
            DocType::Lists => ChangeEvent::Lists(reader::read_lists(&self.lists)?),
            DocType::ArchivedLists => {
                ChangeEvent::ArchivedLists(reader::read_archived_lists(&self.archived)?)
            }
        })
    }
}

impl Persistence for AutomergePersistence {
    fn load_all(&mut self) -> Result<LoadedData, PersistenceError> {
        Ok(LoadedData {
            data: AppData {
                lists: reader::read_lists(&self.lists)?,
                archived_lists: reader::read_archived_lists(&self.archived)?,
                master_stores: reader::read_catalog(&self.catalog)?,
            },
            active_list_id: self.storage.load_active_list_id()?,
        })
    }

    /// Merges a document saved by another device into ours.
    ///
    /// The merged document is written to disk and its contents published
    /// on the change feed, which is how other clients' edits reach the
    /// engine.
    fn merge_remote(
        &mut self,
        doc_type: DocType,
        bytes: &[u8],
    ) -> Result<ChangeEvent, PersistenceError> {
        let mut remote = AutoCommit::load(bytes).map_err(|e| PersistenceError::Decode {
            what: doc_type.filename(),
            message: e.to_string(),
        })?;
        self.doc_mut(doc_type).merge(&mut remote)?;
        let storage = self.storage.clone();
        storage.save(doc_type, self.doc_mut(doc_type))?;

        let event = self.event_for(doc_type)?;
        debug!(doc_type = %doc_type, "Merged remote document");
        self.hub.publish(event.clone());
        Ok(event)
    }

    fn save_catalog(&mut self, catalog: &Catalog) -> Result<(), PersistenceError> {
        writer::write_catalog(&mut self.catalog, catalog)?;
        self.persist(DocType::Catalog)
    }

    fn save_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        let doc_type = if list.is_archived() {
            DocType::ArchivedLists
        } else {
            DocType::Lists
        };
        writer::write_list(self.doc_mut(doc_type), list)?;
        self.persist(doc_type)
    }

    fn delete_list(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        writer::delete_list(&mut self.lists, list_id)?;
        self.persist(DocType::Lists)
    }

    fn archive_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        writer::write_list(&mut self.archived, list)?;
        self.persist(DocType::ArchivedLists)?;
        self.delete_list(&list.id)
    }

    fn restore_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        writer::write_list(&mut self.lists, list)?;
        self.persist(DocType::Lists)?;
        self.delete_archived_list(&list.id)
    }

    fn delete_archived_list(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        writer::delete_list(&mut self.archived, list_id)?;
        self.persist(DocType::ArchivedLists)
    }

    fn replace_all(&mut self, data: &AppData) -> Result<(), PersistenceError> {
        writer::write_catalog(&mut self.catalog, &data.master_stores)?;
        writer::write_lists(&mut self.lists, &data.lists)?;
        writer::write_lists(&mut self.archived, &data.archived_lists)?;
        for doc_type in DocType::ALL {
            self.persist(doc_type)?;
        }
        Ok(())
    }

    fn save_active_list_id(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        self.storage.save_active_list_id(list_id)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.hub.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use chrono::Utc;
    use tempfile::TempDir;

    fn list_with_item(id: &str) -> ShoppingList {
        let mut list = ShoppingList::new(id, "Weekly");
        list.items.push(LineItem {
            id: format!("{}-li", id),
            item_id: "i1".to_string(),
            name: "Apples".to_string(),
            store_id: "s1".to_string(),
            category_id: "c1".to_string(),
            checked: false,
            order: 0,
        });
        list
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        {
            let mut persistence = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
            persistence.save_list(&list_with_item("l1")).unwrap();
            persistence.save_list(&list_with_item("l2")).unwrap();
            persistence.save_active_list_id("l2").unwrap();
        }

        let mut reopened = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
        let loaded = reopened.load_all().unwrap();
        assert_eq!(loaded.data.lists.len(), 2);
        assert_eq!(loaded.active_list_id, Some("l2".to_string()));
        assert!(reopened.storage().exists(DocType::Lists));
    }

    #[test]
    fn test_archive_and_restore_move_between_documents() {
        let temp = TempDir::new().unwrap();
        let mut persistence = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
        let mut list = list_with_item("l1");
        persistence.save_list(&list).unwrap();

        list.archived_at = Some(Utc::now());
        persistence.archive_list(&list).unwrap();
        let loaded = persistence.load_all().unwrap();
        assert!(loaded.data.lists.is_empty());
        assert_eq!(loaded.data.archived_lists[0].id, "l1");

        list.archived_at = None;
        persistence.restore_list(&list).unwrap();
        let loaded = persistence.load_all().unwrap();
        assert_eq!(loaded.data.lists[0].id, "l1");
        assert!(loaded.data.archived_lists.is_empty());
    }

    #[tokio::test]
    async fn test_saves_publish_changes() {
        let temp = TempDir::new().unwrap();
        let mut persistence = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
        let mut rx = persistence.subscribe();

        persistence.save_list(&list_with_item("l1")).unwrap();
        match rx.recv().await.unwrap() {
            ChangeEvent::Lists(lists) => assert_eq!(lists[0].id, "l1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_merge_remote_combines_devices() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let mut device_a = AutomergePersistence::open(temp_a.path().to_path_buf()).unwrap();
        let mut device_b = AutomergePersistence::open(temp_b.path().to_path_buf()).unwrap();

        device_a.save_list(&list_with_item("from-a")).unwrap();
        device_b.save_list(&list_with_item("from-b")).unwrap();

        let mut rx = device_a.subscribe();
        let bytes = device_b.export_doc(DocType::Lists);
        let event = device_a.merge_remote(DocType::Lists, &bytes).unwrap();

        let ChangeEvent::Lists(lists) = event else {
            panic!("expected lists event");
        };
        let mut ids: Vec<String> = lists.into_iter().map(|l| l.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["from-a".to_string(), "from-b".to_string()]);
        assert!(matches!(rx.recv().await.unwrap(), ChangeEvent::Lists(_)));

        let reloaded = AutomergePersistence::open(temp_a.path().to_path_buf())
            .unwrap()
            .load_all()
            .unwrap();
        assert_eq!(reloaded.data.lists.len(), 2);
    }

    #[test]
    fn test_merge_remote_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let mut persistence = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
        let err = persistence
            .merge_remote(DocType::Catalog, b"garbage")
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Decode { .. }));
    }

    #[test]
    fn test_replace_all() {
        let temp = TempDir::new().unwrap();
        let mut persistence = AutomergePersistence::open(temp.path().to_path_buf()).unwrap();
        persistence.save_list(&list_with_item("old")).unwrap();

        let mut archived = list_with_item("arch");
        archived.archived_at = Some(Utc::now());
        let data = AppData {
            lists: vec![list_with_item("new")],
            archived_lists: vec![archived],
            master_stores: Catalog::default(),
        };
        persistence.replace_all(&data).unwrap();

        let loaded = persistence.load_all().unwrap();
        assert_eq!(loaded.data.lists.len(), 1);
        assert_eq!(loaded.data.lists[0].id, "new");
        assert_eq!(loaded.data.archived_lists[0].id, "arch");
    }
}
