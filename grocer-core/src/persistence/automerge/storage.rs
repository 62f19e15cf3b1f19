//! On-disk layout for the Automerge adapter.

use automerge::AutoCommit;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::DocType;
use crate::persistence::PersistenceError;

const ACTIVE_LIST_FILE: &str = "active_list";

/// Loads and saves documents in a data directory.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    data_dir: PathBuf,
}

impl DocumentStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full path for a document type.
    pub fn path(&self, doc_type: DocType) -> PathBuf {
        self.data_dir.join(doc_type.filename())
    }

    pub fn exists(&self, doc_type: DocType) -> bool {
        self.path(doc_type).exists()
    }

    /// Loads a document from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(&self, doc_type: DocType) -> Result<Option<AutoCommit>, PersistenceError> {
        let path = self.path(doc_type);

        match fs::read(&path) {
            Ok(bytes) => {
                let doc = AutoCommit::load(&bytes).map_err(|e| PersistenceError::Decode {
                    what: doc_type.filename(),
                    message: e.to_string(),
                })?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    pub fn load_or_create(&self, doc_type: DocType) -> Result<AutoCommit, PersistenceError> {
        Ok(self.load(doc_type)?.unwrap_or_else(AutoCommit::new))
    }

    /// Saves a document, creating the data directory if needed.
    ///
    /// The bytes go to a temporary file first and are renamed into place.
    pub fn save(&self, doc_type: DocType, doc: &mut AutoCommit) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        let path = self.path(doc_type);
        write_atomic(&path, &doc.save())
    }

    /// Reads the remembered active list id.
    pub fn load_active_list_id(&self) -> Result<Option<String>, PersistenceError> {
        let path = self.data_dir.join(ACTIVE_LIST_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    pub fn save_active_list_id(&self, list_id: &str) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        write_atomic(&self.data_dir.join(ACTIVE_LIST_FILE), list_id.as_bytes())
    }

    fn ensure_dir(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| PersistenceError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|source| PersistenceError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
