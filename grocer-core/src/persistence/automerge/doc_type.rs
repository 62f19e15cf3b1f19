//! Document types held by the Automerge adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One Automerge document per slice of application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Catalog,
    Lists,
    ArchivedLists,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::Catalog, DocType::Lists, DocType::ArchivedLists];

    /// Returns the filename for this document type.
    pub fn filename(&self) -> &'static str {
        match self {
            DocType::Catalog => "catalog.automerge",
            DocType::Lists => "lists.automerge",
            DocType::ArchivedLists => "archived_lists.automerge",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocType::Catalog => write!(f, "catalog"),
            DocType::Lists => write!(f, "lists"),
            DocType::ArchivedLists => write!(f, "archived_lists"),
        }
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catalog" => Ok(DocType::Catalog),
            "lists" => Ok(DocType::Lists),
            "archived_lists" => Ok(DocType::ArchivedLists),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}
