//! Error taxonomy for catalog and shopping list operations.

use std::fmt;

use thiserror::Error;

use crate::persistence::PersistenceError;

/// The kind of entity an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Store,
    Category,
    Item,
    List,
    ArchivedList,
    LineItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Store => write!(f, "store"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::Item => write!(f, "item"),
            EntityKind::List => write!(f, "list"),
            EntityKind::ArchivedList => write!(f, "archived list"),
            EntityKind::LineItem => write!(f, "line item"),
        }
    }
}

/// Errors returned by every user-initiated operation.
///
/// None of these leave the in-memory model partially mutated: validation
/// failures abort before any change, and `PersistenceFailure` is only
/// returned after the optimistic change has been rolled back.
#[derive(Error, Debug)]
pub enum GroceryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvariantViolation(String),

    #[error("Item {item_id} is already in list {list_id}")]
    DuplicateEntry { item_id: String, list_id: String },

    #[error("Failed to save changes: {0}")]
    PersistenceFailure(#[from] PersistenceError),
}

impl GroceryError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        GroceryError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Duplicate adds are reported so the caller can tell the user, but
    /// they are not failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, GroceryError::DuplicateEntry { .. })
    }

    /// Short machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GroceryError::NotFound { .. } => "not_found",
            GroceryError::InvalidInput(_) => "invalid_input",
            GroceryError::InvariantViolation(_) => "invariant_violation",
            GroceryError::DuplicateEntry { .. } => "duplicate_entry",
            GroceryError::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

/// Trims a user supplied name, rejecting empty or whitespace-only input.
pub(crate) fn validate_name(name: &str, what: &str) -> Result<String, GroceryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GroceryError::InvalidInput(format!(
            "{} name cannot be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}
