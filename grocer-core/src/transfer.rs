//! Import and export file format.
//!
//! ```json
//! { "version": 2, "exportedAt": "2024-05-01T12:00:00Z",
//!   "appData": { "lists": [], "archivedLists": [], "masterStores": [] } }
//! ```
//!
//! Files holding only the bare `appData` object, as written by older
//! versions, are accepted on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::AppData;

pub const EXPORT_VERSION: u32 = 2;

const REQUIRED_ARRAYS: [&str; 3] = ["lists", "archivedLists", "masterStores"];

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid import file: {0}")]
    Invalid(String),

    #[error("Unsupported export version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub app_data: AppData,
}

impl ExportEnvelope {
    pub fn new(app_data: AppData) -> Self {
        Self {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            app_data,
        }
    }

    pub fn to_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parses and validates an import file.
pub fn parse_import(content: &str) -> Result<AppData, TransferError> {
    let value: Value = serde_json::from_str(content)?;
    validate_import(value)
}

/// Validates an already-parsed import document.
///
/// All three arrays must be present before anything is accepted.
pub fn validate_import(value: Value) -> Result<AppData, TransferError> {
    let Value::Object(mut root) = value else {
        return Err(TransferError::Invalid(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    let app_data = match root.remove("appData") {
        Some(app_data) => {
            let version = root.get("version").and_then(Value::as_u64).ok_or_else(|| {
                TransferError::Invalid("missing or non-numeric \"version\"".to_string())
            })?;
            if version > u64::from(EXPORT_VERSION) {
                return Err(TransferError::UnsupportedVersion {
                    found: version,
                    supported: EXPORT_VERSION,
                });
            }
            app_data
        }
        None => Value::Object(root),
    };

    let Some(fields) = app_data.as_object() else {
        return Err(TransferError::Invalid("\"appData\" must be an object".to_string()));
    };
    let missing: Vec<&str> = REQUIRED_ARRAYS
        .iter()
        .copied()
        .filter(|key| !fields.get(*key).is_some_and(Value::is_array))
        .collect();
    if !missing.is_empty() {
        return Err(TransferError::Invalid(format!(
            "missing array(s): {}",
            missing.join(", ")
        )));
    }

    Ok(serde_json::from_value(app_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShoppingList;

    #[test]
    fn test_export_shape() {
        let mut data = AppData::default();
        data.lists.push(ShoppingList::new("l1", "Weekly"));
        let json = ExportEnvelope::new(data).to_json().unwrap();

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 2);
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["appData"]["lists"][0]["id"], "l1");
        assert!(value["appData"]["masterStores"].is_array());

        let back = parse_import(&json).unwrap();
        assert_eq!(back.lists[0].id, "l1");
    }

    #[test]
    fn test_import_requires_all_arrays() {
        let json = r#"{"version": 2, "exportedAt": "2024-05-01T12:00:00Z",
                       "appData": {"lists": [], "masterStores": {}}}"#;
        let err = parse_import(json).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("archivedLists"));
        assert!(message.contains("masterStores"));
        assert!(!message.contains("lists,"));
    }

    #[test]
    fn test_import_accepts_bare_app_data() {
        let json = r#"{"lists": [], "archivedLists": [], "masterStores": [
            {"id": "s1", "name": "Market", "order": 0, "categories": [
                {"id": "c1", "name": "General", "order": 0, "items": []}]}]}"#;
        let data = parse_import(json).unwrap();
        assert_eq!(data.master_stores.stores()[0].name, "Market");
    }

    #[test]
    fn test_import_rejects_newer_version() {
        let json = r#"{"version": 9, "appData": {"lists": [], "archivedLists": [], "masterStores": []}}"#;
        assert!(matches!(
            parse_import(json),
            Err(TransferError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_import_rejects_non_object() {
        assert!(matches!(parse_import("[1, 2]"), Err(TransferError::Invalid(_))));
        assert!(matches!(parse_import("{oops"), Err(TransferError::Json(_))));
    }
}
