//! Error responses for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::{debug, error};

use grocer_core::{GroceryError, TransferError};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "invalid_input",
            message: message.into(),
        }
    }
}

impl From<GroceryError> for ApiError {
    fn from(e: GroceryError) -> Self {
        let status = match &e {
            GroceryError::NotFound { .. } => StatusCode::NOT_FOUND,
            GroceryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GroceryError::InvariantViolation(_) | GroceryError::DuplicateEntry { .. } => {
                StatusCode::CONFLICT
            }
            GroceryError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!(error = %e, "Request failed");
        } else {
            debug!(error = %e, "Request rejected");
        }
        Self {
            status,
            error: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "invalid_import",
            message: e.to_string(),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        error!(error = %e, "Engine task failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal_error",
            message: "The request could not be completed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.error.to_string(),
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grocer_core::EntityKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GroceryError::not_found(EntityKind::List, "l9"), StatusCode::NOT_FOUND),
            (
                GroceryError::InvalidInput("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                GroceryError::InvariantViolation("last list".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                GroceryError::DuplicateEntry {
                    item_id: "i1".to_string(),
                    list_id: "l1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_duplicate_keeps_kind() {
        let err = ApiError::from(GroceryError::DuplicateEntry {
            item_id: "i1".to_string(),
            list_id: "l1".to_string(),
        });
        assert_eq!(err.error, "duplicate_entry");
    }
}
