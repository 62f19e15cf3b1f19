//! HTTP client for a running grocer server.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::ShoppingList;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Remote server not configured. Add server.url to config.")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-2xx status and an error body.
    #[error("Server returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Body of a successful copy call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyResponse {
    pub success: bool,
    pub items_copied: usize,
    pub message: String,
}

/// Body of a `/health` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Subset of `/api/state` the CLI needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLists {
    pub lists: Vec<ShoppingList>,
    pub archived_lists: Vec<ShoppingList>,
    pub active_list_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new(server_url: &str) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Ok(Self {
            base_url: normalize_base_url(server_url),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Copies items from `source_id` onto `destination_id` on the server.
    pub async fn copy_items(
        &self,
        destination_id: &str,
        source_id: &str,
    ) -> Result<CopyResponse, RemoteError> {
        let url = self.url(&format!(
            "/api/lists/{}/copy-from/{}",
            destination_id, source_id
        ));
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        read_json(response).await
    }

    pub async fn lists(&self) -> Result<RemoteLists, RemoteError> {
        let response = self
            .http
            .get(self.url("/api/state"))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        read_json(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse, RemoteError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        return Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .await
        .map_err(|e| RemoteError::Http(e.to_string()))
}

/// Accepts `host:port`, http(s) and ws(s) URLs.
fn normalize_base_url(server_url: &str) -> String {
    let base = if let Some(rest) = server_url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = server_url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };
    base.trim_end_matches('/').to_string()
}
