//! Request handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use grocer_core::remote::HealthResponse;
use grocer_core::{
    copy_message, parse_import, Catalog, CopyResponse, DocType, ExportEnvelope, GroceryEngine,
    GroceryError, Intent, Outcome, Persistence, PersistenceError, ShoppingList,
};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Everything a client needs to render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub catalog: Catalog,
    pub lists: Vec<ShoppingList>,
    pub archived_lists: Vec<ShoppingList>,
    pub active_list_id: Option<String>,
}

impl StateResponse {
    fn from_engine<P: Persistence>(engine: &GroceryEngine<P>) -> Self {
        Self {
            catalog: engine.catalog().clone(),
            lists: engine.lists().lists().to_vec(),
            archived_lists: engine.lists().archived_lists().to_vec(),
            active_list_id: engine.lists().active_id().map(str::to_string),
        }
    }
}

pub async fn get_state<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
) -> Json<StateResponse> {
    Json(StateResponse::from_engine(&*state.engine().await))
}

pub async fn dispatch_intent<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
    Json(intent): Json<Intent>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.write(move |engine| engine.dispatch(intent)).await??;
    Ok(Json(outcome))
}

/// `POST /api/lists/{destination_id}/copy-from/{source_id}`
pub async fn copy_from<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
    Path((destination_id, source_id)): Path<(String, String)>,
) -> Result<Json<CopyResponse>, ApiError> {
    if destination_id == source_id {
        return Err(ApiError::bad_request(
            "Source and destination lists must be different",
        ));
    }
    let items_copied = state
        .write(move |engine| engine.copy_items(&source_id, &destination_id))
        .await??;
    Ok(Json(CopyResponse {
        success: true,
        items_copied,
        message: copy_message(items_copied),
    }))
}

pub async fn export<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
) -> Json<ExportEnvelope> {
    let data = state.engine().await.export_data();
    Json(ExportEnvelope::new(data))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub stores: usize,
    pub lists: usize,
    pub archived_lists: usize,
}

/// Replaces all state with the posted export file.
pub async fn import<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let data = parse_import(&body)?;
    let response = ImportResponse {
        stores: data.master_stores.stores().len(),
        lists: data.lists.len(),
        archived_lists: data.archived_lists.len(),
    };
    state.write(move |engine| engine.import_data(data)).await??;
    info!(
        stores = response.stores,
        lists = response.lists,
        "Import accepted"
    );
    Ok(Json(response))
}

/// `POST /api/sync/{doc_type}`
///
/// The body is a saved Automerge document from another device. It is merged
/// into ours and the merged slice replaces the engine's copy.
pub async fn sync_document<P: Persistence + 'static>(
    State(state): State<AppState<P>>,
    Path(doc_type): Path<String>,
    body: Bytes,
) -> Result<Json<StateResponse>, ApiError> {
    let doc_type: DocType = doc_type.parse().map_err(ApiError::bad_request)?;
    let size = body.len();
    let merged = state
        .write(move |engine| {
            engine
                .merge_remote(doc_type, &body)
                .map(|()| StateResponse::from_engine(&*engine))
        })
        .await?;
    let response = match merged {
        Ok(response) => response,
        Err(GroceryError::PersistenceFailure(e @ PersistenceError::Decode { .. })) => {
            return Err(ApiError::bad_request(e.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(doc_type = %doc_type, bytes = size, "Sync accepted");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_router;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use grocer_core::{
        AppData, AutomergePersistence, Catalog, EngineOptions, InMemoryPersistence, Store,
    };
    use tempfile::TempDir;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn sample_data() -> AppData {
        let catalog: Catalog = serde_json::from_value(json!([
            {"id": "s1", "name": "Market", "order": 0, "categories": [
                {"id": "c1", "name": "Produce", "order": 0, "items": [
                    {"id": "i1", "name": "Apples", "order": 0},
                    {"id": "i2", "name": "Pears", "order": 1}
                ]}
            ]}
        ]))
        .unwrap();
        let lists: Vec<ShoppingList> = serde_json::from_value(json!([
            {"id": "l1", "name": "Weekly", "createdAt": "2024-05-01T12:00:00Z", "shoppingList": [
                {"id": "li1", "itemId": "i1", "name": "Apples", "storeId": "s1", "categoryId": "c1",
                 "checked": true, "order": 0},
                {"id": "li2", "itemId": "i2", "name": "Pears", "storeId": "s1", "categoryId": "c1",
                 "checked": false, "order": 1}
            ]},
            {"id": "l2", "name": "Party", "createdAt": "2024-05-02T12:00:00Z", "shoppingList": []}
        ]))
        .unwrap();
        AppData {
            lists,
            archived_lists: Vec::new(),
            master_stores: catalog,
        }
    }

    fn app() -> (Router, AppState<InMemoryPersistence>) {
        let persistence = InMemoryPersistence::with_data(sample_data());
        let engine = GroceryEngine::load(persistence, EngineOptions::default()).unwrap();
        let state = AppState::new(engine);
        (create_router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_state_shape() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["catalog"][0]["name"], "Market");
        assert_eq!(json["lists"].as_array().unwrap().len(), 2);
        assert_eq!(json["activeListId"], "l1");
        assert!(json["archivedLists"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_from() {
        let (app, state) = app();
        let response = app
            .oneshot(post("/api/lists/l2/copy-from/l1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["itemsCopied"], 2);
        assert_eq!(json["message"], "Successfully copied 2 item(s).");

        let engine = state.engine().await;
        let party = engine.lists().list("l2").unwrap();
        assert_eq!(party.items.len(), 2);
        assert!(party.items.iter().all(|li| !li.checked));
    }

    #[tokio::test]
    async fn test_copy_nothing_new() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(post("/api/lists/l2/copy-from/l1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post("/api/lists/l2/copy-from/l1", Body::empty()))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["itemsCopied"], 0);
        assert_eq!(json["message"], "No new items to copy.");
    }

    #[tokio::test]
    async fn test_copy_same_list_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/lists/l1/copy-from/l1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_copy_missing_list() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/lists/l2/copy-from/nope", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_intent_dispatch() {
        let (app, state) = app();
        let body = json!({"type": "addStore", "name": "Bakery"}).to_string();
        let response = app.oneshot(post("/api/intents", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "created");

        let id = json["id"].as_str().unwrap().to_string();
        let engine = state.engine().await;
        let store: &Store = engine.catalog().store(&id).unwrap();
        assert_eq!(store.name, "Bakery");
        assert_eq!(store.categories[0].name, "General");
    }

    #[tokio::test]
    async fn test_intent_errors_map_to_status() {
        let (app, _) = app();
        let body = json!({"type": "addToActiveList", "storeId": "s1",
                          "categoryId": "c1", "itemId": "i1"})
        .to_string();
        let response = app.clone().oneshot(post("/api/intents", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"], "duplicate_entry");

        let body = json!({"type": "addStore", "name": "   "}).to_string();
        let response = app.oneshot(post("/api/intents", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_then_import() {
        let (app, state) = app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let exported = body_json(response).await;
        assert_eq!(exported["version"], 2);
        assert_eq!(exported["appData"]["lists"][0]["id"], "l1");

        state.engine().await.create_list("Scratch").unwrap();
        assert_eq!(state.engine().await.lists().lists().len(), 3);

        let response = app
            .oneshot(post("/api/import", exported.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["lists"], 2);
        assert_eq!(state.engine().await.lists().lists().len(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_incomplete_file() {
        let (app, state) = app();
        let body = json!({"version": 2, "appData": {"lists": []}}).to_string();
        let response = app.oneshot(post("/api/import", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_import");
        assert_eq!(state.engine().await.lists().lists().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_merges_document_from_another_device() {
        let server_dir = TempDir::new().unwrap();
        let phone_dir = TempDir::new().unwrap();
        let persistence = AutomergePersistence::open(server_dir.path().to_path_buf()).unwrap();
        let engine = GroceryEngine::load(persistence, EngineOptions::default()).unwrap();
        let app = create_router(AppState::new(engine));

        let mut phone = AutomergePersistence::open(phone_dir.path().to_path_buf()).unwrap();
        phone.save_list(&ShoppingList::new("phone", "From phone")).unwrap();
        let bytes = phone.export_doc(DocType::Lists);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync/lists")
                    .header("content-type", "application/octet-stream")
                    .body(Body::from(bytes))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        let names: Vec<&str> = json["lists"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"From phone"));
        assert!(names.contains(&"My First List"));

        let reloaded = AutomergePersistence::open(server_dir.path().to_path_buf())
            .unwrap()
            .load_all()
            .unwrap();
        assert_eq!(reloaded.data.lists.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_rejects_bad_requests() {
        let server_dir = TempDir::new().unwrap();
        let persistence = AutomergePersistence::open(server_dir.path().to_path_buf()).unwrap();
        let engine = GroceryEngine::load(persistence, EngineOptions::default()).unwrap();
        let app = create_router(AppState::new(engine));

        let response = app
            .clone()
            .oneshot(post("/api/sync/recipes", Body::from("x")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post("/api/sync/catalog", Body::from("not a document")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_sync_unsupported_by_memory_storage() {
        let (app, state) = app();
        let response = app
            .oneshot(post("/api/sync/lists", Body::from("x")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.engine().await.lists().lists().len(), 2);
    }
}
