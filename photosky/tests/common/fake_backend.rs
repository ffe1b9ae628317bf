use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use gallery_types::{Image, ListImagesResponse, PresignedUrlRequest, PresignedUrlResponse};
use indexmap::IndexMap;
use photosky::types::ClientConfig;
use tokio::net::TcpListener;

use super::setup_test_tracing;

/// One part of a multipart form received by the fake storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ReceivedPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Server-side state of the fake gallery backend and storage
#[derive(Default)]
pub struct FakeBackendState {
    pub images: Mutex<Vec<Image>>,
    pub fail_backend: AtomicBool,
    pub fail_storage: AtomicBool,
    pub credential_requests: Mutex<Vec<PresignedUrlRequest>>,
    pub deleted: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<Vec<ReceivedPart>>>,
    storage_url: String,
}

/// Gallery backend plus object storage served by axum on an ephemeral port
pub struct FakeBackend {
    pub base_url: String,
    pub storage_url: String,
    pub state: Arc<FakeBackendState>,
}

impl FakeBackend {
    pub async fn start(images: Vec<Image>) -> Self {
        setup_test_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let base_url = format!("http://{addr}");
        let storage_url = format!("{base_url}/storage/upload");
        let state = Arc::new(FakeBackendState {
            images: Mutex::new(images),
            storage_url: storage_url.clone(),
            ..FakeBackendState::default()
        });

        let router = Router::new()
            .route("/list-images", get(list_images))
            .route("/get-presigned-url", post(presigned_url))
            .route("/delete-image/{id}", delete(delete_image))
            .route("/storage/upload", post(storage_upload))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake backend stopped");
        });

        Self {
            base_url,
            storage_url,
            state,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, Duration::from_secs(5)).unwrap()
    }

    pub fn set_fail_backend(&self, fail: bool) {
        self.state.fail_backend.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_storage(&self, fail: bool) {
        self.state.fail_storage.store(fail, Ordering::SeqCst);
    }

    pub fn images(&self) -> Vec<Image> {
        self.state.images.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.deleted.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Vec<ReceivedPart>> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn credential_requests(&self) -> Vec<(String, String)> {
        self.state
            .credential_requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| (request.filename.clone(), request.filetype.clone()))
            .collect()
    }
}

async fn list_images(
    State(state): State<Arc<FakeBackendState>>,
) -> Result<Json<ListImagesResponse>, StatusCode> {
    if state.fail_backend.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(ListImagesResponse {
        images: state.images.lock().unwrap().clone(),
    }))
}

async fn presigned_url(
    State(state): State<Arc<FakeBackendState>>,
    Json(request): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, StatusCode> {
    if state.fail_backend.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let mut fields = IndexMap::new();
    fields.insert("key".to_string(), request.filename.clone());
    fields.insert("Content-Type".to_string(), request.filetype.clone());
    fields.insert("policy".to_string(), "eyJleHBpcmF0aW9uIjoifQ==".to_string());
    fields.insert("x-amz-signature".to_string(), "c2lnbmF0dXJl".to_string());

    state.credential_requests.lock().unwrap().push(request);

    Ok(Json(PresignedUrlResponse {
        url: state.storage_url.clone(),
        fields,
    }))
}

async fn delete_image(
    State(state): State<Arc<FakeBackendState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.fail_backend.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let mut images = state.images.lock().unwrap();
    let before = images.len();
    images.retain(|image| image.id != id);
    if images.len() == before {
        return StatusCode::NOT_FOUND;
    }

    state.deleted.lock().unwrap().push(id);
    StatusCode::NO_CONTENT
}

async fn storage_upload(
    State(state): State<Arc<FakeBackendState>>,
    mut multipart: Multipart,
) -> StatusCode {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|bytes| bytes.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    let key = parts
        .iter()
        .find(|part| part.name == "key")
        .map(ReceivedPart::text);
    state.uploads.lock().unwrap().push(parts);

    if state.fail_storage.load(Ordering::SeqCst) {
        return StatusCode::FORBIDDEN;
    }

    let Some(key) = key else {
        return StatusCode::BAD_REQUEST;
    };

    state.images.lock().unwrap().push(Image {
        url: format!("{}/{key}", state.storage_url),
        id: key,
    });
    StatusCode::NO_CONTENT
}
