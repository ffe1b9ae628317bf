use gallery_types::{Image, ListImagesResponse, PresignedUrlRequest, PresignedUrlResponse};
use indexmap::IndexMap;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use tracing::{debug, instrument};
use url::Url;

use crate::types::{ClientConfig, GalleryError, GalleryResult};

/// Short-lived authorization to write one object directly to storage
///
/// Consumed by value on upload so it cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCredential {
    /// Address the multipart form must be posted to
    pub target_url: String,
    /// Form fields required by the storage policy, in the order issued
    pub fields: IndexMap<String, String>,
}

impl From<PresignedUrlResponse> for UploadCredential {
    fn from(response: PresignedUrlResponse) -> Self {
        Self {
            target_url: response.url,
            fields: response.fields,
        }
    }
}

/// Trait for the gallery backend API
#[async_trait::async_trait]
pub trait GalleryApi: Send + Sync {
    /// Fetches the authoritative image list, in server order
    async fn list_images(&self) -> GalleryResult<Vec<Image>>;

    /// Asks the backend for a credential to upload one object
    async fn request_upload_credential(
        &self,
        filename: &str,
        mime_type: &str,
    ) -> GalleryResult<UploadCredential>;

    /// Deletes one image; the backend decides whether `id` exists
    async fn delete_image(&self, id: &str) -> GalleryResult<()>;
}

/// `GalleryApi` over HTTP, with request tracing
pub struct GalleryApiClient {
    api_url: Url,
    http_client: ClientWithMiddleware,
}

impl GalleryApiClient {
    /// Creates a new gallery API client
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Config` if the HTTP client fails to be created
    pub fn new(config: &ClientConfig) -> GalleryResult<Self> {
        let reqwest_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| GalleryError::Config(format!("Failed to create HTTP client: {e}")))?;

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            api_url: config.api_url.clone(),
            http_client,
        })
    }

    /// Appends `segments` to the base address, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // Base addresses are validated by `ClientConfig`, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl GalleryApi for GalleryApiClient {
    #[instrument(skip(self))]
    async fn list_images(&self) -> GalleryResult<Vec<Image>> {
        let response = self
            .http_client
            .get(self.endpoint(&["list-images"]))
            .send()
            .await
            .map_err(|e| GalleryError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GalleryError::Fetch(format!(
                "Backend responded with {}",
                response.status()
            )));
        }

        let body = response
            .json::<ListImagesResponse>()
            .await
            .map_err(|e| GalleryError::Fetch(format!("Invalid list response: {e}")))?;

        debug!("Fetched {} images", body.images.len());
        Ok(body.images)
    }

    #[instrument(skip(self))]
    async fn request_upload_credential(
        &self,
        filename: &str,
        mime_type: &str,
    ) -> GalleryResult<UploadCredential> {
        let request = PresignedUrlRequest {
            filename: filename.to_string(),
            filetype: mime_type.to_string(),
        };

        let json_body = serde_json::to_string(&request)
            .map_err(|e| GalleryError::Credential(format!("Failed to serialize request: {e}")))?;

        let response = self
            .http_client
            .post(self.endpoint(&["get-presigned-url"]))
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| GalleryError::Credential(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GalleryError::Credential(format!(
                "Backend responded with {}",
                response.status()
            )));
        }

        let body = response
            .json::<PresignedUrlResponse>()
            .await
            .map_err(|e| GalleryError::Credential(format!("Invalid credential response: {e}")))?;

        Ok(body.into())
    }

    #[instrument(skip(self))]
    async fn delete_image(&self, id: &str) -> GalleryResult<()> {
        let response = self
            .http_client
            .delete(self.endpoint(&["delete-image", id]))
            .send()
            .await
            .map_err(|e| GalleryError::Delete(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GalleryError::Delete(format!(
                "Backend responded with {} for {id}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// In-memory backend for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use gallery_types::Image;
    use indexmap::IndexMap;
    use tokio::sync::Semaphore;

    use super::{GalleryApi, GalleryError, GalleryResult, UploadCredential};

    /// In-memory gallery backend
    ///
    /// Holds a server-side image list that `delete_image` mutates, and
    /// records every call for assertions. An optional gate makes each call
    /// consume one semaphore permit before answering, so a test releases
    /// calls one by one with `add_permits`.
    #[derive(Default)]
    pub struct MockGalleryApi {
        images: Mutex<Vec<Image>>,
        fail_list: AtomicBool,
        fail_credential: AtomicBool,
        failing_deletes: Mutex<HashSet<String>>,
        gate: Option<Arc<Semaphore>>,
        list_calls: AtomicUsize,
        credential_requests: Mutex<Vec<(String, String)>>,
        delete_calls: Mutex<Vec<String>>,
        deletes_in_flight: AtomicUsize,
        max_concurrent_deletes: AtomicUsize,
    }

    impl MockGalleryApi {
        /// Backend that serves `images`
        #[must_use]
        pub fn new(images: Vec<Image>) -> Self {
            Self {
                images: Mutex::new(images),
                ..Self::default()
            }
        }

        /// Makes every call wait for a permit on `gate`
        #[must_use]
        pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        /// Replaces the server-side image list
        pub fn set_images(&self, images: Vec<Image>) {
            *self.images.lock().unwrap() = images;
        }

        /// Makes `list_images` fail while set
        pub fn set_fail_list(&self, fail: bool) {
            self.fail_list.store(fail, Ordering::SeqCst);
        }

        /// Makes `request_upload_credential` fail while set
        pub fn set_fail_credential(&self, fail: bool) {
            self.fail_credential.store(fail, Ordering::SeqCst);
        }

        /// Makes every deletion of `id` fail
        pub fn fail_delete(&self, id: &str) {
            self.failing_deletes.lock().unwrap().insert(id.to_string());
        }

        /// Number of `list_images` calls so far
        #[must_use]
        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        /// `(filename, mime_type)` of every credential request, in call order
        #[must_use]
        pub fn credential_requests(&self) -> Vec<(String, String)> {
            self.credential_requests.lock().unwrap().clone()
        }

        /// Ids passed to `delete_image`, in call order
        #[must_use]
        pub fn delete_calls(&self) -> Vec<String> {
            self.delete_calls.lock().unwrap().clone()
        }

        /// Highest number of deletions seen in flight at once
        #[must_use]
        pub fn max_concurrent_deletes(&self) -> usize {
            self.max_concurrent_deletes.load(Ordering::SeqCst)
        }

        async fn pass_gate(&self) {
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }
    }

    #[async_trait::async_trait]
    impl GalleryApi for MockGalleryApi {
        async fn list_images(&self) -> GalleryResult<Vec<Image>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;

            if self.fail_list.load(Ordering::SeqCst) {
                return Err(GalleryError::Fetch("Backend responded with 500".to_string()));
            }
            Ok(self.images.lock().unwrap().clone())
        }

        async fn request_upload_credential(
            &self,
            filename: &str,
            mime_type: &str,
        ) -> GalleryResult<UploadCredential> {
            self.credential_requests
                .lock()
                .unwrap()
                .push((filename.to_string(), mime_type.to_string()));
            self.pass_gate().await;

            if self.fail_credential.load(Ordering::SeqCst) {
                return Err(GalleryError::Credential(
                    "Backend responded with 500".to_string(),
                ));
            }

            let mut fields = IndexMap::new();
            fields.insert("key".to_string(), filename.to_string());
            fields.insert("policy".to_string(), "mock-policy".to_string());
            fields.insert("x-amz-signature".to_string(), "mock-signature".to_string());

            Ok(UploadCredential {
                target_url: "https://storage.test/bucket".to_string(),
                fields,
            })
        }

        async fn delete_image(&self, id: &str) -> GalleryResult<()> {
            self.delete_calls.lock().unwrap().push(id.to_string());

            let in_flight = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent_deletes
                .fetch_max(in_flight, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.pass_gate().await;
            self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing_deletes.lock().unwrap().contains(id) {
                return Err(GalleryError::Delete(format!(
                    "Backend responded with 500 for {id}"
                )));
            }

            self.images.lock().unwrap().retain(|image| image.id != id);
            Ok(())
        }
    }
}
