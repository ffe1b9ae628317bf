//! Direct-to-storage uploads using an issued credential

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::file_source::FileBlob;
use crate::gallery_api::UploadCredential;
use crate::types::{ClientConfig, GalleryError, GalleryResult};

/// Form field carrying the file bytes, after all credential fields
pub const FILE_FIELD_NAME: &str = "file";

/// Trait for posting one object to storage
#[async_trait::async_trait]
pub trait StorageUploader: Send + Sync {
    /// Posts `file` to the credential's target address
    ///
    /// The credential is consumed; a failed post is never retried with it.
    async fn post_object(&self, credential: UploadCredential, file: FileBlob) -> GalleryResult<()>;
}

/// Storage uploader speaking `multipart/form-data` over HTTP
pub struct HttpStorageUploader {
    http_client: Client,
}

impl HttpStorageUploader {
    /// Creates a new storage uploader
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Config` if the HTTP client fails to be created
    pub fn new(config: &ClientConfig) -> GalleryResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| GalleryError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }
}

/// Builds the upload form: every credential field in issued order, then the file
fn build_form(fields: impl IntoIterator<Item = (String, String)>, file: FileBlob) -> GalleryResult<Form> {
    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));

    let part = Part::bytes(file.bytes)
        .file_name(file.filename)
        .mime_str(&file.mime_type)
        .map_err(|e| GalleryError::Upload(format!("Invalid content type {}: {e}", file.mime_type)))?;

    Ok(form.part(FILE_FIELD_NAME, part))
}

#[async_trait::async_trait]
impl StorageUploader for HttpStorageUploader {
    #[instrument(skip_all, fields(target_url = %credential.target_url, filename = %file.filename))]
    async fn post_object(&self, credential: UploadCredential, file: FileBlob) -> GalleryResult<()> {
        let size = file.bytes.len();
        let form = build_form(credential.fields, file)?;

        let response = self
            .http_client
            .post(&credential.target_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GalleryError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GalleryError::Upload(format!(
                "Storage responded with {}",
                response.status()
            )));
        }

        debug!("Stored {size} bytes");
        Ok(())
    }
}

/// In-memory storage for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::{FileBlob, GalleryError, GalleryResult, StorageUploader, UploadCredential};

    /// One post received by `MockStorageUploader`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoragePost {
        /// Address the form was posted to
        pub target_url: String,
        /// Credential fields in the order they were sent
        pub fields: Vec<(String, String)>,
        /// Uploaded file
        pub file: FileBlob,
    }

    /// Storage that records posts instead of sending them
    #[derive(Default)]
    pub struct MockStorageUploader {
        fail: AtomicBool,
        posts: Mutex<Vec<StoragePost>>,
    }

    impl MockStorageUploader {
        /// Storage that accepts every post
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every post fail while set
        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        /// Posts received so far
        #[must_use]
        pub fn posts(&self) -> Vec<StoragePost> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl StorageUploader for MockStorageUploader {
        async fn post_object(
            &self,
            credential: UploadCredential,
            file: FileBlob,
        ) -> GalleryResult<()> {
            self.posts.lock().unwrap().push(StoragePost {
                target_url: credential.target_url,
                fields: credential.fields.into_iter().collect(),
                file,
            });

            if self.fail.load(Ordering::SeqCst) {
                return Err(GalleryError::Upload(
                    "Storage responded with 403 Forbidden".to_string(),
                ));
            }
            Ok(())
        }
    }
}
