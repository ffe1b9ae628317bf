use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::file_source::FileBlob;
use crate::gallery_api::GalleryApi;
use crate::storage::StorageUploader;
use crate::types::GalleryResult;

/// Runs the two-phase upload: obtain a credential, then post bytes to storage
///
/// The uploader only reports whether the write succeeded. Refreshing the
/// gallery afterwards is the caller's job.
pub struct Uploader {
    api: Arc<dyn GalleryApi>,
    storage: Arc<dyn StorageUploader>,
}

impl Uploader {
    /// Uploader requesting credentials from `api` and posting to `storage`
    #[must_use]
    pub fn new(api: Arc<dyn GalleryApi>, storage: Arc<dyn StorageUploader>) -> Self {
        Self { api, storage }
    }

    /// Uploads one file
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Credential` if the backend refuses a credential,
    /// in which case nothing is sent to storage.
    /// Returns `GalleryError::Upload` if storage rejects the post.
    #[instrument(skip_all, fields(filename = %file.filename, size = file.bytes.len()))]
    pub async fn upload(&self, file: FileBlob) -> GalleryResult<()> {
        let credential = self
            .api
            .request_upload_credential(&file.filename, &file.mime_type)
            .await?;

        debug!(
            "Obtained upload credential for {} with {} fields",
            credential.target_url,
            credential.fields.len()
        );

        self.storage.post_object(credential, file).await?;

        info!("Upload stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery_api::mock::MockGalleryApi;
    use crate::storage::mock::MockStorageUploader;
    use crate::types::GalleryError;

    fn jpeg() -> FileBlob {
        FileBlob {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            filename: "cat.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    fn setup() -> (Arc<MockGalleryApi>, Arc<MockStorageUploader>, Uploader) {
        let api = Arc::new(MockGalleryApi::new(Vec::new()));
        let storage = Arc::new(MockStorageUploader::new());
        let uploader = Uploader::new(api.clone(), storage.clone());
        (api, storage, uploader)
    }

    #[tokio::test]
    async fn test_upload_forwards_credential_fields_then_file() {
        let (api, storage, uploader) = setup();

        uploader.upload(jpeg()).await.unwrap();

        assert_eq!(
            api.credential_requests(),
            vec![("cat.jpg".to_string(), "image/jpeg".to_string())]
        );

        let posts = storage.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].target_url, "https://storage.test/bucket");
        assert_eq!(
            posts[0].fields,
            vec![
                ("key".to_string(), "cat.jpg".to_string()),
                ("policy".to_string(), "mock-policy".to_string()),
                ("x-amz-signature".to_string(), "mock-signature".to_string()),
            ]
        );
        assert_eq!(posts[0].file, jpeg());
    }

    #[tokio::test]
    async fn test_credential_failure_sends_nothing_to_storage() {
        let (api, storage, uploader) = setup();
        api.set_fail_credential(true);

        let result = uploader.upload(jpeg()).await;

        assert!(matches!(result, Err(GalleryError::Credential(_))));
        assert!(storage.posts().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_retried() {
        let (api, storage, uploader) = setup();
        storage.set_fail(true);

        let result = uploader.upload(jpeg()).await;

        assert!(matches!(result, Err(GalleryError::Upload(_))));
        assert_eq!(api.credential_requests().len(), 1);
        assert_eq!(storage.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_never_lists_images() {
        let (api, _storage, uploader) = setup();

        uploader.upload(jpeg()).await.unwrap();

        assert_eq!(api.list_calls(), 0);
    }
}
