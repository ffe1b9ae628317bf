use std::sync::Arc;

use gallery_types::Image;
use photosky::{
    gallery::GalleryController,
    gallery_api::mock::MockGalleryApi,
    notification::Notification,
    storage::mock::MockStorageUploader,
};
use tokio::sync::Semaphore;

use super::setup_test_tracing;

/// Gallery controller wired to in-memory backend and storage
pub struct GalleryTestContext {
    pub api: Arc<MockGalleryApi>,
    pub storage: Arc<MockStorageUploader>,
    pub gallery: Arc<GalleryController>,
    pub notifications: flume::Receiver<Notification>,
}

impl GalleryTestContext {
    /// Context whose backend holds `server_images`
    pub fn new(server_images: Vec<Image>) -> Self {
        Self::from_api(MockGalleryApi::new(server_images))
    }

    /// Context whose backend calls each consume one permit from `gate`
    pub fn gated(server_images: Vec<Image>, gate: Arc<Semaphore>) -> Self {
        Self::from_api(MockGalleryApi::new(server_images).with_gate(gate))
    }

    fn from_api(api: MockGalleryApi) -> Self {
        setup_test_tracing();

        let api = Arc::new(api);
        let storage = Arc::new(MockStorageUploader::new());
        let (gallery, notifications) = GalleryController::new(api.clone(), storage.clone());

        Self {
            api,
            storage,
            gallery: Arc::new(gallery),
            notifications,
        }
    }

    /// Context that has already loaded `server_images` once
    ///
    /// The notification from the initial load is discarded.
    pub async fn loaded(server_images: Vec<Image>) -> Self {
        let context = Self::new(server_images);
        context.gallery.refresh().await.expect("initial refresh failed");
        context.drain_notifications();
        context
    }

    /// Notifications emitted since the last drain
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.notifications.try_iter().collect()
    }
}
