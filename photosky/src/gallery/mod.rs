//! Gallery state machine
//!
//! `GalleryController` owns the local snapshot of the remote image list and
//! the busy flag. Every mutating action ends by re-fetching the list rather
//! than patching it locally, so the snapshot only ever holds what the
//! backend last returned.

mod busy;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use futures::future::join_all;
use gallery_types::Image;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::file_source::{FileBlob, FileSource};
use crate::gallery_api::GalleryApi;
use crate::notification::{Notification, NotificationKind};
use crate::storage::StorageUploader;
use crate::types::{GalleryError, GalleryResult};
use crate::uploader::Uploader;

use busy::BusyGuard;

/// Point-in-time copy of the gallery state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySnapshot {
    /// Images in server order
    pub images: Vec<Image>,
    /// Whether any gallery operation is in flight
    pub busy: bool,
    /// Image open in the detail view
    pub selected: Option<Image>,
}

#[derive(Debug, Default)]
struct GalleryState {
    images: Vec<Image>,
    selected: Option<Image>,
}

/// Coordinates gallery actions against the backend
///
/// Actions may run concurrently; there is no queue. When two actions both
/// end in a refresh, the refresh that completes last decides the snapshot.
pub struct GalleryController {
    api: Arc<dyn GalleryApi>,
    uploader: Uploader,
    state: RwLock<GalleryState>,
    in_flight: AtomicUsize,
    notifications: flume::Sender<Notification>,
}

impl GalleryController {
    /// Creates a controller with an empty gallery
    ///
    /// Returns the controller and the receiving end of its notification channel.
    #[must_use]
    pub fn new(
        api: Arc<dyn GalleryApi>,
        storage: Arc<dyn StorageUploader>,
    ) -> (Self, flume::Receiver<Notification>) {
        let (notifications, receiver) = flume::unbounded();
        let controller = Self {
            uploader: Uploader::new(api.clone(), storage),
            api,
            state: RwLock::new(GalleryState::default()),
            in_flight: AtomicUsize::new(0),
            notifications,
        };
        (controller, receiver)
    }

    /// Current gallery state
    pub async fn snapshot(&self) -> GallerySnapshot {
        let state = self.state.read().await;
        GallerySnapshot {
            images: state.images.clone(),
            busy: self.is_busy(),
            selected: state.selected.clone(),
        }
    }

    /// Whether any gallery operation is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        BusyGuard::is_busy(&self.in_flight)
    }

    /// Replaces the local image list with the backend's
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Fetch` if listing fails; the previous images are kept
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> GalleryResult<()> {
        let _busy = BusyGuard::acquire(&self.in_flight);
        let result = self.reload().await;
        self.notify(NotificationKind::Refresh, &result);
        result
    }

    /// Picks a file from `source` and uploads it
    ///
    /// A cancelled pick is silent: no notification, no remote calls.
    ///
    /// # Errors
    ///
    /// Returns the pick error, `GalleryError::Credential` or `GalleryError::Upload`
    #[instrument(skip_all)]
    pub async fn add(&self, source: &dyn FileSource) -> GalleryResult<()> {
        let file = match source.pick_file().await {
            Ok(file) => file,
            Err(e) if e.is_cancellation() => {
                debug!("File selection cancelled");
                return Err(e);
            }
            Err(e) => {
                error!("File selection failed: {e}");
                self.notify(NotificationKind::Upload, &Err::<(), _>(e.clone()));
                return Err(e);
            }
        };

        self.upload_and_reload(file, NotificationKind::Upload).await
    }

    /// Takes a picture with `camera` and uploads it
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Capture` if the camera fails, otherwise as `add`
    #[instrument(skip_all)]
    pub async fn capture(&self, camera: &dyn FileSource) -> GalleryResult<()> {
        let file = match camera.pick_file().await {
            Ok(file) => file,
            Err(e) if e.is_cancellation() => {
                debug!("Capture cancelled");
                return Err(e);
            }
            Err(e) => {
                error!("Capture failed: {e}");
                self.notify(NotificationKind::Capture, &Err::<(), _>(e.clone()));
                return Err(e);
            }
        };

        self.upload_and_reload(file, NotificationKind::Capture).await
    }

    /// Deletes one image, then refreshes and closes the detail view
    ///
    /// On failure the snapshot and detail view are left as they were.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Delete` if the backend refuses the deletion
    #[instrument(skip(self))]
    pub async fn delete_one(&self, id: &str) -> GalleryResult<()> {
        let _busy = BusyGuard::acquire(&self.in_flight);

        let result = self.api.delete_image(id).await;
        match &result {
            Ok(()) => {
                info!("Deleted image {id}");
                self.reload_quietly().await;
                self.state.write().await.selected = None;
            }
            Err(e) => error!("Error deleting image {id}: {e}"),
        }

        self.notify(NotificationKind::Delete, &result);
        result
    }

    /// Deletes every currently known image concurrently, then refreshes
    ///
    /// The refresh runs once all deletions have settled, whether or not
    /// some of them failed.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Delete` naming how many deletions failed
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> GalleryResult<()> {
        let _busy = BusyGuard::acquire(&self.in_flight);

        let ids: Vec<String> = self
            .state
            .read()
            .await
            .images
            .iter()
            .map(|image| image.id.clone())
            .collect();

        let results = join_all(ids.iter().map(|id| self.api.delete_image(id))).await;
        let failed = results.iter().filter(|result| result.is_err()).count();

        self.reload_quietly().await;

        let result = if failed == 0 {
            info!("Deleted {} images", ids.len());
            Ok(())
        } else {
            error!("{failed} of {} deletions failed", ids.len());
            Err(GalleryError::Delete(format!(
                "{failed} of {} deletions failed",
                ids.len()
            )))
        };

        self.notify(NotificationKind::DeleteAll, &result);
        result
    }

    /// Opens the detail view on a known image
    ///
    /// Returns `false` if `id` is not in the current snapshot.
    pub async fn open(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let found = state.images.iter().find(|image| image.id == id).cloned();
        let opened = found.is_some();
        if opened {
            state.selected = found;
        }
        opened
    }

    /// Closes the detail view
    pub async fn close(&self) {
        self.state.write().await.selected = None;
    }

    async fn upload_and_reload(&self, file: FileBlob, kind: NotificationKind) -> GalleryResult<()> {
        let _busy = BusyGuard::acquire(&self.in_flight);

        let result = self.uploader.upload(file).await;
        match &result {
            Ok(()) => self.reload_quietly().await,
            Err(e) => error!("Error uploading image: {e}"),
        }

        self.notify(kind, &result);
        result
    }

    async fn reload(&self) -> GalleryResult<()> {
        match self.api.list_images().await {
            Ok(images) => {
                info!("Loaded {} images", images.len());
                self.state.write().await.images = images;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching images: {e}");
                Err(e)
            }
        }
    }

    /// Follow-up refresh after a mutation; its outcome is folded into the
    /// mutation's own notification.
    async fn reload_quietly(&self) {
        if let Err(e) = self.reload().await {
            warn!("Gallery may be stale until the next refresh: {e}");
        }
    }

    fn notify<T>(&self, kind: NotificationKind, result: &GalleryResult<T>) {
        if self
            .notifications
            .send(Notification::from_result(kind, result))
            .is_err()
        {
            debug!("No notification listener for {kind}");
        }
    }
}
