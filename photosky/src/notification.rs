//! Outcome events emitted by gallery operations.
//!
//! Each gallery action reports exactly one `Notification` (cancelled file
//! picks report none). A presentation layer drains them from the channel
//! returned by `GalleryController::new` and decides how to show them.

use strum::Display;

use crate::types::GalleryError;

/// Whether the operation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// The operation completed
    Success,
    /// The operation failed
    Error,
}

/// Operation a notification reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NotificationKind {
    /// Loading the image list
    Refresh,
    /// Uploading a picked file
    Upload,
    /// Deleting one image
    Delete,
    /// Deleting every image
    DeleteAll,
    /// Uploading a camera capture
    Capture,
}

impl NotificationKind {
    const fn success_message(self) -> &'static str {
        match self {
            Self::Refresh => "Images loaded successfully",
            Self::Upload | Self::Capture => "Image uploaded successfully",
            Self::Delete => "Image deleted successfully",
            Self::DeleteAll => "All images deleted successfully",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Refresh => "Error fetching images",
            Self::Upload => "Error uploading image",
            Self::Delete => "Error deleting image",
            Self::DeleteAll => "Error deleting all images",
            Self::Capture => "Error capturing image",
        }
    }
}

/// A user-facing outcome of one gallery action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Action being reported on
    pub kind: NotificationKind,
    /// Outcome of the action
    pub severity: Severity,
    /// Short text suitable for a toast
    pub message: &'static str,
    /// Underlying error, for failures
    pub detail: Option<String>,
}

impl Notification {
    /// Notification for a successful action of `kind`
    #[must_use]
    pub const fn success(kind: NotificationKind) -> Self {
        Self {
            kind,
            severity: Severity::Success,
            message: kind.success_message(),
            detail: None,
        }
    }

    /// Notification for an action of `kind` that failed with `error`
    #[must_use]
    pub fn failure(kind: NotificationKind, error: &GalleryError) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: kind.failure_message(),
            detail: Some(error.to_string()),
        }
    }

    /// Notification for the outcome of an action of `kind`
    #[must_use]
    pub fn from_result<T>(kind: NotificationKind, result: &Result<T, GalleryError>) -> Self {
        match result {
            Ok(_) => Self::success(kind),
            Err(e) => Self::failure(kind, e),
        }
    }

    /// Whether the action failed
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
