//! Error types for gallery operations

use thiserror::Error;

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Errors that can occur while talking to the gallery backend or storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalleryError {
    /// Listing images failed
    #[error("Failed to fetch images: {0}")]
    Fetch(String),

    /// The backend did not issue an upload credential
    #[error("Failed to obtain upload credential: {0}")]
    Credential(String),

    /// Storage rejected the upload
    #[error("Failed to upload to storage: {0}")]
    Upload(String),

    /// One or more deletions failed
    #[error("Failed to delete image: {0}")]
    Delete(String),

    /// The user aborted file or camera selection
    #[error("No file selected")]
    NoFileSelected,

    /// The picked file exists but could not be read
    #[error("Failed to read file: {0}")]
    FileRead(String),

    /// The camera produced no usable picture
    #[error("Failed to capture image: {0}")]
    Capture(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GalleryError {
    /// Whether this error is a user cancellation rather than a failure
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::NoFileSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_file_selected_is_cancellation() {
        assert!(GalleryError::NoFileSelected.is_cancellation());
        assert!(!GalleryError::Upload("403 Forbidden".to_string()).is_cancellation());
        assert!(!GalleryError::Capture("camera busy".to_string()).is_cancellation());
        assert!(!GalleryError::FileRead("Is a directory".to_string()).is_cancellation());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GalleryError::Delete("2 of 5 deletions failed".to_string()).to_string(),
            "Failed to delete image: 2 of 5 deletions failed"
        );
        assert_eq!(GalleryError::NoFileSelected.to_string(), "No file selected");
    }
}
