//! File and camera acquisition
//!
//! The gallery never talks to a picker or camera directly; it is handed a
//! `FileSource` per action and awaits one `FileBlob` from it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

use crate::types::{GalleryError, GalleryResult};

/// Length of the random suffix in captured file names
const CAPTURE_SUFFIX_LEN: usize = 13;

/// Raw file ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// File contents
    pub bytes: Vec<u8>,
    /// Name proposed for the stored object
    pub filename: String,
    /// Declared content type
    pub mime_type: String,
}

/// Trait for anything that can produce a file on request
#[async_trait::async_trait]
pub trait FileSource: Send + Sync {
    /// Produces one file, or `GalleryError::NoFileSelected` if the user backed out
    async fn pick_file(&self) -> GalleryResult<FileBlob>;
}

/// Picks an existing file from the local filesystem
pub struct PathFileSource {
    path: PathBuf,
}

impl PathFileSource {
    /// Source that picks the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FileSource for PathFileSource {
    async fn pick_file(&self) -> GalleryResult<FileBlob> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            // Nothing at the picked path means nothing was picked
            ErrorKind::NotFound => {
                debug!("Nothing to pick at {}", self.path.display());
                GalleryError::NoFileSelected
            }
            _ => {
                warn!("Could not read {}: {e}", self.path.display());
                GalleryError::FileRead(format!("{}: {e}", self.path.display()))
            }
        })?;

        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(GalleryError::NoFileSelected)?;

        Ok(FileBlob {
            bytes,
            mime_type: guess_mime_type(&self.path),
            filename,
        })
    }
}

/// Treats a file on disk as a photo just taken by the camera
///
/// The picture is renamed to a unique `captured-image-*.jpg` name and always
/// declared as JPEG.
pub struct CapturedPhotoSource {
    path: PathBuf,
}

impl CapturedPhotoSource {
    /// Camera whose picture is the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FileSource for CapturedPhotoSource {
    async fn pick_file(&self) -> GalleryResult<FileBlob> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => GalleryError::NoFileSelected,
            _ => GalleryError::Capture(format!("{}: {e}", self.path.display())),
        })?;

        Ok(FileBlob {
            bytes,
            filename: captured_file_name(),
            mime_type: mime::IMAGE_JPEG.to_string(),
        })
    }
}

/// Unique name for a freshly captured picture
#[must_use]
pub fn captured_file_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CAPTURE_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();

    format!(
        "captured-image-{}-{suffix}.jpg",
        Utc::now().timestamp_millis()
    )
}

fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

/// Scripted file sources for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{FileBlob, FileSource, GalleryError, GalleryResult};

    /// Source that answers every pick with the same outcome
    pub struct MockFileSource {
        outcome: GalleryResult<FileBlob>,
        picks: AtomicUsize,
    }

    impl MockFileSource {
        /// Source that answers with `outcome`
        #[must_use]
        pub const fn new(outcome: GalleryResult<FileBlob>) -> Self {
            Self {
                outcome,
                picks: AtomicUsize::new(0),
            }
        }

        /// Source that yields the given file
        #[must_use]
        pub fn file(filename: &str, mime_type: &str, bytes: &[u8]) -> Self {
            Self::new(Ok(FileBlob {
                bytes: bytes.to_vec(),
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
            }))
        }

        /// Source whose pick is always cancelled
        #[must_use]
        pub const fn cancelled() -> Self {
            Self::new(Err(GalleryError::NoFileSelected))
        }

        /// Number of picks so far
        #[must_use]
        pub fn picks(&self) -> usize {
            self.picks.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl FileSource for MockFileSource {
        async fn pick_file(&self) -> GalleryResult<FileBlob> {
            self.picks.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }
}
