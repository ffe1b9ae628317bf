//! Wire types of the PhotoSky gallery HTTP API

#![deny(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A stored photograph as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Opaque identifier assigned by the backend (the object key)
    pub id: String,
    /// Fetchable, possibly time-limited, address of the image bytes
    pub url: String,
}

/// Response body of `GET /list-images`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListImagesResponse {
    /// Every stored image, in server order
    pub images: Vec<Image>,
}

/// Request body of `POST /get-presigned-url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrlRequest {
    /// Proposed object name
    pub filename: String,
    /// Declared content type
    pub filetype: String,
}

/// Response body of `POST /get-presigned-url`
///
/// `fields` keeps the order the backend sent them in, since storage
/// policies are forwarded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrlResponse {
    /// Address the multipart form must be posted to
    pub url: String,
    /// Form fields required by the storage policy
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}
