//! PhotoSky gallery client

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Terminal front end
pub mod cli;

/// File and camera acquisition
pub mod file_source;

/// Gallery state machine
pub mod gallery;

/// HTTP client for the gallery backend
pub mod gallery_api;

/// Operation outcome events
pub mod notification;

/// Display-mode preference
pub mod preference;

/// Direct-to-storage uploads
pub mod storage;

/// Configuration and error types
pub mod types;

/// Two-phase upload protocol
pub mod uploader;
