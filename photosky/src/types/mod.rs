mod environment;
mod error;

pub use environment::{ClientConfig, Environment};
pub use error::{GalleryError, GalleryResult};
