// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

mod fake_backend;
pub use fake_backend::*;
mod gallery_setup;
pub use gallery_setup::*;

use gallery_types::Image;

/// Initialize tracing for tests
pub fn setup_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn image(id: &str, url: &str) -> Image {
    Image {
        id: id.to_string(),
        url: url.to_string(),
    }
}

/// Yields to the runtime until `condition` holds
///
/// # Panics
///
/// Panics if the condition does not hold after many scheduler turns
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
