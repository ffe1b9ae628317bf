use std::sync::Arc;

use clap::Parser;
use photosky::{
    cli::{print_notifications, Args, Shell},
    gallery::GalleryController,
    gallery_api::GalleryApiClient,
    preference::{PreferenceState, SystemThemeSignal},
    storage::HttpStorageUploader,
    types::Environment,
};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let environment = Environment::from_env();

    // JSON logs for staging/production, plain logs for development.
    // Logs go to stderr so they stay out of the interactive output.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = environment.client_config(args.api_url.as_deref())?;
    info!("Using gallery backend at {}", config.api_url);

    let api = Arc::new(GalleryApiClient::new(&config)?);
    let storage = Arc::new(HttpStorageUploader::new(&config)?);
    let (gallery, notifications) = GalleryController::new(api, storage);

    let printer = tokio::spawn(print_notifications(notifications));

    let preference =
        PreferenceState::new(Box::new(SystemThemeSignal)).with_preference(args.theme);

    // The shell owns the last handle to the gallery; once it returns, the
    // notification channel closes and the printer drains what is left.
    let result = Shell::new(Arc::new(gallery), preference).run().await;
    printer.await?;
    result
}
