use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::command::{Command, CommandError, HELP};
use crate::file_source::{CapturedPhotoSource, PathFileSource};
use crate::gallery::GalleryController;
use crate::notification::{Notification, Severity};
use crate::preference::PreferenceState;
use crate::types::GalleryResult;

/// Interactive line-oriented front end over a gallery
///
/// Gallery actions run as background tasks owned by the shell. Leaving the
/// shell waits for all of them, so every started action reports its outcome.
pub struct Shell {
    gallery: Arc<GalleryController>,
    preference: PreferenceState,
    actions: JoinSet<()>,
}

impl Shell {
    /// Creates a shell over `gallery`
    #[must_use]
    pub fn new(gallery: Arc<GalleryController>, preference: PreferenceState) -> Self {
        Self {
            gallery,
            preference,
            actions: JoinSet::new(),
        }
    }

    /// Handles commands from stdin until `quit` or EOF
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Loads the gallery, then handles commands from `input` until `quit` or EOF
    ///
    /// Returns once every action started from `input` has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` cannot be read
    pub async fn run_with<R>(mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.print_theme();
        self.spawn_action(|gallery| async move { gallery.refresh().await });

        let result = self.read_commands(input).await;
        self.wait_for_actions().await;
        result
    }

    async fn read_commands<R>(&mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.dispatch(command).await,
                Err(CommandError::Empty) => {}
                Err(e) => println!("{e}"),
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Refresh => {
                self.spawn_action(|gallery| async move { gallery.refresh().await });
            }
            Command::List => self.print_gallery().await,
            Command::Add(path) => {
                let source = PathFileSource::new(path);
                self.spawn_action(|gallery| async move { gallery.add(&source).await });
            }
            Command::Capture(path) => {
                let camera = CapturedPhotoSource::new(path);
                self.spawn_action(|gallery| async move { gallery.capture(&camera).await });
            }
            Command::Open(id) => {
                if self.gallery.open(&id).await {
                    self.print_gallery().await;
                } else {
                    println!("No image with id {id}");
                }
            }
            Command::Close => self.gallery.close().await,
            Command::Delete(id) => {
                let id = match id {
                    Some(id) => id,
                    None => match self.gallery.snapshot().await.selected {
                        Some(image) => image.id,
                        None => {
                            println!("No image open, use `delete <id>`");
                            return;
                        }
                    },
                };
                self.spawn_action(|gallery| async move { gallery.delete_one(&id).await });
            }
            Command::DeleteAll => {
                self.spawn_action(|gallery| async move { gallery.delete_all().await });
            }
            Command::Theme(None) => {
                self.preference.toggle();
                self.print_theme();
            }
            Command::Theme(Some(preference)) => {
                self.preference.set(preference);
                self.print_theme();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    /// Runs a gallery action in the background; its outcome arrives as a notification
    fn spawn_action<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(Arc<GalleryController>) -> Fut,
        Fut: Future<Output = GalleryResult<()>> + Send + 'static,
    {
        // Reap finished actions so a long session does not accumulate them
        while self.actions.try_join_next().is_some() {}

        let task = action(self.gallery.clone());
        self.actions.spawn(async move {
            if let Err(e) = task.await {
                debug!("Gallery action finished with: {e}");
            }
        });
    }

    async fn wait_for_actions(&mut self) {
        if !self.actions.is_empty() {
            info!("Waiting for {} gallery actions to finish", self.actions.len());
        }
        while let Some(joined) = self.actions.join_next().await {
            if let Err(e) = joined {
                error!("Gallery action did not complete: {e}");
            }
        }
    }

    async fn print_gallery(&self) {
        let snapshot = self.gallery.snapshot().await;

        if snapshot.images.is_empty() {
            println!("No images found, upload images to see them here.");
        }
        for (index, image) in snapshot.images.iter().enumerate() {
            println!("{:>3}. {}  {}", index + 1, image.id, image.url);
        }
        if let Some(selected) = &snapshot.selected {
            println!("Open: {} ({})", selected.id, selected.url);
        }
        if snapshot.busy {
            println!("(loading...)");
        }
    }

    fn print_theme(&self) {
        let mode = if self.preference.resolved_dark() {
            "dark"
        } else {
            "light"
        };
        println!("Theme: {} ({mode})", self.preference.preference());
    }
}

/// Prints gallery notifications until the gallery is dropped
///
/// Every notification sent before the drop is printed.
pub async fn print_notifications(receiver: flume::Receiver<Notification>) {
    while let Ok(notification) = receiver.recv_async().await {
        match (notification.severity, &notification.detail) {
            (Severity::Error, Some(detail)) => {
                println!("[error] {}: {detail}", notification.message);
            }
            (Severity::Error, None) => println!("[error] {}", notification.message),
            (Severity::Success, _) => println!("[ok] {}", notification.message),
        }
    }
}
