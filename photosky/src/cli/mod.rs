mod args;
mod command;
mod shell;

pub use args::Args;
pub use command::{Command, CommandError};
pub use shell::{print_notifications, Shell};
