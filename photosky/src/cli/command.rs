use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::preference::DisplayPreference;

/// Command reference printed by `help`
pub const HELP: &str = "\
Commands:
  refresh            reload the image list
  list               show the current images
  add <path>         upload a file
  capture <path>     upload a photo as a fresh camera capture
  open <id>          open an image in the detail view
  close              close the detail view
  delete [<id>]      delete an image (defaults to the open one)
  delete-all         delete every image
  theme [<mode>]     cycle the display mode, or set light/dark/system
  help               show this help
  quit               exit";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload the image list
    Refresh,
    /// Print the current snapshot
    List,
    /// Upload the file at a path
    Add(PathBuf),
    /// Upload the file at a path as a camera capture
    Capture(PathBuf),
    /// Open the detail view on an image id
    Open(String),
    /// Close the detail view
    Close,
    /// Delete an image, or the open one
    Delete(Option<String>),
    /// Delete every known image
    DeleteAll,
    /// Cycle the display mode, or set it
    Theme(Option<DisplayPreference>),
    /// Print the command reference
    Help,
    /// Leave the shell
    Quit,
}

/// Why a line is not a command
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line
    #[error("")]
    Empty,

    /// Unrecognized command name
    #[error("Unknown command `{0}`, type `help` for a list of commands")]
    Unknown(String),

    /// Missing required argument
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// Unrecognized display mode
    #[error("Unknown theme `{0}`, expected light, dark or system")]
    Theme(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        // Everything after the command name is one argument; ids and paths may contain spaces
        let (name, argument) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));

        let required = |usage: &'static str| {
            if argument.is_empty() {
                Err(CommandError::Usage(usage))
            } else {
                Ok(argument.to_string())
            }
        };

        match name.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "refresh" => Ok(Self::Refresh),
            "list" | "ls" => Ok(Self::List),
            "add" | "upload" => required("add <path>").map(|path| Self::Add(path.into())),
            "capture" => required("capture <path>").map(|path| Self::Capture(path.into())),
            "open" => required("open <id>").map(Self::Open),
            "close" => Ok(Self::Close),
            "delete" | "rm" => Ok(Self::Delete(
                (!argument.is_empty()).then(|| argument.to_string()),
            )),
            "delete-all" => Ok(Self::DeleteAll),
            "theme" if argument.is_empty() => Ok(Self::Theme(None)),
            "theme" => argument
                .parse::<DisplayPreference>()
                .map(|preference| Self::Theme(Some(preference)))
                .map_err(|_| CommandError::Theme(argument.to_string())),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
