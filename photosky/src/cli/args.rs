use clap::Parser;

use crate::preference::DisplayPreference;

/// Browse, upload and delete images in a PhotoSky gallery
#[derive(Debug, Parser)]
#[command(name = "photosky", version, about)]
pub struct Args {
    /// Gallery backend base address (overrides `API_URL`)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Initial display mode: light, dark or system
    #[arg(long, env = "PHOTOSKY_THEME", default_value_t = DisplayPreference::System)]
    pub theme: DisplayPreference,
}
