pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::session::SessionConfig;

#[derive(Parser)]
#[command(name = "fbzone")]
#[command(about = "Facebook media extractor", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/fbzone/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a timing preset instead of the configured browser timings
    #[arg(long, value_enum, global = true)]
    pub preset: Option<Preset>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Fast,
    Thorough,
}

impl Preset {
    /// Swap in the preset's timings, keeping the configured browser identity.
    pub fn apply(self, configured: &SessionConfig) -> SessionConfig {
        let timings = match self {
            Preset::Fast => SessionConfig::fast(),
            Preset::Thorough => SessionConfig::thorough(),
        };
        SessionConfig {
            headless: configured.headless,
            viewport_width: configured.viewport_width,
            viewport_height: configured.viewport_height,
            user_agent: configured.user_agent.clone(),
            chrome_executable: configured.chrome_executable.clone(),
            extra_args: configured.extra_args.clone(),
            ..timings
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print video metadata as JSON
    Scrape {
        /// Video page URL
        url: String,
    },
    /// Download the best photo from a photo page
    Photo {
        /// Photo page URL
        url: String,
        /// Output file (default: fbzone_hd_photo.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download a profile picture
    Profile {
        /// Profile page URL
        url: String,
        /// Output file (default: fbzone_profile_picture.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List ranked candidate URLs without downloading them
    Candidates {
        /// Page URL
        url: String,
        /// Rank profile picture candidates instead of photo candidates
        #[arg(long)]
        profile: bool,
    },
    /// Print the page title and description as JSON
    Description {
        /// Page URL
        url: String,
    },
}
