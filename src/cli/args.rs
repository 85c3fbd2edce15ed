//! Command-line argument parsing for Channels Fetcher
//!
//! This module defines the CLI structure using clap derive macros: single
//! URL downloads, offline decryption, profile documents and configuration
//! management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::files;

/// Channels Fetcher - download and decrypt feed videos
#[derive(Parser, Debug)]
#[command(
    name = "channels_fetcher",
    version,
    about = "Download, decrypt and save videos and pictures from channel feeds",
    long_about = "Fetches feed media over HTTP with progress reporting, decrypts the
leading part of encrypted videos with a seeded keystream and saves the result
atomically. Picture posts are bundled into a zip archive."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a single media URL
    Download(DownloadArgs),

    /// Decrypt an already downloaded file
    Decrypt(DecryptArgs),

    /// Download every entry of a profile document
    Profile(ProfileArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Media URL to fetch
    #[arg(short, long)]
    pub url: String,

    /// Decryption key (seed) of an encrypted video
    #[arg(short, long)]
    pub key: Option<String>,

    /// Output filename, with or without the .mp4 extension
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Encoding spec format to request (e.g. "xWT111")
    #[arg(short, long)]
    pub spec: Option<String>,

    /// Directory to save into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,

    /// Program that prints the keystream for a seed
    #[arg(long, value_name = "PROG", conflicts_with = "keystream_file")]
    pub keystream_cmd: Option<PathBuf>,

    /// File holding a precomputed keystream
    #[arg(long, value_name = "FILE")]
    pub keystream_file: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for offline decryption
#[derive(Args, Debug, Clone)]
pub struct DecryptArgs {
    /// Encrypted file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Decryption key (seed)
    #[arg(short, long)]
    pub key: String,

    /// Output file (defaults to <stem>_decrypted.<ext> next to the input)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    pub force: bool,

    /// Program that prints the keystream for a seed
    #[arg(long, value_name = "PROG", conflicts_with = "keystream_file")]
    pub keystream_cmd: Option<PathBuf>,

    /// File holding a precomputed keystream
    #[arg(long, value_name = "FILE")]
    pub keystream_file: Option<PathBuf>,
}

/// Arguments for the profile command
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// JSON document with one profile or an array of profiles
    #[arg(value_name = "FILE.json")]
    pub file: PathBuf,

    /// Encoding spec format to request for every media profile
    #[arg(short, long, conflicts_with = "highest")]
    pub spec: Option<String>,

    /// Request the highest quality (no spec parameter)
    #[arg(long)]
    pub highest: bool,

    /// Download the cover image as well
    #[arg(long)]
    pub cover: bool,

    /// Print the equivalent download commands instead of downloading
    #[arg(long)]
    pub print_command: bool,

    /// Directory to save into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,

        /// Where to write (defaults to the user configuration directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// Whether any verbosity flag was given on the command line
    pub fn has_verbosity_flags(&self) -> bool {
        self.global.quiet || self.global.verbose || self.global.very_verbose
    }
}

impl DownloadArgs {
    /// Reject arguments clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("--url must not be empty".to_string());
        }

        if self.key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err("--key must not be blank".to_string());
        }

        if self.spec.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("--spec must not be blank".to_string());
        }

        Ok(())
    }

    /// Requested filename without a trailing video extension
    ///
    /// The saver appends the extension itself, so `clip.mp4` and `clip`
    /// name the same file.
    pub fn file_stem(&self) -> Option<String> {
        let name = self.filename.as_deref()?.trim();
        let suffix = format!(".{}", files::VIDEO_EXTENSION);
        let stem = name.strip_suffix(suffix.as_str()).unwrap_or(name);
        if stem.is_empty() {
            None
        } else {
            Some(stem.to_string())
        }
    }
}

impl DecryptArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("--key must not be blank".to_string());
        }

        if self.output.as_deref() == Some(self.input.as_path()) {
            return Err("--output must differ from --input".to_string());
        }

        Ok(())
    }
}
