//! Command-line interface components
//!
//! This module contains CLI-specific code for the Channels Fetcher
//! application: argument parsing, command handlers and the progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DecryptArgs, DownloadArgs, GlobalArgs, ProfileArgs,
};
pub use commands::{
    build_decryptor, handle_config, handle_decrypt, handle_download, handle_profile,
};
pub use progress::{ProgressConfig, TransferProgress};
