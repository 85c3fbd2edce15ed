//! channels_fetcher library
//!
//! Downloads video-feed assets described by profiles: streams them over HTTP
//! with throttled progress, XOR-decrypts the head of encrypted payloads with
//! a pluggable keystream generator and saves the result atomically.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
