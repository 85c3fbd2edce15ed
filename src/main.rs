//! Channels Fetcher CLI application
//!
//! Command-line interface for downloading, decrypting and saving media from
//! channel feeds.

use std::process;

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use channels_fetcher::cli::{
    handle_config, handle_decrypt, handle_download, handle_profile, Cli, Commands, ConfigAction,
    ConfigArgs,
};
use channels_fetcher::config::AppConfig;
use channels_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // `config init` must work even when the existing file is broken
    let config = match &cli.command {
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        }) => AppConfig::default(),
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };

    init_logging(&cli, &config);

    info!("Channels Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, &config).await
        }
        Commands::Decrypt(args) => {
            info!("Executing decrypt command");
            handle_decrypt(args, &config).await
        }
        Commands::Profile(args) => {
            info!("Executing profile command");
            handle_profile(args, &config).await
        }
        Commands::Config(args) => handle_config(args, &config, cli.global.config).await,
    }
}

/// Initialize logging from the CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = if cli.has_verbosity_flags() {
        cli.log_level().to_string().to_lowercase()
    } else {
        config.logging.level.clone()
    };

    let mut filter = EnvFilter::from_default_env();
    let mut rejected = None;
    match format!("channels_fetcher={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => rejected = Some(level),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if let Some(level) = rejected {
        warn!("Ignoring invalid log level {:?}", level);
    }

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
