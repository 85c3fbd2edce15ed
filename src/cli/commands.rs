//! Command handlers for the CLI
//!
//! Each handler turns parsed arguments plus the loaded [`AppConfig`] into
//! pipeline calls and prints a short report to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::app::{
    build_filename, download_command, generate_task_id, load_profiles, sanitize_filename,
    DecryptOutcome, Decryptor, DownloadReport, ExternalKeystream, FeedClient, MediaSpec,
    Pipeline, Profile, ProfileKind, Saver, Session, StaticKeystream,
};
use crate::cli::args::{ConfigAction, ConfigArgs, DecryptArgs, DownloadArgs, ProfileArgs};
use crate::cli::progress::{format_bytes, ProgressConfig, TransferProgress};
use crate::config::{AppConfig, DecryptConfig};
use crate::errors::{AppError, Result};

/// Handle the download command
pub async fn handle_download(args: DownloadArgs, config: &AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let file_stem = args
        .file_stem()
        .map(|stem| sanitize_filename(&stem))
        .filter(|stem| !stem.is_empty());

    let decryptor = build_decryptor(
        &config.decrypt,
        args.keystream_cmd.as_deref(),
        args.keystream_file.as_deref(),
    )
    .await?;
    let pipeline = build_pipeline(config, decryptor, args.output_dir.clone(), args.force)?;

    let mut profile = Profile::from_url(generate_task_id(), args.url.clone()).with_key(args.key);
    if let Some(format) = &args.spec {
        profile.spec = vec![MediaSpec {
            file_format: format.clone(),
            width: None,
            height: None,
            bitrate: None,
        }];
    }
    let spec = profile.select_spec(true, args.spec.as_deref())?;

    let filename = match file_stem {
        Some(stem) => stem,
        None => build_filename(&profile, spec, &config.download.filename_template)?,
    };

    let mut session = Session::new();
    session.profiles.set_feed(profile.clone());
    let task_id = session.enqueue(&profile, spec, filename.clone())?;

    let report = run_with_progress(&pipeline, &mut session, &task_id, &filename, args.no_progress)
        .await?;
    print_report(&report);
    Ok(())
}

/// Handle the decrypt command
pub async fn handle_decrypt(args: DecryptArgs, config: &AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let decryptor = build_decryptor(
        &config.decrypt,
        args.keystream_cmd.as_deref(),
        args.keystream_file.as_deref(),
    )
    .await?;
    if !decryptor.has_source() {
        return Err(AppError::generic(
            "No keystream source configured. Use --keystream-cmd or --keystream-file",
        ));
    }

    let pipeline = build_pipeline(config, decryptor, None, args.force)?;
    let output = pipeline
        .decrypt_file(&args.input, &args.key, args.output.as_deref())
        .await?;

    println!("Decrypted {} -> {}", args.input.display(), output.display());
    Ok(())
}

/// Handle the profile command
///
/// Every profile in the document is recorded in a session and downloaded in
/// turn. A failing profile does not stop the others; the command fails at
/// the end if any of them did.
pub async fn handle_profile(args: ProfileArgs, config: &AppConfig) -> Result<()> {
    let profiles = load_profiles(&args.file).await?;
    info!("Loaded {} profiles from {}", profiles.len(), args.file.display());

    let decryptor = build_decryptor(&config.decrypt, None, None).await?;
    let pipeline = build_pipeline(config, decryptor, args.output_dir.clone(), args.force)?;
    let default_highest = args.highest || config.download.default_highest;

    let mut session = Session::new();
    let mut failures = Vec::new();

    for profile in profiles {
        if !session.profiles.set_feed(profile.clone()) {
            warn!("Skipping duplicate profile {}", profile.id);
            continue;
        }

        let outcome = process_profile(
            &pipeline,
            &mut session,
            &profile,
            &args,
            default_highest,
            &config.download.filename_template,
        )
        .await;

        if let Err(e) = outcome {
            error!("Profile {} failed [{}]: {}", profile.id, e.category(), e);
            eprintln!("Failed {}: {}", profile.id, e);
            failures.push(profile.id.clone());
        }
    }

    if !args.print_command {
        print_download_list(&session);
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::generic(format!(
            "{} of {} profiles failed: {}",
            failures.len(),
            session.profiles.len(),
            failures.join(", ")
        )))
    }
}

async fn process_profile(
    pipeline: &Pipeline,
    session: &mut Session,
    profile: &Profile,
    args: &ProfileArgs,
    default_highest: bool,
    template: &str,
) -> Result<()> {
    let spec = match profile.kind {
        ProfileKind::Media => profile.select_spec(default_highest, args.spec.as_deref())?,
        ProfileKind::Picture => None,
    };
    let filename = build_filename(profile, spec, template)?;
    debug!("Profile {} -> {} ({})", profile.id, filename, profile.kind);

    if args.print_command {
        match profile.kind {
            ProfileKind::Media => {
                let url = profile.spec_url(spec)?;
                println!("{}", download_command(&url, profile.key.as_deref(), &filename));
            }
            ProfileKind::Picture => {
                for url in profile.image_urls()? {
                    println!("{}", url);
                }
            }
        }
        return Ok(());
    }

    match profile.kind {
        ProfileKind::Media => {
            let task_id = session.enqueue(profile, spec, filename.clone())?;
            let report =
                run_with_progress(pipeline, session, &task_id, &filename, args.no_progress)
                    .await?;
            print_report(&report);
        }
        ProfileKind::Picture => {
            let path = pipeline.download_pictures(profile, &filename).await?;
            println!("Saved {}", path.display());
        }
    }

    if args.cover {
        let path = pipeline.download_cover(profile, &filename).await?;
        println!("Saved cover {}", path.display());
    }

    Ok(())
}

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &AppConfig,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { force, path } => {
            let written = AppConfig::write_default(path.or(config_path), force).await?;
            println!("Wrote default configuration to {}", written.display());
        }
        ConfigAction::Show => {
            match config_path.or_else(AppConfig::find_config_file) {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No configuration file found, showing defaults"),
            }
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Pick the keystream source
///
/// Command-line choices win over the configuration file; a generator
/// program wins over a keystream file. Without any source the decryptor is
/// disabled and encrypted downloads are saved as fetched.
pub async fn build_decryptor(
    config: &DecryptConfig,
    keystream_cmd: Option<&Path>,
    keystream_file: Option<&Path>,
) -> Result<Decryptor> {
    let decryptor = if let Some(cmd) = keystream_cmd {
        debug!("Using keystream generator {}", cmd.display());
        Decryptor::new(Arc::new(ExternalKeystream::new(cmd.to_path_buf())))
    } else if let Some(file) = keystream_file {
        debug!("Using keystream file {}", file.display());
        Decryptor::new(Arc::new(StaticKeystream::from_file(file).await?))
    } else if let Some(cmd) = &config.keystream_cmd {
        debug!("Using configured keystream generator {}", cmd.display());
        let source = ExternalKeystream::new(cmd.clone()).with_args(config.keystream_args.clone());
        Decryptor::new(Arc::new(source))
    } else if let Some(file) = &config.keystream_file {
        debug!("Using configured keystream file {}", file.display());
        Decryptor::new(Arc::new(StaticKeystream::from_file(file).await?))
    } else {
        debug!("No keystream source configured, decryption disabled");
        Decryptor::disabled()
    };

    Ok(decryptor.with_keystream_len(config.keystream_len))
}

fn build_pipeline(
    config: &AppConfig,
    decryptor: Decryptor,
    output_dir: Option<PathBuf>,
    force: bool,
) -> Result<Pipeline> {
    let (client_config, download_config, _) = config.to_runtime_config();
    let client = FeedClient::with_config(&client_config)?
        .with_progress_interval(download_config.progress_interval);

    let output_dir = output_dir.unwrap_or(download_config.output_dir);
    let saver = Saver::new(output_dir).with_overwrite(force || download_config.overwrite);
    Ok(Pipeline::new(client, decryptor, saver))
}

async fn run_with_progress(
    pipeline: &Pipeline,
    session: &mut Session,
    task_id: &str,
    label: &str,
    no_progress: bool,
) -> Result<DownloadReport> {
    let progress_config = if no_progress {
        ProgressConfig::disabled()
    } else {
        ProgressConfig::default()
    };
    let mut progress = TransferProgress::new(label, progress_config)?;

    match pipeline.run(session, task_id, &mut progress).await {
        Ok(report) => {
            progress.finish(&format!("saved {}", format_bytes(report.bytes as u64)));
            Ok(report)
        }
        Err(e) => {
            progress.abandon(&format!("failed: {}", e));
            Err(e.into())
        }
    }
}

fn print_report(report: &DownloadReport) {
    println!(
        "Saved {} ({})",
        report.path.display(),
        format_bytes(report.bytes as u64)
    );
    match &report.decrypt {
        DecryptOutcome::Decrypted { bytes } => println!("  Decrypted first {} bytes", bytes),
        DecryptOutcome::Failed { reason } => {
            println!("  Warning: saved without decryption ({})", reason)
        }
        DecryptOutcome::Skipped => {}
    }
}

fn print_download_list(session: &Session) {
    let summary = session.downloads.summary();
    if summary.total == 0 {
        return;
    }

    println!("\nDownload list:");
    for task in session.downloads.iter() {
        match &task.error {
            Some(err) => println!(
                "  [{}] {} ({}) - {}",
                task.status, task.filename, task.spec_format, err
            ),
            None => println!(
                "  [{}] {} ({}) {:.0}%",
                task.status, task.filename, task.spec_format, task.progress
            ),
        }
    }
    println!(
        "  Total: {}  Done: {}  Failed: {}  Pending: {}",
        summary.total, summary.done, summary.failed, summary.pending
    );
}
