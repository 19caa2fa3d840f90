use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use facematch_core::{discover_jpgs, NearestMatcher, OnnxEngine};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

mod annotate;
mod config;
mod pipeline;

use config::Config;

/// Match faces in a folder of unknown images against two reference people.
#[derive(Parser, Debug)]
#[command(
    name = "facematch",
    about = "Matches faces detected in unknown images against two known reference faces"
)]
struct Args {
    /// Path to the first person's reference image.
    #[arg(long, visible_alias = "p1")]
    person1: PathBuf,

    /// Path to the second person's reference image.
    #[arg(long, visible_alias = "p2")]
    person2: PathBuf,

    /// Input folder with unknown images that should be checked.
    #[arg(short = 'i', long)]
    input_folder: PathBuf,

    /// Log file receiving a copy of all output.
    #[arg(short = 'l', long, default_value = "face_matching.log")]
    log: PathBuf,

    /// Enable verbose logging.
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable all output except errors.
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Deactivate annotated preview generation.
    #[arg(short = 'n', long)]
    no_preview: bool,
}

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("facematch: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    init_logging(&args.log, args.verbose, args.quiet)?;
    tracing::debug!("starting facematch");
    tracing::debug!(log = %args.log.display(), "using log file");

    let cfg = Config::from_env();

    if pipeline::check_file(&args.person1).is_none()
        || pipeline::check_file(&args.person2).is_none()
    {
        return Ok(1);
    }

    let mut engine = OnnxEngine::load(&cfg.detector_model_path(), &cfg.encoder_model_path())
        .context("failed to load face engine models")?;

    let person1 = match pipeline::load_reference(&mut engine, &args.person1) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to load first reference");
            return Ok(1);
        }
    };
    let person2 = match pipeline::load_reference(&mut engine, &args.person2) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to load second reference");
            return Ok(1);
        }
    };
    tracing::debug!(person1 = %person1.name, person2 = %person2.name, "known face names");
    let known = vec![person1, person2];

    if pipeline::check_directory(&args.input_folder).is_none() {
        return Ok(1);
    }

    let preview = !args.no_preview;
    let matcher = NearestMatcher::new(cfg.match_threshold);

    tracing::debug!(folder = %args.input_folder.display(), "loading unknown images");
    let images = discover_jpgs(&args.input_folder);
    tracing::info!(count = images.len(), "unknown images found");

    let mut matched_images = 0usize;
    for image_path in &images {
        match pipeline::process_image(
            &mut engine,
            &matcher,
            &known,
            image_path,
            cfg.match_threshold,
            preview,
        ) {
            Ok(true) => matched_images += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(
                    image = %image_path.display(),
                    error = %format!("{err:#}"),
                    "failed to process image"
                );
            }
        }
    }

    tracing::info!(scanned = images.len(), matched = matched_images, "run complete");
    Ok(0)
}

/// Set up tracing with two fmt layers: console plus an append-mode log
/// file, both at the level selected by the verbosity flags.
fn init_logging(log_path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::INFO
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(level))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(level),
        )
        .init();

    Ok(())
}
