//! Subtitler - Subtitle Translation and Embedding
//!
//! Entry point: translates the configured subtitle file and embeds the result
//! into the configured video.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use subtitler::cli::Args;
use subtitler::config::Config;
use subtitler::media::{FfmpegEmbedder, MediaEmbedder};
use subtitler::pipeline::Pipeline;
use subtitler::translate::OpenAiTranslator;

const DEFAULT_CONFIG_FILE: &str = "subtitler.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Subtitler - Subtitle Translation and Embedding");

    if let Some(path) = &args.init_config {
        Config::default().save_to_file(path)?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(subtitle) = args.subtitle {
        config.pipeline.input_subtitle = subtitle;
    }
    if let Some(video) = args.video {
        config.pipeline.input_video = video;
    }
    config.validate()?;

    // The credential may live in a .env file next to the inputs
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    let translator = OpenAiTranslator::from_env(config.translate.clone())?;
    let embedder = FfmpegEmbedder::new(config.media.clone());
    embedder.check_availability().await?;

    let pipeline = Pipeline::new(config.pipeline.clone(), Box::new(translator), Box::new(embedder));
    let report = pipeline.run().await?;

    println!("Translated {} of {} cues -> {}",
             report.translated_cues, report.cues, report.output_subtitle.display());
    match &report.output_video {
        Some(video) => println!("Process complete. Video with subtitles saved as {}", video.display()),
        None => println!("Process complete. No cues to embed; video left untouched"),
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subtitler").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subtitler.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
