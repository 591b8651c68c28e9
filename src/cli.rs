use clap::Parser;
use std::path::PathBuf;

/// Translate a subtitle file and mux it into a video.
///
/// Without arguments the whole pipeline runs with the paths from the
/// configuration file (or the built-in defaults).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to ./subtitler.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subtitle file to translate, overriding the configuration
    #[arg(short, long)]
    pub subtitle: Option<PathBuf>,

    /// Video file to embed into, overriding the configuration
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,
}
