// Media processing
//
// The muxing itself is delegated to ffmpeg:
// - Commands: argument builders and process execution
// - Processor: the ffmpeg-backed MediaEmbedder

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::error::Result;

/// Attaches a subtitle track to a video container
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaEmbedder: Send + Sync {
    /// Write `output_path`: the streams of `video_path` plus `subtitle_path`
    /// as a subtitle track
    async fn embed(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Check that the external tool can be run
    async fn check_availability(&self) -> Result<()>;
}
