use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, SubtitlerError};
use super::{MediaCommandBuilder, MediaEmbedder};

/// Embedder that shells out to ffmpeg
pub struct FfmpegEmbedder {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegEmbedder {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

/// Sibling of `output` the tool writes to; keeps the extension so the muxer
/// is still chosen from it
fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!(".{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.partial", stem),
    };
    output.with_file_name(name)
}

#[async_trait]
impl MediaEmbedder for FfmpegEmbedder {
    async fn embed(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Embedding subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        for input in [video_path, subtitle_path] {
            if !fs::try_exists(input).await.unwrap_or(false) {
                return Err(SubtitlerError::Embed(format!(
                    "Input file does not exist: {}",
                    input.display()
                )));
            }
        }

        let partial = partial_path(output_path);
        let command = self.command_builder.embed_subtitles(
            video_path,
            subtitle_path,
            &partial,
            &self.config.subtitle_codec,
            &self.config.language_tag,
            &self.config.extra_options,
        );

        if let Err(e) = command.execute().await {
            // Only this run's scratch file goes; an earlier output stays untouched
            if fs::try_exists(&partial).await.unwrap_or(false) {
                if let Err(remove_err) = fs::remove_file(&partial).await {
                    warn!("Failed to remove incomplete output {}: {}", partial.display(), remove_err);
                }
            }
            return Err(e);
        }

        fs::rename(&partial, output_path).await.map_err(|e| {
            SubtitlerError::Embed(format!(
                "Failed to move {} to {}: {}",
                partial.display(),
                output_path.display(),
                e
            ))
        })?;

        info!("Subtitle embedding completed successfully");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().execute().await?;
        info!("Media processor is available");
        Ok(())
    }
}
