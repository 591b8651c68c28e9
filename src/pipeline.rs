use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{Result, SubtitlerError};
use crate::media::MediaEmbedder;
use crate::subtitle::{parse_file, write_file};
use crate::translate::{Translator, translate_document};

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub output_subtitle: PathBuf,
    /// Set when the embedder ran
    pub output_video: Option<PathBuf>,
    pub cues: usize,
    pub translated_cues: usize,
}

pub struct Pipeline {
    config: PipelineConfig,
    translator: Box<dyn Translator>,
    embedder: Box<dyn MediaEmbedder>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        translator: Box<dyn Translator>,
        embedder: Box<dyn MediaEmbedder>,
    ) -> Self {
        Self {
            config,
            translator,
            embedder,
        }
    }

    pub fn output_subtitle_path(&self) -> PathBuf {
        self.config.output_subtitle.clone().unwrap_or_else(|| {
            derive_path(&self.config.input_subtitle, |stem| {
                format!("{}_{}_translated", stem, self.config.target_language)
            })
        })
    }

    pub fn output_video_path(&self) -> PathBuf {
        self.config.output_video.clone().unwrap_or_else(|| {
            derive_path(&self.config.input_video, |stem| {
                format!("{}_with_{}_subtitles", stem, self.config.target_language)
            })
        })
    }

    /// Parse, translate, write, embed. Any failure aborts the run; files written
    /// by earlier steps are left in place.
    pub async fn run(&self) -> Result<PipelineReport> {
        let config = &self.config;
        let output_subtitle = self.output_subtitle_path();
        let output_video = self.output_video_path();

        info!("Input subtitles: {}", config.input_subtitle.display());
        info!("Input video: {}", config.input_video.display());

        if same_file_path(&output_subtitle, &config.input_subtitle).await {
            return Err(SubtitlerError::Config(
                "Output subtitle path would overwrite the input".to_string(),
            ));
        }
        if same_file_path(&output_video, &config.input_video).await {
            return Err(SubtitlerError::Config(
                "Output video path would overwrite the input".to_string(),
            ));
        }

        // Step 1: Parse
        let mut document = parse_file(&config.input_subtitle).await?;
        let cues = document.cue_count();

        // Step 2: Translate
        let stats = translate_document(
            self.translator.as_ref(),
            &mut document,
            &config.source_language,
            &config.target_language,
            config.batch_size,
        )
        .await?;

        // Step 3: Write
        if let Some(parent) = output_subtitle.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        write_file(&document, &output_subtitle).await?;
        info!("Translated subtitles saved as {}", output_subtitle.display());

        // Step 4: Embed
        let embedded = if document.is_empty() && !config.embed_empty {
            warn!("Subtitle file has no cues; skipping embedding");
            None
        } else {
            if let Some(parent) = output_video.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            self.embedder
                .embed(&config.input_video, &output_subtitle, &output_video)
                .await?;
            info!("Video with subtitles saved as {}", output_video.display());
            Some(output_video)
        };

        Ok(PipelineReport {
            output_subtitle,
            output_video: embedded,
            cues,
            translated_cues: stats.translated,
        })
    }
}

/// Rename the file stem of `path`, keeping its directory and extension
fn derive_path<F: Fn(&str) -> String>(path: &Path, rename: F) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut file_name = rename(&stem);
    if let Some(extension) = path.extension() {
        file_name.push('.');
        file_name.push_str(&extension.to_string_lossy());
    }
    path.with_file_name(file_name)
}

/// Whether `a` and `b` name the same file once their directories are resolved
async fn same_file_path(a: &Path, b: &Path) -> bool {
    a.file_name() == b.file_name() && resolve_dir(a).await == resolve_dir(b).await
}

/// Canonical parent directory; lexical with `.` dropped when it does not exist yet
async fn resolve_dir(path: &Path) -> PathBuf {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    match fs::canonicalize(parent).await {
        Ok(dir) => dir,
        Err(_) => parent
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    }
}
