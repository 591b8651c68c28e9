use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubtitlerError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Subtitle file to translate
    pub input_subtitle: PathBuf,
    /// Video file to embed the translated track into
    pub input_video: PathBuf,
    /// Translated subtitle file; derived from the input name when unset
    pub output_subtitle: Option<PathBuf>,
    /// Output video; derived from the input name when unset
    pub output_video: Option<PathBuf>,
    /// Language code of the subtitle text
    pub source_language: String,
    /// Language code to translate into
    pub target_language: String,
    /// Number of cues sent per translation request
    pub batch_size: usize,
    /// Still run the embedder when the subtitle file has no cues
    pub embed_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    /// Chat model used for translation
    pub model: String,
    /// Environment variable holding the API credential
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Subtitle codec for the muxed track (mov_text for mp4, webvtt/srt for mkv)
    pub subtitle_codec: String,
    /// ISO 639-2 tag written to the subtitle track metadata
    pub language_tag: String,
    /// Additional ffmpeg options inserted before the output path
    pub extra_options: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_subtitle: PathBuf::from("GMT20241227-140457_Recording.transcript.vtt"),
            input_video: PathBuf::from("GMT20241227-140457_Recording_1920x1080.mp4"),
            output_subtitle: None,
            output_video: None,
            source_language: "ru".to_string(),
            target_language: "kk".to_string(),
            batch_size: 10,
            embed_empty: true,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "API".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            subtitle_codec: "mov_text".to_string(),
            language_tag: "kaz".to_string(),
            extra_options: vec![
                // Example options users can add:
                // "-movflags".to_string(), "+faststart".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtitlerError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| SubtitlerError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtitlerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtitlerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;

        if pipeline.batch_size == 0 {
            return Err(SubtitlerError::Config("batch_size must be at least 1".to_string()));
        }
        if pipeline.input_subtitle.as_os_str().is_empty() {
            return Err(SubtitlerError::Config("input_subtitle is not set".to_string()));
        }
        if pipeline.input_video.as_os_str().is_empty() {
            return Err(SubtitlerError::Config("input_video is not set".to_string()));
        }
        if pipeline.source_language.trim().is_empty() || pipeline.target_language.trim().is_empty() {
            return Err(SubtitlerError::Config(
                "source_language and target_language must be set".to_string(),
            ));
        }
        if self.translate.api_key_env.trim().is_empty() {
            return Err(SubtitlerError::Config("api_key_env is not set".to_string()));
        }

        Ok(())
    }
}
