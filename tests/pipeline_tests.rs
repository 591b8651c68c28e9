/*!
 * End-to-end pipeline runs with in-process translator and embedder stubs
 */

use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use subtitler::config::PipelineConfig;
use subtitler::error::{Result, SubtitlerError};
use subtitler::media::MediaEmbedder;
use subtitler::pipeline::Pipeline;
use subtitler::subtitle::{parse_file, SubtitleFormat};
use subtitler::translate::Translator;

/// Translates through a fixed dictionary; unknown text comes back unchanged
struct DictionaryTranslator {
    entries: HashMap<String, String>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl DictionaryTranslator {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate_batch(&self, texts: &[String], _: &str, _: &str) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| self.entries.get(t).cloned().unwrap_or_else(|| t.clone()))
            .collect())
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate_batch(&self, _: &[String], _: &str, _: &str) -> Result<Vec<String>> {
        Err(SubtitlerError::Translation("HTTP request failed: connection refused".to_string()))
    }
}

/// Records embed calls without touching the disk
#[derive(Clone, Default)]
struct RecordingEmbedder {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>>,
    fail_with_status: Option<i32>,
}

#[async_trait]
impl MediaEmbedder for RecordingEmbedder {
    async fn embed(&self, video_path: &Path, subtitle_path: &Path, output_path: &Path) -> Result<()> {
        self.calls.lock().unwrap().push((
            video_path.to_path_buf(),
            subtitle_path.to_path_buf(),
            output_path.to_path_buf(),
        ));
        match self.fail_with_status {
            Some(code) => Err(SubtitlerError::Embed(format!("Subtitle embedding failed (exit status: {})", code))),
            None => Ok(()),
        }
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

fn setup(subtitle_name: &str, content: &str) -> (TempDir, PipelineConfig) {
    let temp = TempDir::new().unwrap();
    temp.child(subtitle_name).write_str(content).unwrap();
    temp.child("talk.mp4").write_binary(b"\x00\x00\x00\x18ftypmp42").unwrap();

    let config = PipelineConfig {
        input_subtitle: temp.path().join(subtitle_name),
        input_video: temp.path().join("talk.mp4"),
        ..PipelineConfig::default()
    };
    (temp, config)
}

#[tokio::test]
async fn test_single_cue_translated_with_same_timing() {
    let (temp, config) = setup("talk.vtt", "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nПривет\n");
    let embedder = RecordingEmbedder::default();
    let calls = embedder.calls.clone();

    let pipeline = Pipeline::new(
        config,
        Box::new(DictionaryTranslator::new(&[("Привет", "Сәлем")])),
        Box::new(embedder),
    );
    pipeline.run().await.unwrap();

    temp.child("talk_kk_translated.vtt")
        .assert("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nСәлем\n");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, temp.path().join("talk.mp4"));
    assert_eq!(calls[0].1, temp.path().join("talk_kk_translated.vtt"));
    assert_eq!(calls[0].2, temp.path().join("talk_with_kk_subtitles.mp4"));
}

#[tokio::test]
async fn test_structure_preserved_across_batches() {
    let mut content = String::from("WEBVTT\n\nNOTE recorded meeting\n\n");
    for i in 0..25u64 {
        content.push_str(&format!(
            "{}\n00:00:{:02}.000 --> 00:00:{:02}.500\nстрока {}\n\n",
            i + 1,
            i * 2,
            i * 2 + 1,
            i
        ));
    }
    let (temp, config) = setup("talk.vtt", &content);

    let translator = DictionaryTranslator::new(&[]);
    let batches = translator.calls.clone();
    let pipeline = Pipeline::new(config, Box::new(translator), Box::new(RecordingEmbedder::default()));
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.cues, 25);
    let sizes: Vec<usize> = batches.lock().unwrap().iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);

    let input = parse_file(temp.path().join("talk.vtt")).await.unwrap();
    let output = parse_file(temp.path().join("talk_kk_translated.vtt")).await.unwrap();

    assert_eq!(output.cue_count(), input.cue_count());
    let timing = |d: &subtitler::subtitle::SubtitleDocument| {
        d.cues()
            .map(|c| (c.identifier.clone(), c.start, c.end))
            .collect::<Vec<_>>()
    };
    assert_eq!(timing(&input), timing(&output));
    assert_eq!(output.blocks.len(), input.blocks.len());
}

#[tokio::test]
async fn test_srt_input_produces_srt_output() {
    let (temp, config) = setup(
        "talk.srt",
        "1\n00:00:01,000 --> 00:00:02,000\nПривет\n\n2\n00:00:03,000 --> 00:00:04,000\n\n",
    );

    let pipeline = Pipeline::new(
        config,
        Box::new(DictionaryTranslator::new(&[("Привет", "Сәлем")])),
        Box::new(RecordingEmbedder::default()),
    );
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.output_subtitle, temp.path().join("talk_kk_translated.srt"));
    assert_eq!(report.translated_cues, 1);

    let output = parse_file(&report.output_subtitle).await.unwrap();
    assert_eq!(output.format, SubtitleFormat::Srt);
    let texts: Vec<String> = output.cues().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["Сәлем", ""]);
}

#[tokio::test]
async fn test_translation_failure_writes_nothing_and_skips_embedding() {
    let (temp, config) = setup("talk.vtt", "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nПривет\n");
    let embedder = RecordingEmbedder::default();
    let calls = embedder.calls.clone();

    let pipeline = Pipeline::new(config, Box::new(FailingTranslator), Box::new(embedder));
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, SubtitlerError::Translation(_)));
    assert!(!temp.path().join("talk_kk_translated.vtt").exists());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_embed_failure_surfaces_embed_error() {
    let (temp, config) = setup("talk.vtt", "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nПривет\n");
    let embedder = RecordingEmbedder {
        fail_with_status: Some(1),
        ..RecordingEmbedder::default()
    };

    let pipeline = Pipeline::new(
        config,
        Box::new(DictionaryTranslator::new(&[])),
        Box::new(embedder),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, SubtitlerError::Embed(_)));
    assert!(!temp.path().join("talk_with_kk_subtitles.mp4").exists());
}

#[tokio::test]
async fn test_empty_file_yields_empty_output_and_embeds() {
    let (temp, config) = setup("talk.vtt", "");
    let embedder = RecordingEmbedder::default();
    let calls = embedder.calls.clone();

    let pipeline = Pipeline::new(config, Box::new(FailingTranslator), Box::new(embedder));
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.cues, 0);
    temp.child("talk_kk_translated.vtt").assert("WEBVTT\n");
    assert_eq!(calls.lock().unwrap().len(), 1);
}
