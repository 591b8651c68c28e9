// Translation of subtitle text
//
// - common: chat request/response types, numbered batch prompts and their parsing
// - openai: client for OpenAI-compatible chat-completion endpoints
//
// Cues are translated one-to-one: a batch of N texts always comes back as N
// translations in the same order, or the whole run fails.

pub mod common;
pub mod openai;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

pub use common::*;
pub use openai::OpenAiTranslator;

use crate::error::{Result, SubtitlerError};
use crate::subtitle::SubtitleDocument;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` in order; the result has exactly `texts.len()` entries
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>>;

    /// Translate a single text
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let mut translations = self
            .translate_batch(&[text.to_string()], source_language, target_language)
            .await?;

        match (translations.pop(), translations.is_empty()) {
            (Some(translation), true) => Ok(translation),
            _ => Err(SubtitlerError::Translation(
                "Expected exactly one translation".to_string(),
            )),
        }
    }
}

/// Outcome of translating a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslationStats {
    pub translated: usize,
    /// Cues with no text, left untouched
    pub skipped: usize,
}

/// Translate every non-blank cue of `document` in place.
///
/// Multi-line cue text is sent as one line. The document is only modified once
/// every batch has succeeded.
pub async fn translate_document(
    translator: &dyn Translator,
    document: &mut SubtitleDocument,
    source_language: &str,
    target_language: &str,
    batch_size: usize,
) -> Result<TranslationStats> {
    if batch_size == 0 {
        return Err(SubtitlerError::Config("batch_size must be at least 1".to_string()));
    }

    let mut positions = Vec::new();
    let mut texts = Vec::new();
    let mut skipped = 0;

    for (position, cue) in document.cues().enumerate() {
        if cue.is_blank() {
            skipped += 1;
            continue;
        }
        positions.push(position);
        texts.push(join_lines(&cue.lines));
    }

    info!(
        "Translating {} cues from {} to {} in batches of {} ({} empty cues skipped)",
        texts.len(),
        source_language,
        target_language,
        batch_size,
        skipped
    );

    let progress = ProgressBar::new(texts.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut translations = Vec::with_capacity(texts.len());
    for (index, batch) in texts.chunks(batch_size).enumerate() {
        debug!("Sending batch {} ({} cues)", index + 1, batch.len());

        let translated = match translator
            .translate_batch(batch, source_language, target_language)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        if translated.len() != batch.len() {
            progress.abandon();
            return Err(SubtitlerError::Translation(format!(
                "Batch {} returned {} translations for {} cues",
                index + 1,
                translated.len(),
                batch.len()
            )));
        }

        progress.inc(batch.len() as u64);
        translations.extend(translated);
    }
    progress.finish_and_clear();

    let mut pending = positions.into_iter().zip(translations).peekable();
    for (position, cue) in document.cues_mut().enumerate() {
        if let Some((_, translation)) = pending.next_if(|(p, _)| *p == position) {
            cue.set_text(&translation);
        }
    }

    let stats = TranslationStats {
        translated: texts.len(),
        skipped,
    };
    info!("Translated {} cues", stats.translated);
    Ok(stats)
}

fn join_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
