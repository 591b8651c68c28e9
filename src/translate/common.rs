use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SubtitlerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Build the prompt for a numbered batch of subtitle lines
pub fn build_batch_prompt(texts: &[String], source_language: &str, target_language: &str) -> String {
    let source_name = language_code_to_name(source_language);
    let target_name = language_code_to_name(target_language);

    let mut prompt = format!(
        "Translate the following {} subtitle lines from {} to {}.\n\
         Each line is numbered. Answer with exactly {} lines using the same numbering \
         (\"1. ...\"), one translation per number, in the same order.\n\
         Do not merge or split lines and do not add explanations.\n\n",
        texts.len(),
        source_name,
        target_name,
        texts.len()
    );

    for (i, text) in texts.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, text));
    }

    prompt
}

/// Map a numbered model answer back onto `expected` inputs.
///
/// Unnumbered lines continue the previous entry, and so do lines whose leading
/// number lies outside `1..=expected` (a year such as `2024. жылы` wrapped onto
/// its own line). Every number from 1 to `expected` must appear exactly once
/// with non-empty text. A single expected line may also come back without
/// numbering.
pub fn parse_numbered_response(raw: &str, expected: usize) -> Result<Vec<String>> {
    let mut entries: BTreeMap<usize, String> = BTreeMap::new();
    let mut current: Option<usize> = None;
    let mut unnumbered: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match split_number(trimmed).filter(|(number, _)| *number <= expected) {
            Some((number, text)) => {
                if entries.insert(number, clean_line(text)).is_some() {
                    return Err(SubtitlerError::Translation(format!(
                        "Line {} appears more than once in the response",
                        number
                    )));
                }
                current = Some(number);
            }
            None => match current {
                Some(number) => {
                    if let Some(entry) = entries.get_mut(&number) {
                        if !entry.is_empty() {
                            entry.push(' ');
                        }
                        entry.push_str(&clean_line(trimmed));
                    }
                }
                None => unnumbered.push(trimmed),
            },
        }
    }

    if entries.is_empty() && expected == 1 && !unnumbered.is_empty() {
        let text = clean_line(&unnumbered.join(" "));
        if text.is_empty() {
            return Err(SubtitlerError::Translation("Empty translation received".to_string()));
        }
        return Ok(vec![text]);
    }

    if entries.len() != expected || entries.keys().next_back() != Some(&expected) {
        return Err(SubtitlerError::Translation(format!(
            "Expected {} translated lines, got {}",
            expected,
            entries.len()
        )));
    }

    let mut translations = Vec::with_capacity(expected);
    for (number, text) in entries {
        if text.is_empty() {
            return Err(SubtitlerError::Translation(format!(
                "Empty translation for line {}",
                number
            )));
        }
        translations.push(text);
    }

    Ok(translations)
}

/// Split `12. text` or `12) text` into its number and text
fn split_number(line: &str) -> Option<(usize, &str)> {
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }

    let number = line[..digits].parse().ok().filter(|n| *n > 0)?;
    Some((number, rest.trim()))
}

/// Drop wrapping quotes and markdown emphasis the model sometimes adds
fn clean_line(text: &str) -> String {
    let mut text = text.trim();
    for (open, close) in [("\"", "\""), ("«", "»"), ("**", "**")] {
        if text.len() > open.len() + close.len() && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len()..text.len() - close.len()].trim();
        }
    }
    text.to_string()
}

/// Convert language code to full language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    let name = match code.to_lowercase().as_str() {
        "ru" => "Russian",
        "kk" | "kaz" => "Kazakh",
        "en" => "English",
        "uk" => "Ukrainian",
        "be" => "Belarusian",
        "ky" => "Kyrgyz",
        "uz" => "Uzbek",
        "tg" => "Tajik",
        "az" => "Azerbaijani",
        "tr" => "Turkish",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "pl" => "Polish",
        "nl" => "Dutch",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        _ => return code.to_string(),
    };
    name.to_string()
}
