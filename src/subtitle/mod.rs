// Subtitle documents
//
// Parsing and writing of timed-text caption files:
// - WebVTT: the format produced by meeting recorders and most players
// - SRT: numbered cues with comma-separated milliseconds
//
// Writers only ever replace cue text. Timestamps, identifiers, cue settings and
// the order of blocks come back out exactly as they were read.

pub mod srt;
pub mod webvtt;

use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubtitlerError};

const UTF8_BOM: char = '\u{feff}';

/// Offset from the start of the media, with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_hms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Self {
        Self::checked_from_hms(hours, minutes, seconds, millis).unwrap_or(Self(u64::MAX))
    }

    /// `None` when the total does not fit in a `u64` of milliseconds
    pub fn checked_from_hms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Self> {
        hours
            .checked_mul(3_600_000)?
            .checked_add(minutes.checked_mul(60_000)?)?
            .checked_add(seconds.checked_mul(1_000)?)?
            .checked_add(millis)
            .map(Self)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Parse `HH:MM:SS.mmm`, `MM:SS.mmm` or `HH:MM:SS,mmm`
    pub fn parse(s: &str, line: usize) -> Result<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(':').collect();
        let (hours, minutes, rest) = match parts.as_slice() {
            [h, m, rest] => (parse_number(h, s, line)?, parse_number(m, s, line)?, *rest),
            [m, rest] => (0, parse_number(m, s, line)?, *rest),
            _ => {
                return Err(SubtitlerError::parse(
                    line,
                    format!("invalid timestamp syntax {:?}", s),
                ));
            }
        };

        let (seconds, millis) = rest.split_once(['.', ',']).ok_or_else(|| {
            SubtitlerError::parse(line, format!("timestamp {:?} has no milliseconds", s))
        })?;

        if millis.len() != 3 {
            return Err(SubtitlerError::parse(
                line,
                format!("timestamp {:?} must have three millisecond digits", s),
            ));
        }

        let seconds = parse_number(seconds, s, line)?;
        let millis = parse_number(millis, s, line)?;

        if minutes > 59 || seconds > 59 {
            return Err(SubtitlerError::parse(
                line,
                format!("timestamp {:?} is out of range", s),
            ));
        }

        Self::checked_from_hms(hours, minutes, seconds, millis).ok_or_else(|| {
            SubtitlerError::parse(line, format!("timestamp {:?} is out of range", s))
        })
    }

    /// Format as `HH:MM:SS<sep>mmm`; hours are always written
    pub fn format_with(&self, separator: char) -> String {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let secs = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;

        format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with('.'))
    }
}

fn parse_number(part: &str, whole: &str, line: usize) -> Result<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubtitlerError::parse(
            line,
            format!("invalid number {:?} in timestamp {:?}", part, whole),
        ));
    }
    part.parse().map_err(|e| {
        SubtitlerError::parse(line, format!("{} in timestamp {:?}", e, whole))
    })
}

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Optional identifier line above the timing line
    pub identifier: Option<String>,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Everything after the end timestamp on the timing line
    pub settings: String,
    pub lines: Vec<String>,
}

impl Cue {
    pub fn new<S: Into<String>>(start: Timestamp, end: Timestamp, text: S) -> Self {
        let mut cue = Self {
            identifier: None,
            start,
            end,
            settings: String::new(),
            lines: Vec::new(),
        };
        cue.set_text(&text.into());
        cue
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the text; embedded newlines become separate lines
    pub fn set_text(&mut self, text: &str) {
        self.lines = if text.is_empty() {
            Vec::new()
        } else {
            text.lines().map(|l| l.to_string()).collect()
        };
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    fn timing_line(&self, separator: char) -> String {
        let mut line = format!(
            "{} --> {}",
            self.start.format_with(separator),
            self.end.format_with(separator)
        );
        if !self.settings.is_empty() {
            line.push(' ');
            line.push_str(&self.settings);
        }
        line
    }
}

/// A top-level block of a caption file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Cue(Cue),
    /// NOTE, STYLE and REGION blocks, kept verbatim
    Comment(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    WebVtt,
    Srt,
}

impl SubtitleFormat {
    /// Pick the format from the file content, falling back to the extension
    pub fn detect(path: &Path, content: &str) -> Result<Self> {
        let body = content.trim_start_matches(UTF8_BOM);
        if body.starts_with(webvtt::MAGIC) {
            return Ok(Self::WebVtt);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("vtt") => Ok(Self::WebVtt),
            Some("srt") => Ok(Self::Srt),
            _ if body.trim().is_empty() => Ok(Self::WebVtt),
            _ if body.contains("-->") => Ok(Self::Srt),
            _ => Err(SubtitlerError::parse_file(format!(
                "unrecognised subtitle format: {}",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebVtt => "vtt",
            Self::Srt => "srt",
        }
    }
}

/// Parsed caption file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleDocument {
    pub format: SubtitleFormat,
    /// Header lines; for WebVTT the first one carries the `WEBVTT` magic
    pub header: Vec<String>,
    pub blocks: Vec<Block>,
}

impl SubtitleDocument {
    pub fn new(format: SubtitleFormat) -> Self {
        Self {
            format,
            header: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn from_cues(format: SubtitleFormat, cues: Vec<Cue>) -> Self {
        Self {
            format,
            header: Vec::new(),
            blocks: cues.into_iter().map(Block::Cue).collect(),
        }
    }

    pub fn cues(&self) -> impl Iterator<Item = &Cue> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Cue(cue) => Some(cue),
            Block::Comment(_) => None,
        })
    }

    pub fn cues_mut(&mut self) -> impl Iterator<Item = &mut Cue> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Cue(cue) => Some(cue),
            Block::Comment(_) => None,
        })
    }

    pub fn cue_count(&self) -> usize {
        self.cues().count()
    }

    pub fn is_empty(&self) -> bool {
        self.cue_count() == 0
    }

    pub fn parse_str(content: &str, format: SubtitleFormat) -> Result<Self> {
        let content = normalize(content);
        match format {
            SubtitleFormat::WebVtt => webvtt::parse(&content),
            SubtitleFormat::Srt => srt::parse(&content),
        }
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self.format {
            SubtitleFormat::WebVtt => webvtt::render(self),
            SubtitleFormat::Srt => srt::render(self),
        };
        f.write_str(&rendered)
    }
}

/// Read and parse a caption file
pub async fn parse_file<P: AsRef<Path>>(path: P) -> Result<SubtitleDocument> {
    let path = path.as_ref();
    info!("Reading subtitles: {}", path.display());

    let content = fs::read_to_string(path).await.map_err(|e| {
        SubtitlerError::parse_file(format!("cannot read {}: {}", path.display(), e))
    })?;

    let format = SubtitleFormat::detect(path, &content)?;
    let document = SubtitleDocument::parse_str(&content, format)?;

    debug!(
        "Parsed {} cues ({:?}) from {}",
        document.cue_count(),
        format,
        path.display()
    );
    Ok(document)
}

/// Write a caption file in the document's own format
pub async fn write_file<P: AsRef<Path>>(document: &SubtitleDocument, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing subtitles: {}", output_path.display());

    fs::write(output_path, document.to_string()).await?;

    info!("Wrote {} cues", document.cue_count());
    Ok(())
}

/// Strip a BOM and fold CRLF/CR line endings into LF
fn normalize(content: &str) -> String {
    content
        .trim_start_matches(UTF8_BOM)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Split content into blank-line separated blocks, each tagged with the
/// 1-based line number of its first line
pub(crate) fn split_blocks(lines: &[&str], first_line: usize) -> Vec<(usize, Vec<String>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut start = first_line;

    for (offset, line) in lines.iter().enumerate() {
        let line_no = first_line + offset;
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push((start, std::mem::take(&mut current)));
            }
        } else {
            if current.is_empty() {
                start = line_no;
            }
            current.push(line.trim_end().to_string());
        }
    }
    if !current.is_empty() {
        blocks.push((start, current));
    }
    blocks
}

/// Parse the cue at the head of `block`. The timing line is either the first
/// line or, after an identifier, the second.
pub(crate) fn parse_cue(block: &[String], line: usize) -> Result<Cue> {
    let (identifier, timing_index) = if block[0].contains("-->") {
        (None, 0)
    } else {
        (Some(block[0].clone()), 1)
    };

    let timing = block.get(timing_index).filter(|l| l.contains("-->")).ok_or_else(|| {
        SubtitlerError::parse(line, format!("cue {:?} has no timing line", block[0]))
    })?;
    let timing_line = line + timing_index;

    let (start, rest) = timing
        .split_once("-->")
        .ok_or_else(|| SubtitlerError::parse(timing_line, "missing \"-->\""))?;

    let rest = rest.trim_start();
    let (end, settings) = match rest.split_once(char::is_whitespace) {
        Some((end, settings)) => (end, settings.trim()),
        None => (rest, ""),
    };

    if end.is_empty() {
        return Err(SubtitlerError::parse(timing_line, "missing end timestamp"));
    }

    let start = Timestamp::parse(start, timing_line)?;
    let end = Timestamp::parse(end, timing_line)?;

    if start >= end {
        return Err(SubtitlerError::parse(
            timing_line,
            format!("cue ends at {} which is not after its start {}", end, start),
        ));
    }

    Ok(Cue {
        identifier,
        start,
        end,
        settings: settings.to_string(),
        lines: block[timing_index + 1..].to_vec(),
    })
}
