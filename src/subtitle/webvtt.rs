use super::{Block, SubtitleDocument, SubtitleFormat, parse_cue, split_blocks};
use crate::error::{Result, SubtitlerError};

pub const MAGIC: &str = "WEBVTT";

const COMMENT_KEYWORDS: [&str; 3] = ["NOTE", "STYLE", "REGION"];

/// Parse WebVTT content (already BOM-stripped and LF-normalized)
pub fn parse(content: &str) -> Result<SubtitleDocument> {
    let mut document = SubtitleDocument::new(SubtitleFormat::WebVtt);
    if content.trim().is_empty() {
        return Ok(document);
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let first = lines[0];
    let after_magic = first.strip_prefix(MAGIC).ok_or_else(|| {
        SubtitlerError::parse(1, "WebVTT file must start with \"WEBVTT\"")
    })?;
    if !(after_magic.is_empty() || after_magic.starts_with([' ', '\t'])) {
        return Err(SubtitlerError::parse(
            1,
            format!("unexpected text after WEBVTT: {:?}", after_magic),
        ));
    }

    // Header runs until the first blank line
    let header_len = lines
        .iter()
        .position(|l| l.trim().is_empty())
        .unwrap_or(lines.len());
    document.header = lines[..header_len]
        .iter()
        .map(|l| l.trim_end().to_string())
        .collect();

    if document.header.iter().skip(1).any(|l| l.contains("-->")) {
        return Err(SubtitlerError::parse(
            2,
            "cue timing found in the header; a blank line must follow WEBVTT",
        ));
    }

    for (line, block) in split_blocks(&lines[header_len..], header_len + 1) {
        if is_comment(&block[0]) {
            document.blocks.push(Block::Comment(block));
        } else {
            document.blocks.push(Block::Cue(parse_cue(&block, line)?));
        }
    }

    Ok(document)
}

fn is_comment(first_line: &str) -> bool {
    COMMENT_KEYWORDS.iter().any(|keyword| {
        first_line
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

pub fn render(document: &SubtitleDocument) -> String {
    let mut parts = Vec::with_capacity(document.blocks.len() + 1);

    if document.header.is_empty() {
        parts.push(MAGIC.to_string());
    } else {
        parts.push(document.header.join("\n"));
    }

    for block in &document.blocks {
        match block {
            Block::Comment(lines) => parts.push(lines.join("\n")),
            Block::Cue(cue) => {
                let mut lines = Vec::with_capacity(cue.lines.len() + 2);
                if let Some(id) = &cue.identifier {
                    lines.push(id.clone());
                }
                lines.push(cue.timing_line('.'));
                lines.extend(cue.lines.iter().cloned());
                parts.push(lines.join("\n"));
            }
        }
    }

    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::{Cue, Timestamp};

    const ZOOM_TRANSCRIPT: &str = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000\nПривет\n\n2\n00:00:02.500 --> 00:00:05.120\nИван: Как дела?\nВсё хорошо\n";

    fn parse_str(content: &str) -> Result<SubtitleDocument> {
        SubtitleDocument::parse_str(content, SubtitleFormat::WebVtt)
    }

    #[test]
    fn test_parse_zoom_transcript() {
        let document = parse_str(ZOOM_TRANSCRIPT).unwrap();
        let cues: Vec<&Cue> = document.cues().collect();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].identifier.as_deref(), Some("1"));
        assert_eq!(cues[0].start, Timestamp::from_millis(1_000));
        assert_eq!(cues[0].end, Timestamp::from_millis(2_000));
        assert_eq!(cues[0].text(), "Привет");
        assert_eq!(cues[1].lines, vec!["Иван: Как дела?", "Всё хорошо"]);
    }

    #[test]
    fn test_render_is_byte_identical_for_canonical_input() {
        let document = parse_str(ZOOM_TRANSCRIPT).unwrap();
        assert_eq!(render(&document), ZOOM_TRANSCRIPT);
    }

    #[test]
    fn test_header_settings_and_comments_survive() {
        let input = "WEBVTT - Recording\nKind: captions\n\nNOTE exported\nby tool\n\nSTYLE\n::cue { color: red }\n\n00:01.000 --> 00:02.000 align:start line:10%\nhello\n";
        let document = parse_str(input).unwrap();

        assert_eq!(document.header, vec!["WEBVTT - Recording", "Kind: captions"]);
        assert_eq!(document.blocks.len(), 3);
        assert!(matches!(&document.blocks[0], Block::Comment(lines) if lines[0] == "NOTE exported"));

        let cue = document.cues().next().unwrap();
        assert_eq!(cue.settings, "align:start line:10%");
        assert_eq!(cue.identifier, None);

        let rendered = render(&document);
        assert!(rendered.starts_with("WEBVTT - Recording\nKind: captions\n\nNOTE exported\nby tool\n\n"));
        assert!(rendered.contains("00:00:01.000 --> 00:00:02.000 align:start line:10%\nhello\n"));
    }

    #[test]
    fn test_empty_input_and_header_only() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("WEBVTT\n").unwrap().is_empty());
        assert_eq!(render(&parse_str("").unwrap()), "WEBVTT\n");
    }

    #[test]
    fn test_crlf_and_bom() {
        let input = "\u{feff}WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nhi\r\n";
        let document = parse_str(input).unwrap();
        assert_eq!(document.cue_count(), 1);
        assert_eq!(document.cues().next().unwrap().text(), "hi");
    }

    #[test]
    fn test_cue_with_empty_text_is_kept() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n\n00:00:03.000 --> 00:00:04.000\nafter\n";
        let document = parse_str(input).unwrap();
        let cues: Vec<&Cue> = document.cues().collect();
        assert_eq!(cues.len(), 2);
        assert!(cues[0].is_blank());

        let again = parse_str(&render(&document)).unwrap();
        assert_eq!(again, document);
    }

    #[test]
    fn test_missing_magic_is_error() {
        let err = parse_str("00:00:01.000 --> 00:00:02.000\nhi\n").unwrap_err();
        assert!(matches!(err, SubtitlerError::Parse { line: Some(1), .. }));

        assert!(parse_str("WEBVTTX\n").is_err());
    }

    #[test]
    fn test_malformed_timing_reports_line() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nok\n\n3\n00:00:0x.000 --> 00:00:04.000\nbad\n";
        let err = parse_str(input).unwrap_err();
        assert!(matches!(err, SubtitlerError::Parse { line: Some(7), .. }), "{:?}", err);
    }

    #[test]
    fn test_unterminated_block_without_timing() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nok\n\ndangling identifier\n";
        let err = parse_str(input).unwrap_err();
        assert!(matches!(err, SubtitlerError::Parse { line: Some(6), .. }), "{:?}", err);
    }

    #[test]
    fn test_missing_end_timestamp() {
        let input = "WEBVTT\n\n00:00:01.000 -->\nok\n";
        assert!(parse_str(input).is_err());
    }

    #[test]
    fn test_huge_hour_field_is_parse_error() {
        let input = "WEBVTT\n\n99999999999999:00:00.000 --> 99999999999999:00:01.000\nhi\n";
        let err = parse_str(input).unwrap_err();
        assert!(matches!(err, SubtitlerError::Parse { line: Some(3), .. }), "{:?}", err);
    }
}
