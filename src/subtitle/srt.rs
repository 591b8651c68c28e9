use super::{Block, SubtitleDocument, SubtitleFormat, parse_cue, split_blocks};
use crate::error::Result;

/// Parse SRT content (already BOM-stripped and LF-normalized)
pub fn parse(content: &str) -> Result<SubtitleDocument> {
    let mut document = SubtitleDocument::new(SubtitleFormat::Srt);
    let lines: Vec<&str> = content.split('\n').collect();

    for (line, block) in split_blocks(&lines, 1) {
        document.blocks.push(Block::Cue(parse_cue(&block, line)?));
    }

    Ok(document)
}

/// Render SRT; sequence numbers are regenerated from 1
pub fn render(document: &SubtitleDocument) -> String {
    let mut out = String::new();

    for (index, cue) in document.cues().enumerate() {
        out.push_str(&format!("{}\n{}\n", index + 1, cue.timing_line(',')));
        for line in &cue.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubtitlerError;
    use crate::subtitle::Timestamp;

    fn parse_str(content: &str) -> Result<SubtitleDocument> {
        SubtitleDocument::parse_str(content, SubtitleFormat::Srt)
    }

    #[test]
    fn test_parse_srt() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nПривет\n\n2\n00:01:05,123 --> 01:01:01,500\nдве\nстроки\n";
        let document = parse_str(input).unwrap();
        let cues: Vec<_> = document.cues().collect();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].start, Timestamp::from_millis(65_123));
        assert_eq!(cues[1].end, Timestamp::from_hms(1, 1, 1, 500));
        assert_eq!(cues[1].lines, vec!["две", "строки"]);
    }

    #[test]
    fn test_render_renumbers() {
        let input = "7\n00:00:01,000 --> 00:00:02,000\na\n\n9\n00:00:03,000 --> 00:00:04,000\nb\n";
        let rendered = render(&parse_str(input).unwrap());
        assert_eq!(
            rendered,
            "1\n00:00:01,000 --> 00:00:02,000\na\n\n2\n00:00:03,000 --> 00:00:04,000\nb\n\n"
        );
    }

    #[test]
    fn test_empty_srt() {
        let document = parse_str("").unwrap();
        assert!(document.is_empty());
        assert_eq!(render(&document), "");
    }

    #[test]
    fn test_roundtrip_keeps_structure() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:02,000 --> 00:00:03,250\nx\n";
        let document = parse_str(input).unwrap();
        let again = parse_str(&render(&document)).unwrap();

        let timings = |d: &SubtitleDocument| d.cues().map(|c| (c.start, c.end)).collect::<Vec<_>>();
        assert_eq!(timings(&document), timings(&again));
        assert!(again.cues().next().unwrap().is_blank());
    }

    #[test]
    fn test_truncated_cue_is_error() {
        let err = parse_str("1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\n").unwrap_err();
        assert!(matches!(err, SubtitlerError::Parse { line: Some(5), .. }));
    }
}
