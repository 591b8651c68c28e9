use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtitlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Subtitle parse error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse { line: Option<usize>, message: String },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Embedding error: {0}")]
    Embed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SubtitlerError {
    /// Parse failure tied to a 1-based line of the input
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Parse failure that concerns the whole input (unreadable, unknown format)
    pub fn parse_file<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            line: None,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SubtitlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        assert_eq!(
            SubtitlerError::parse(3, "bad timing").to_string(),
            "Subtitle parse error at line 3: bad timing"
        );
        assert_eq!(
            SubtitlerError::parse_file("unreadable").to_string(),
            "Subtitle parse error: unreadable"
        );
    }

    #[test]
    fn test_io_error_converts() {
        fn open_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/subtitler/talk.vtt")?)
        }
        assert!(matches!(open_missing(), Err(SubtitlerError::Io(_))));
    }
}
