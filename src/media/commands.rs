use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubtitlerError};

/// Number of stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Copy every selected stream without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Set subtitle codec
    pub fn subtitle_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:s").arg(codec)
    }

    /// Tag the first subtitle stream of the output with a language
    pub fn subtitle_language<S: AsRef<str>>(self, language: S) -> Self {
        self.arg("-metadata:s:s:0")
            .arg(format!("language={}", language.as_ref()))
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {}", self);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SubtitlerError::Embed(format!(
                    "Media processor '{}' not found; is it installed and on PATH?",
                    self.binary_path
                )),
                _ => SubtitlerError::Embed(format!("Failed to execute media processor: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubtitlerError::Embed(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr_tail(&stderr)
            )));
        }

        Ok(())
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_path)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Builder for common media processing operations
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build the subtitle muxing command: streams are copied, the subtitle
    /// track is converted to `codec` and tagged with `language`
    pub fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        codec: &str,
        language: &str,
        additional_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle embedding")
            .overwrite()
            .input(video_path)
            .input(subtitle_path)
            .copy_streams()
            .subtitle_codec(codec)
            .subtitle_language(language)
            .args(additional_options.iter().cloned())
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}
