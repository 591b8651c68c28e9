//! Subtitler - Subtitle Translation and Embedding
//!
//! Reads a WebVTT or SRT subtitle file, translates every cue through an
//! OpenAI-compatible chat-completion API and muxes the translated track into a
//! video file with ffmpeg.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod translate;
pub mod subtitle;
pub mod media;
pub mod error;
