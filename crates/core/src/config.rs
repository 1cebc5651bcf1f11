//! Render configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

/// Renderer, encoder and media-tree settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Working directory of the renderer. The media tree lives at `<work_dir>/media`.
    pub work_dir: PathBuf,
    /// Renderer executable (default: `manim`).
    pub program: String,
    /// Quality flag passed to the renderer (default: `-ql`).
    pub quality_flag: String,
    /// Wall-clock limit for one renderer invocation.
    pub timeout: Duration,
    /// Rewrite TeX-backed text calls to plain `Text` before rendering.
    pub avoid_latex: bool,
    /// Encoder executable used for placeholder videos (default: `ffmpeg`).
    pub encoder_program: String,
    /// Wall-clock limit for one encoder invocation.
    pub encoder_timeout: Duration,
    /// Length of the placeholder video in seconds.
    pub fallback_video_secs: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            program: "manim".into(),
            quality_flag: "-ql".into(),
            timeout: Duration::from_secs(120),
            avoid_latex: true,
            encoder_program: "ffmpeg".into(),
            encoder_timeout: Duration::from_secs(60),
            fallback_video_secs: 5,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default  |
    /// |------------------------|----------|
    /// | `RENDER_WORK_DIR`      | `.`      |
    /// | `RENDER_PROGRAM`       | `manim`  |
    /// | `RENDER_QUALITY_FLAG`  | `-ql`    |
    /// | `RENDER_TIMEOUT_SECS`  | `120`    |
    /// | `RENDER_AVOID_LATEX`   | `true`   |
    /// | `ENCODER_PROGRAM`      | `ffmpeg` |
    /// | `ENCODER_TIMEOUT_SECS` | `60`     |
    /// | `FALLBACK_VIDEO_SECS`  | `5`      |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();
        Ok(Self {
            work_dir: std::env::var("RENDER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            program: std::env::var("RENDER_PROGRAM").unwrap_or(defaults.program),
            quality_flag: std::env::var("RENDER_QUALITY_FLAG").unwrap_or(defaults.quality_flag),
            timeout: Duration::from_secs(env_parse("RENDER_TIMEOUT_SECS", 120u64)?),
            avoid_latex: env_parse("RENDER_AVOID_LATEX", true)?,
            encoder_program: std::env::var("ENCODER_PROGRAM").unwrap_or(defaults.encoder_program),
            encoder_timeout: Duration::from_secs(env_parse("ENCODER_TIMEOUT_SECS", 60u64)?),
            fallback_video_secs: env_parse("FALLBACK_VIDEO_SECS", 5u32)?,
        })
    }

    /// Default configuration rooted at `work_dir`.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    pub fn media_dir(&self) -> PathBuf {
        self.work_dir.join("media")
    }

    /// Final artifacts (`animation_<id>.mp4`, `frame_<id>.png`).
    pub fn animations_dir(&self) -> PathBuf {
        self.media_dir().join("animations")
    }

    /// Scratch scripts.
    pub fn temp_dir(&self) -> PathBuf {
        self.media_dir().join("temp")
    }

    /// Output tree written by the renderer.
    pub fn videos_dir(&self) -> PathBuf {
        self.media_dir().join("videos")
    }

    /// Canonical artifact slot for a request.
    pub fn artifact_path(&self, request_id: &str) -> PathBuf {
        self.animations_dir()
            .join(format!("animation_{request_id}.mp4"))
    }

    /// Create the media directories the pipeline writes into.
    pub async fn ensure_media_dirs(&self) -> Result<(), CoreError> {
        for dir in [self.animations_dir(), self.temp_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Renderer output subdirectory for the configured quality flag.
    pub fn quality_dir(&self) -> Option<&'static str> {
        quality_dir(&self.quality_flag)
    }
}

/// Map a renderer quality flag to the subdirectory the renderer writes into.
pub fn quality_dir(flag: &str) -> Option<&'static str> {
    match flag {
        "-ql" => Some("480p15"),
        "-qm" => Some("720p30"),
        "-qh" => Some("1080p60"),
        "-qp" => Some("1440p60"),
        "-qk" => Some("2160p60"),
        _ => None,
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, CoreError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
