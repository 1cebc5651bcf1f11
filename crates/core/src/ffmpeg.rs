//! FFmpeg command utilities.

use std::path::Path;
use std::time::{Duration, Instant};

/// Error type for FFmpeg operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffmpeg timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Encode a still image into an H.264 video of `seconds` length.
///
/// Odd dimensions are rounded down to even ones, as required by `yuv420p`.
pub async fn encode_still(
    program: &str,
    image_path: &Path,
    output_path: &Path,
    seconds: u32,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    let start = Instant::now();
    let run = tokio::process::Command::new(program)
        .args(["-y", "-loop", "1", "-i"])
        .arg(image_path)
        .args([
            "-t",
            &seconds.to_string(),
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-preset",
            "medium",
            "-movflags",
            "+faststart",
        ])
        .arg(output_path)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, run).await {
        Ok(result) => result.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FfmpegError::NotFound(e),
            _ => FfmpegError::IoError(e),
        })?,
        Err(_) => {
            return Err(FfmpegError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    };

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
