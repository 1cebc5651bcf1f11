//! Still-image placeholder encoded into a short video.
//!
//! The frame is drawn with the 8x8 bitmap font so no system fonts are
//! needed. Encoding is best effort: when the encoder is missing or fails the
//! PNG itself is returned.

use std::path::PathBuf;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

use super::DiagnosticArtifactProducer;
use crate::config::RenderConfig;
use crate::ffmpeg;
use crate::render::execution::ExecutionId;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

const BACKGROUND: Rgb<u8> = Rgb([60, 10, 10]);
const TITLE_COLOR: Rgb<u8> = Rgb([220, 50, 50]);
const MESSAGE_COLOR: Rgb<u8> = Rgb([255, 200, 200]);
const HINT_COLOR: Rgb<u8> = Rgb([200, 200, 200]);

const HINT: &str = "Please check the script and try again";

/// Horizontal margin kept free on each side.
const MARGIN: u32 = 16;
const GLYPH: u32 = 8;

/// Default [`DiagnosticArtifactProducer`].
#[derive(Debug, Clone)]
pub struct PlaceholderProducer {
    config: RenderConfig,
}

impl PlaceholderProducer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn frame_path(&self, request_id: &str) -> PathBuf {
        self.config
            .animations_dir()
            .join(format!("frame_{request_id}.png"))
    }
}

impl DiagnosticArtifactProducer for PlaceholderProducer {
    async fn produce(
        &self,
        execution_id: &ExecutionId,
        message: &str,
        detail: Option<&str>,
    ) -> Option<PathBuf> {
        let request_id = execution_id.request_id();
        let frame_path = self.frame_path(request_id);

        if let Err(e) = tokio::fs::create_dir_all(self.config.animations_dir()).await {
            tracing::error!(error = %e, "Failed to create animations directory");
            return None;
        }

        let frame = render_frame(execution_id, message, detail);
        let save_path = frame_path.clone();
        match tokio::task::spawn_blocking(move || frame.save(&save_path)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(%execution_id, error = %e, "Failed to write placeholder frame");
                return None;
            }
            Err(e) => {
                tracing::error!(%execution_id, error = %e, "Placeholder frame task failed");
                return None;
            }
        }

        let video_path = self.config.artifact_path(request_id);
        match ffmpeg::encode_still(
            &self.config.encoder_program,
            &frame_path,
            &video_path,
            self.config.fallback_video_secs,
            self.config.encoder_timeout,
        )
        .await
        {
            Ok(()) => {
                tracing::info!(%execution_id, path = %video_path.display(), "Placeholder video encoded");
                Some(video_path)
            }
            Err(e) => {
                tracing::warn!(
                    %execution_id,
                    error = %e,
                    "Placeholder encoding failed, returning still frame",
                );
                Some(frame_path)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Draw the three-line diagnostic frame.
pub fn render_frame(execution_id: &ExecutionId, message: &str, detail: Option<&str>) -> RgbImage {
    let mut img = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, BACKGROUND);
    let mid = FRAME_HEIGHT / 2;

    let title = format!("Render error #{execution_id}");
    let body = match detail {
        Some(detail) if !detail.is_empty() => format!("{message}: {detail}"),
        _ => message.to_string(),
    };

    draw_centered(&mut img, &title, mid - 50, 2, TITLE_COLOR);
    draw_centered(&mut img, &body, mid, 1, MESSAGE_COLOR);
    draw_centered(&mut img, HINT, mid + 40, 1, HINT_COLOR);
    img
}

/// Truncate `text` to the characters that fit on one line at `scale`.
fn fit_line(text: &str, scale: u32) -> String {
    let max_chars = ((FRAME_WIDTH - 2 * MARGIN) / (GLYPH * scale)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn draw_centered(img: &mut RgbImage, text: &str, top: u32, scale: u32, color: Rgb<u8>) {
    let line = fit_line(text, scale);
    let width = line.chars().count() as u32 * GLYPH * scale;
    let left = FRAME_WIDTH.saturating_sub(width) / 2;

    for (i, c) in line.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let x0 = left + i as u32 * GLYPH * scale;
        draw_glyph(img, &glyph, x0, top, scale, color);
    }
}

/// Bit 0 of each row byte is the leftmost pixel.
fn draw_glyph(img: &mut RgbImage, glyph: &[u8; 8], x0: u32, y0: u32, scale: u32, color: Rgb<u8>) {
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..8u32 {
            if bits & (1 << col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = x0 + col * scale + dx;
                    let y = y0 + row as u32 * scale + dy;
                    if x < img.width() && y < img.height() {
                        img.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
