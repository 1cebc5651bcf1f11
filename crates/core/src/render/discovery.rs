//! Locate the video the renderer wrote for a scene.
//!
//! The renderer lays its output out as
//! `<media>/videos/<script stem>/<quality dir>/<Scene>.mp4`. Discovery tries
//! that exact slot, then any quality dir for the same script, then the
//! newest video anywhere in the tree.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tokio::fs;

/// Renderer scratch directory holding partial segments; never a final video.
const PARTIAL_DIR: &str = "partial_movie_files";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryTier {
    /// `<videos>/<stem>/<quality dir>/<entry>.mp4`
    QualityDir,
    /// `<videos>/<stem>/*/<entry>.mp4`
    AnyQualityDir,
    /// Most recently modified `.mp4` under `<videos>`.
    Newest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredVideo {
    pub path: PathBuf,
    pub tier: DiscoveryTier,
}

/// Search `videos_dir` for the output of `script_stem`/`entry_name`.
pub async fn discover(
    videos_dir: &Path,
    script_stem: &str,
    quality_dir: Option<&str>,
    entry_name: &str,
) -> Option<DiscoveredVideo> {
    let file_name = format!("{entry_name}.mp4");
    let script_dir = videos_dir.join(script_stem);

    if let Some(quality) = quality_dir {
        let exact = script_dir.join(quality).join(&file_name);
        if is_file(&exact).await {
            return Some(DiscoveredVideo {
                path: exact,
                tier: DiscoveryTier::QualityDir,
            });
        }
    }

    if let Some(path) = any_quality_dir(&script_dir, &file_name).await {
        return Some(DiscoveredVideo {
            path,
            tier: DiscoveryTier::AnyQualityDir,
        });
    }

    newest_video(videos_dir).await.map(|path| DiscoveredVideo {
        path,
        tier: DiscoveryTier::Newest,
    })
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// First subdirectory of `script_dir` (sorted by name) holding `file_name`.
async fn any_quality_dir(script_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let mut entries = fs::read_dir(script_dir).await.ok()?;
    let mut dirs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    for dir in dirs {
        let candidate = dir.join(file_name);
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Most recently modified `.mp4` below `root`, skipping partial segments.
async fn newest_video(root: &Path) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(mut entries) = fs::read_dir(&dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_dir() {
                if entry.file_name() != PARTIAL_DIR {
                    pending.push(path);
                }
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if best.as_ref().map_or(true, |(t, _)| modified > *t) {
                best = Some((modified, path));
            }
        }
    }
    best.map(|(_, path)| path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
