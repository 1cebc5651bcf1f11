//! Locate the scene class the renderer should instantiate.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Base classes the renderer can instantiate directly.
pub const SCENE_KINDS: &[&str] = &[
    "Scene",
    "ThreeDScene",
    "MovingCameraScene",
    "ZoomedScene",
    "VectorScene",
];

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*class\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*:").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneDescriptor {
    /// Class name passed to the renderer.
    pub entry_name: String,
    /// Recognized scene kind, or the raw base list when only the loose
    /// pattern matched.
    pub base_kind: String,
}

/// No class definition with a base list was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure;

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no scene class found")
    }
}

impl std::error::Error for ExtractionFailure {}

/// First class (in source order) deriving from a recognized scene kind,
/// otherwise the first class with any base list.
pub fn extract_scene(script: &str) -> Result<SceneDescriptor, ExtractionFailure> {
    let mut loose: Option<SceneDescriptor> = None;

    for caps in CLASS_RE.captures_iter(script) {
        let name = &caps[1];
        let bases = caps[2].trim();
        let recognized = bases.split(',').map(str::trim).find_map(|base| {
            let short = base.rsplit('.').next().unwrap_or(base);
            SCENE_KINDS.iter().find(|kind| **kind == short)
        });
        if let Some(kind) = recognized {
            return Ok(SceneDescriptor {
                entry_name: name.to_string(),
                base_kind: (*kind).to_string(),
            });
        }
        if loose.is_none() {
            loose = Some(SceneDescriptor {
                entry_name: name.to_string(),
                base_kind: bases.to_string(),
            });
        }
    }

    loose.ok_or(ExtractionFailure)
}
