//! Render orchestration: run the renderer, find its output, and fall back to
//! a diagnostic artifact when anything goes wrong.

pub mod diagnostics;
pub mod discovery;
pub mod execution;
pub mod orchestrator;

use diagnostics::FailureClass;

use crate::error::CoreError;

/// Why a render did not produce a video.
#[derive(Debug, thiserror::Error)]
pub enum RenderFailure {
    #[error("no scene class found")]
    NoScene,

    #[error("{class}")]
    NonZeroExit {
        class: FailureClass,
        exit_code: i32,
        detail: Option<String>,
    },

    #[error("render timed out")]
    Timeout { elapsed_ms: u64 },

    #[error("renderer unavailable")]
    Unavailable(String),

    #[error("rendered video not found")]
    ArtifactNotFound,

    #[error("media directory unavailable")]
    Setup(#[from] CoreError),

    #[error("scratch file error")]
    Io(#[from] std::io::Error),
}

impl RenderFailure {
    /// Detail line shown under the diagnostic message.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::NonZeroExit { detail, .. } => detail.clone(),
            Self::Timeout { elapsed_ms } => Some(format!("no result after {elapsed_ms}ms")),
            Self::Unavailable(reason) => Some(reason.clone()),
            Self::Setup(e) => Some(e.to_string()),
            Self::Io(e) => Some(e.to_string()),
            Self::NoScene | Self::ArtifactNotFound => None,
        }
    }

    /// `message: detail` as reported to the caller.
    pub fn diagnostic(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{self}: {detail}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_joins_message_and_detail() {
        let failure = RenderFailure::NonZeroExit {
            class: FailureClass::UndefinedName,
            exit_code: 1,
            detail: Some("name 'title' is not defined".into()),
        };
        assert_eq!(
            failure.diagnostic(),
            "undefined name: name 'title' is not defined"
        );
        assert_eq!(RenderFailure::NoScene.diagnostic(), "no scene class found");
    }
}
