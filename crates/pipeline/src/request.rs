//! Incoming generation request.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request ids end up in file names, so they stay within `[A-Za-z0-9_-]`.
static REQUEST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    /// Caller-supplied id; names the artifact (`animation_<id>.mp4`).
    #[validate(length(min = 1, max = 128), regex(path = *REQUEST_ID_RE))]
    pub request_id: String,
    /// Between 1 and 5000 characters.
    #[validate(length(min = 1, max = 5000))]
    pub prompt: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl GenerationRequest {
    pub fn new(request_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            prompt: prompt.into(),
            title: None,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_bounds_are_enforced() {
        assert!(GenerationRequest::new("1", "Draw a circle").validate().is_ok());
        assert!(GenerationRequest::new("1", "").validate().is_err());
        assert!(GenerationRequest::new("1", "x".repeat(5001)).validate().is_err());
        assert!(GenerationRequest::new("1", "x".repeat(5000)).validate().is_ok());
    }

    #[test]
    fn prompt_length_counts_characters() {
        // 5000 three-byte characters are still within bounds.
        assert!(GenerationRequest::new("1", "圆".repeat(5000)).validate().is_ok());
    }

    #[test]
    fn request_id_must_be_file_name_safe() {
        for id in ["42", "job_7-b", "ABC"] {
            assert!(GenerationRequest::new(id, "Draw").validate().is_ok(), "{id}");
        }
        for id in ["../etc", "a/b", "x y", "id.py", "圆"] {
            let errors = GenerationRequest::new(id, "Draw").validate().unwrap_err();
            assert!(errors.field_errors().contains_key("request_id"), "{id}");
        }
    }

    #[test]
    fn request_id_is_required() {
        let errors = GenerationRequest::new("", "Draw").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("request_id"));
    }
}
