//! Classification of renderer stderr.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static NAME_ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NameError: name '([A-Za-z_]\w*)' is not defined").expect("valid regex")
});

/// Maximum stderr excerpt kept on an attempt record.
pub const EXCERPT_BYTES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    MissingDependency,
    SyntaxError,
    UndefinedName,
    TypeMismatch,
    Unclassified,
}

impl FailureClass {
    /// Markers for each class, in detection order.
    const MARKERS: &'static [(FailureClass, &'static [&'static str])] = &[
        (Self::MissingDependency, &["ModuleNotFoundError", "ImportError"]),
        (Self::SyntaxError, &["SyntaxError", "IndentationError"]),
        (Self::UndefinedName, &["NameError"]),
        (Self::TypeMismatch, &["TypeError"]),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MissingDependency => "missing dependency",
            Self::SyntaxError => "syntax error",
            Self::UndefinedName => "undefined name",
            Self::TypeMismatch => "type mismatch",
            Self::Unclassified => "render failed",
        }
    }

    /// Only undefined names can be fixed by another repair pass.
    pub fn is_self_repairable(self) -> bool {
        self == Self::UndefinedName
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified renderer failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StderrDiagnosis {
    pub class: FailureClass,
    pub detail: Option<String>,
}

/// Classify stderr by the first class whose marker appears anywhere in it.
///
/// The detail is the text after the marker on the first line carrying it;
/// unclassified output falls back to its last non-empty line.
pub fn classify(stderr: &str) -> StderrDiagnosis {
    for (class, markers) in FailureClass::MARKERS {
        let hit = stderr.lines().find_map(|line| {
            markers
                .iter()
                .find_map(|marker| line.find(*marker).map(|at| &line[at + marker.len()..]))
        });
        if let Some(rest) = hit {
            let detail = rest.trim_start_matches(':').trim();
            return StderrDiagnosis {
                class: *class,
                detail: (!detail.is_empty()).then(|| detail.to_string()),
            };
        }
    }

    StderrDiagnosis {
        class: FailureClass::Unclassified,
        detail: stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string),
    }
}

/// The name the interpreter reported as undefined, if any.
pub fn undefined_name(stderr: &str) -> Option<&str> {
    NAME_ERROR_RE
        .captures(stderr)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Last `max_bytes` of `text`, cut on a char boundary.
pub fn tail_excerpt(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME_ERROR_TRACE: &str = "\
Traceback (most recent call last):
  File \"media/temp/animation_1_ab12cd34.py\", line 5, in construct
    self.play(Write(title))
NameError: name 'title' is not defined
";

    #[test]
    fn name_error_is_undefined_name() {
        let diagnosis = classify(NAME_ERROR_TRACE);
        assert_eq!(diagnosis.class, FailureClass::UndefinedName);
        assert_eq!(diagnosis.detail.as_deref(), Some("name 'title' is not defined"));
        assert!(diagnosis.class.is_self_repairable());
        assert_eq!(undefined_name(NAME_ERROR_TRACE), Some("title"));
    }

    #[test]
    fn missing_dependency_takes_precedence() {
        let stderr = "TypeError: bad operand\nModuleNotFoundError: No module named 'scipy'\n";
        let diagnosis = classify(stderr);
        assert_eq!(diagnosis.class, FailureClass::MissingDependency);
        assert_eq!(diagnosis.detail.as_deref(), Some("No module named 'scipy'"));
        assert!(!diagnosis.class.is_self_repairable());
    }

    #[test]
    fn indentation_error_is_a_syntax_error() {
        let diagnosis = classify("IndentationError: unexpected indent\n");
        assert_eq!(diagnosis.class, FailureClass::SyntaxError);
        assert_eq!(diagnosis.class.label(), "syntax error");
    }

    #[test]
    fn unknown_output_is_unclassified_with_last_line() {
        let diagnosis = classify("Rendering...\nlatex failed\n\n");
        assert_eq!(diagnosis.class, FailureClass::Unclassified);
        assert_eq!(diagnosis.detail.as_deref(), Some("latex failed"));
        assert_eq!(classify("").detail, None);
    }

    #[test]
    fn tail_excerpt_respects_char_boundaries() {
        let text = "ééééé";
        let tail = tail_excerpt(text, 3);
        assert_eq!(tail, "é");
        assert_eq!(tail_excerpt("short", 100), "short");
    }
}
